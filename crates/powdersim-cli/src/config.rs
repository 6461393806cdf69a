mod builder;
mod file;
mod models;

pub use builder::build_job;
pub use models::SimulationJob;
