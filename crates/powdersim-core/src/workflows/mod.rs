//! # Workflows Module
//!
//! The public entry point of powdersim.
//!
//! ## Overview
//!
//! The [`dispatcher::Dispatcher`] is the calculation job: it holds the experiment type,
//! picks the engine for it from the configured preference order, forwards every model
//! operation to that engine's adapter and, when the experiment type changes, rebuilds
//! the whole model on the newly selected engine. Callers never need to know which
//! engine is doing the work.
//!
//! ```no_run
//! use powdersim::core::models::atom::AtomSite;
//! use powdersim::core::models::phase::{Cell, Phase, SpaceGroupSetting};
//! use powdersim::engine::config::CalculatorConfig;
//! use powdersim::workflows::dispatcher::Dispatcher;
//!
//! # fn main() -> Result<(), powdersim::engine::error::CalcError> {
//! let mut job = Dispatcher::new(CalculatorConfig::default())?;
//! job.set_experiment_type_str("pd-cwl-unp-1d-xray")?;
//! job.add_phase(
//!     &Phase::new("Cu", Cell::cubic(3.615), SpaceGroupSetting::new("F m -3 m"))
//!         .with_atom(AtomSite::new("Cu1", "Cu", [0.0, 0.0, 0.0])),
//! )?;
//! let x: Vec<f64> = (0..1000).map(|i| 20.0 + i as f64 * 0.1).collect();
//! let result = job.calculate(&x)?;
//! println!("{} points, {} phases", result.len(), result.phases.len());
//! # Ok(())
//! # }
//! ```

pub mod dispatcher;
