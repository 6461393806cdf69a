use powdersim::core::experiment::ExperimentType;
use powdersim::core::models::background::Background;
use powdersim::core::models::pattern::Pattern;
use powdersim::core::models::phase::Phase;
use powdersim::engine::config::CalculatorConfig;

/// A fully resolved calculation: every file has been read and every override applied.
#[derive(Debug, Clone)]
pub struct SimulationJob {
    pub experiment: ExperimentType,
    pub calculator: CalculatorConfig,
    pub phases: Vec<Phase>,
    pub pattern: Pattern,
    pub background: Background,
    pub grid: Vec<f64>,
}
