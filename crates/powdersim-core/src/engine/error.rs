use super::native::EngineFault;
use crate::core::experiment::{ExperimentType, ExperimentTypeError};
use crate::core::io::cif::CifError;
use crate::core::models::ModelError;
use crate::core::symmetry::SymmetryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalcError {
    #[error("Invalid experiment type: {0}")]
    InvalidType(#[from] ExperimentTypeError),

    #[error("No engine in the preference list supports the experiment type '{0}'")]
    NoCapableEngine(ExperimentType),

    #[error("Phase '{0}' is already registered")]
    DuplicatePhase(String),

    #[error("Phase '{0}' is not registered")]
    UnknownPhase(String),

    #[error("Phase '{phase}' already contains an atom labelled '{atom}'")]
    DuplicateAtom { phase: String, atom: String },

    #[error("Phase '{phase}' has no atom labelled '{atom}'")]
    UnknownAtom { phase: String, atom: String },

    #[error("Invalid calculation grid: {0}")]
    InvalidGrid(String),

    #[error("Engine calculation failed for phase '{phase}': {cause}")]
    EngineCalcFailed {
        phase: String,
        #[source]
        cause: EngineFault,
    },

    #[error("No phases are registered")]
    NoPhases,

    #[error("Failed to parse structure data: {0}")]
    Parse(#[from] CifError),

    #[error("Symmetry error: {0}")]
    Symmetry(#[from] SymmetryError),

    #[error("Invalid model: {0}")]
    InvalidModel(#[from] ModelError),

    #[error("Calculation was cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal logic error: {0}")]
    Internal(String),
}

impl CalcError {
    pub(crate) fn engine(phase: &str, cause: EngineFault) -> Self {
        CalcError::EngineCalcFailed {
            phase: phase.to_string(),
            cause,
        }
    }
}
