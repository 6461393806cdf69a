//! A small CIF 1.1 reader and writer.
//!
//! The reader builds a [`CifDocument`] of data blocks holding single-valued items and
//! loops. Tag names are normalised on the way in (lower case, `.` replaced by `_`), so
//! `_cell.length_a` and `_cell_length_a` address the same item. The extractors in
//! [`extract`] turn a block into powdersim models.

mod document;
pub mod extract;
mod parser;
pub mod writer;

pub use document::{CifBlock, CifDocument, CifLoop, normalize_tag};
pub use extract::{
    IntensitySource, MeasuredData, background_from_block, measured_from_block,
    pattern_from_block, phase_from_block,
};
pub use writer::{phase_to_cif, write_phase_cif};

use crate::core::models::ModelError;
use crate::core::uncertainty::MeasuredParseError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CifError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to read CIF file '{path}': {source}")]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error("The document contains no data block")]
    NoDataBlock,
    #[error("Missing required item '{0}'")]
    MissingItem(String),
    #[error("Invalid value for '{tag}': {source}")]
    InvalidValue {
        tag: String,
        #[source]
        source: MeasuredParseError,
    },
    #[error("Invalid text '{value}' for '{tag}'")]
    InvalidText { tag: String, value: String },
    #[error("Columns '{first}' and '{second}' have different lengths")]
    LengthMismatch { first: String, second: String },
    #[error("Invalid model: {0}")]
    Model(#[from] ModelError),
}
