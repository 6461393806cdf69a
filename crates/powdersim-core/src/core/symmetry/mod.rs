//! # Symmetry Module
//!
//! Crystallographic symmetry needed to turn an asymmetric unit into a full unit cell
//! and to enumerate the allowed reflections of a phase.
//!
//! - [`operations`] - Seitz operators `{R|t}` parsed from `x,y,z` triplets
//! - [`hall`] - Hall symbols, the compact generator notation the group table is written in
//! - [`tables`] - The 230 space groups and their origin or axis choices, keyed by Hermann–Mauguin symbol
//! - [`space_group`] - Group expansion, site orbits, systematic absences and reflection multiplicities

pub mod hall;
pub mod operations;
pub mod space_group;
pub mod tables;

pub use operations::SymOp;
pub use space_group::SpaceGroup;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SymmetryError {
    #[error("Unknown space group '{0}'")]
    UnknownSpaceGroup(String),
    #[error("Space group '{symbol}' has no setting with coordinate-system code '{code}'")]
    UnknownSetting { symbol: String, code: String },
    #[error("Invalid symmetry operator '{operator}': {reason}")]
    InvalidOperator { operator: String, reason: String },
    #[error("Invalid Hall symbol '{symbol}': {reason}")]
    InvalidHallSymbol { symbol: String, reason: String },
}
