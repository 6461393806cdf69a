//! # Core Models Module
//!
//! Plain data structures describing what is being calculated, independent of which
//! engine ends up doing the work.
//!
//! ## Key Components
//!
//! - [`atom`] - Atom sites in fractional coordinates with occupancy and isotropic displacement
//! - [`phase`] - Crystalline phases: unit cell, space-group setting, atom sites and scale
//! - [`pattern`] - Instrumental parameters for constant-wavelength, time-of-flight and PDF setups
//! - [`background`] - Piecewise-linear background anchors
//! - [`reflection`] - Column-oriented reflection lists produced by the engines
//! - [`result`] - The normalized outcome of a calculation
//!
//! Every model is owned by the caller. Adapters take shared references and keep their
//! own copies, so nothing in this module is ever mutated behind the caller's back.

pub mod atom;
pub mod background;
pub mod pattern;
pub mod phase;
pub mod reflection;
pub mod result;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("Label must not be empty")]
    EmptyLabel,
    #[error("Atom '{label}': occupancy {value} is outside [0, 1]")]
    InvalidOccupancy { label: String, value: f64 },
    #[error("Atom '{label}': isotropic displacement {value} must be non-negative")]
    NegativeDisplacement { label: String, value: f64 },
    #[error("Atom '{label}': fractional coordinates must be finite")]
    NonFiniteCoordinate { label: String },
    #[error("Atom '{label}': element symbol '{symbol}' is not recognised")]
    InvalidElement { label: String, symbol: String },
    #[error("Phase '{phase}' contains the atom label '{atom}' more than once")]
    DuplicateAtomLabel { phase: String, atom: String },
    #[error("Invalid unit cell: {0}")]
    InvalidCell(String),
    #[error("Invalid scale {value} for '{label}'")]
    InvalidScale { label: String, value: f64 },
    #[error("Background anchor at x = {0} is not finite")]
    InvalidBackgroundPoint(f64),
    #[error("Invalid instrument parameter '{name}' = {value}")]
    InvalidParameter { name: &'static str, value: f64 },
    #[error("Unknown profile parameter '{0}'")]
    UnknownParameter(String),
}
