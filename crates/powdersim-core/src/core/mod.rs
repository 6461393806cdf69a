//! # Core Module
//!
//! The stateless foundation of powdersim: everything an engine adapter consumes but
//! never owns.
//!
//! - **Measured values** ([`uncertainty`]) - `(value, error)` pairs and the CIF `V(E)` notation
//! - **Experiment classification** ([`experiment`]) - the five-axis experiment type
//! - **Structural and instrumental models** ([`models`]) - phases, atom sites, patterns,
//!   backgrounds and reflection lists
//! - **Symmetry** ([`symmetry`]) - symmetry operators and space-group expansion
//! - **File I/O** ([`io`]) - CIF reading/writing and CSV result tables

pub mod experiment;
pub mod io;
pub mod models;
pub mod symmetry;
pub mod uncertainty;
