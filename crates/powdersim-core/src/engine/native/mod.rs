//! # Native Engine Operation Sets
//!
//! The adapters drive their calculation engines exclusively through the traits in this
//! module, so any engine binding that implements the operation set can be plugged in.
//! One reference implementation of each trait is provided:
//!
//! - [`KinematicEngine`] - a [`RietveldEngine`] computing kinematic powder profiles for
//!   constant-wavelength and time-of-flight instruments
//! - [`ReferenceSimulator`] - a [`PowderSimulator`] that works from CIF files on disk
//! - [`DebyePdf`] - a [`PdfEngine`] computing the reduced pair distribution function G(r)
//!
//! Engines report failures as [`EngineFault`]; the adapters attach the phase label and
//! surface them as [`CalcError::EngineCalcFailed`](crate::engine::error::CalcError).

pub mod kinematic;
pub mod pdf;
pub mod scattering;
pub mod simulator;

pub use kinematic::KinematicEngine;
pub use pdf::DebyePdf;
pub use simulator::ReferenceSimulator;

use crate::core::experiment::{BeamMode, Radiation};
use crate::core::models::atom::AtomSite;
use crate::core::models::pattern::{CwSetup, Pattern, TofSetup};
use crate::core::models::phase::{Cell, Phase};
use crate::core::models::reflection::ReflectionList;
use crate::core::symmetry::{SpaceGroup, SymmetryError};
use nalgebra::Vector3;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineFault {
    #[error("No scattering data for element '{0}'")]
    UnknownScatterer(String),

    #[error("Invalid value {value} for engine parameter '{name}'")]
    InvalidParameter { name: String, value: f64 },

    #[error("Unknown engine variable '{0}'")]
    UnknownVariable(String),

    #[error("Atom index {index} is out of range for a structure with {count} atoms")]
    AtomIndex { index: usize, count: usize },

    #[error("{0} must be loaded before calculating")]
    NotLoaded(&'static str),

    #[error("Engine input could not be read: {0}")]
    Input(String),

    #[error("Engine produced {found} points where {expected} were expected")]
    LengthMismatch { expected: usize, found: usize },

    #[error("Engine produced a non-finite intensity")]
    NonFinite,
}

impl EngineFault {
    pub(crate) fn parameter(name: &str, value: f64) -> Self {
        EngineFault::InvalidParameter {
            name: name.to_string(),
            value,
        }
    }
}

/// Instrument description handed to a [`RietveldEngine`].
#[derive(Debug, Clone, PartialEq)]
pub enum BeamSetup {
    ConstantWavelength(CwSetup),
    TimeOfFlight(TofSetup),
}

impl BeamSetup {
    pub fn from_pattern(beam: BeamMode, pattern: &Pattern) -> Self {
        match beam {
            BeamMode::ConstantWavelength => BeamSetup::ConstantWavelength(pattern.cw),
            BeamMode::TimeOfFlight => BeamSetup::TimeOfFlight(pattern.tof),
        }
    }

    pub fn beam(&self) -> BeamMode {
        match self {
            BeamSetup::ConstantWavelength(_) => BeamMode::ConstantWavelength,
            BeamSetup::TimeOfFlight(_) => BeamMode::TimeOfFlight,
        }
    }
}

/// An atom site with its full symmetry orbit inside the unit cell.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedSite {
    pub label: String,
    pub type_symbol: String,
    pub occupancy: f64,
    pub u_iso: f64,
    pub positions: Vec<Vector3<f64>>,
}

impl ExpandedSite {
    pub fn expand(atom: &AtomSite, space_group: &SpaceGroup) -> Self {
        Self {
            label: atom.label.clone(),
            type_symbol: atom.type_symbol.clone(),
            occupancy: atom.occupancy.value,
            u_iso: atom.u_iso.map(|u| u.value).unwrap_or(0.0),
            positions: space_group.orbit(&atom.position()),
        }
    }

    /// Wyckoff multiplicity of the site.
    pub fn multiplicity(&self) -> usize {
        self.positions.len()
    }
}

/// Engine-side description of one crystalline phase.
#[derive(Debug, Clone)]
pub struct CrystalModel {
    pub label: String,
    pub cell: Cell,
    pub space_group: SpaceGroup,
    pub sites: Vec<ExpandedSite>,
}

impl CrystalModel {
    pub fn from_phase(phase: &Phase) -> Result<Self, SymmetryError> {
        let space_group = SpaceGroup::from_setting(&phase.space_group)?;
        let sites = phase
            .atoms
            .iter()
            .map(|atom| ExpandedSite::expand(atom, &space_group))
            .collect();
        Ok(Self {
            label: phase.label.clone(),
            cell: phase.cell,
            space_group,
            sites,
        })
    }

    /// Number of atoms in the unit cell.
    pub fn atom_count(&self) -> usize {
        self.sites.iter().map(ExpandedSite::multiplicity).sum()
    }
}

/// A single-phase calculation request for a [`RietveldEngine`].
#[derive(Debug, Clone)]
pub struct PowderModel {
    pub beam: BeamSetup,
    pub radiation: Radiation,
    pub crystal: CrystalModel,
}

/// Unscaled profile of one phase together with the reflections that produced it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PhaseProfile {
    pub intensity: Vec<f64>,
    pub reflections: ReflectionList,
}

/// Operation set of a Rietveld-style constant-wavelength / time-of-flight engine.
///
/// Engines are cloned into worker threads, one clone per phase, so they must be `Send`
/// but never need to be `Sync`.
pub trait RietveldEngine: Clone + Send {
    /// Suppresses the engine's own diagnostic output.
    fn silence(&mut self);

    /// Computes the unscaled profile of `model` on the grid `x` (2θ in degrees, or
    /// time-of-flight in µs).
    fn calc_phase(&self, model: &PowderModel, x: &[f64]) -> Result<PhaseProfile, EngineFault>;
}

/// Job description of a simulator run on a uniform 2θ grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JobInfo {
    /// First and last 2θ of the grid, in degrees.
    pub range_2theta: (f64, f64),
    pub theta_step: f64,
    pub points: usize,
    pub wavelength: f64,
    pub u: f64,
    pub v: f64,
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub radiation: Radiation,
}

impl JobInfo {
    /// The uniform 2θ grid described by the job.
    pub fn grid(&self) -> Vec<f64> {
        (0..self.points)
            .map(|i| self.range_2theta.0 + i as f64 * self.theta_step)
            .collect()
    }
}

/// One reflection as reported by a [`PowderSimulator`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimReflection {
    pub hkl: [i32; 3],
    /// sin θ / λ in Å⁻¹.
    pub stl: f64,
    /// Squared structure-factor modulus.
    pub f2: f64,
    pub multiplicity: u32,
}

/// Operation set of a powder-pattern simulator that reads its structures from CIF files.
pub trait PowderSimulator {
    type Crystal;

    fn silence(&mut self);

    fn load_cif(&mut self, path: &Path) -> Result<Self::Crystal, EngineFault>;

    fn reflections(
        &self,
        crystal: &Self::Crystal,
        job: &JobInfo,
    ) -> Result<Vec<SimReflection>, EngineFault>;

    /// Full pattern on the job's uniform grid; the result has `job.points` values.
    fn pattern(
        &self,
        crystal: &Self::Crystal,
        reflections: &[SimReflection],
        job: &JobInfo,
    ) -> Result<Vec<f64>, EngineFault>;
}

/// Operation set of a pair-distribution-function engine.
///
/// An engine instance holds a single structure; callers create a fresh one per phase.
pub trait PdfEngine {
    fn silence(&mut self);

    /// Loads a structure from CIF text.
    fn read_structure(&mut self, cif: &str) -> Result<(), EngineFault>;

    /// Number of atom sites of the loaded structure.
    fn atom_count(&self) -> usize;

    /// Sets a refinable variable such as `pscale`, `qdamp` or `delta2`.
    fn set_var(&mut self, name: &str, value: f64) -> Result<(), EngineFault>;

    /// Sets the diagonal displacement parameters of the atom site at `index`.
    fn set_atom_adp(&mut self, index: usize, u11: f64, u22: f64, u33: f64)
    -> Result<(), EngineFault>;

    /// Registers the r grid (Å) with its noise array.
    fn read_data(&mut self, r: &[f64], noise: &[f64], radiation: Radiation)
    -> Result<(), EngineFault>;

    /// Computes the fit array on the registered grid, already scaled by `pscale`.
    fn calc(&mut self) -> Result<Vec<f64>, EngineFault>;
}
