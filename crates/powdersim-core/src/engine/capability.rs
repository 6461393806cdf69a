use super::error::CalcError;
use crate::core::experiment::{
    BeamMode, Dimensionality, ExperimentType, Polarization, Radiation, SampleForm,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

/// Identifier of a calculation engine family.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EngineId {
    /// Rietveld-style constant-wavelength / time-of-flight engine.
    Rietveld,
    /// Powder-pattern simulator working from CIF files.
    Simulator,
    /// Pair-distribution-function engine.
    Pdf,
}

impl EngineId {
    pub const ALL: [EngineId; 3] = [EngineId::Rietveld, EngineId::Simulator, EngineId::Pdf];

    pub fn name(&self) -> &'static str {
        match self {
            EngineId::Rietveld => "rietveld",
            EngineId::Simulator => "simulator",
            EngineId::Pdf => "pdf",
        }
    }
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown engine '{0}' (expected one of: rietveld, simulator, pdf)")]
pub struct UnknownEngine(pub String);

impl FromStr for EngineId {
    type Err = UnknownEngine;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EngineId::ALL
            .into_iter()
            .find(|id| id.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownEngine(s.to_string()))
    }
}

/// Per-axis values an engine declares it can handle.
struct AxisSupport {
    sample: &'static [SampleForm],
    beam: &'static [BeamMode],
    dimensionality: &'static [Dimensionality],
    radiation: &'static [Radiation],
    polarization: &'static [Polarization],
}

impl AxisSupport {
    fn admits(&self, ty: &ExperimentType) -> bool {
        self.sample.contains(&ty.sample())
            && self.beam.contains(&ty.beam())
            && self.dimensionality.contains(&ty.dimensionality())
            && self.radiation.contains(&ty.radiation())
            && self.polarization.contains(&ty.polarization())
    }
}

const BOTH_RADIATIONS: &[Radiation] = &[Radiation::Neutron, Radiation::XRay];
const BOTH_BEAMS: &[BeamMode] = &[BeamMode::ConstantWavelength, BeamMode::TimeOfFlight];

fn declared(engine: EngineId) -> AxisSupport {
    let beam = match engine {
        EngineId::Rietveld | EngineId::Pdf => BOTH_BEAMS,
        EngineId::Simulator => &[BeamMode::ConstantWavelength],
    };
    AxisSupport {
        sample: &[SampleForm::Powder],
        beam,
        dimensionality: &[Dimensionality::OneD],
        radiation: BOTH_RADIATIONS,
        polarization: &[Polarization::Unpolarized],
    }
}

static MATRIX: LazyLock<HashMap<EngineId, Vec<ExperimentType>>> = LazyLock::new(|| {
    let all = ExperimentType::all();
    EngineId::ALL
        .into_iter()
        .map(|engine| {
            let support = declared(engine);
            let types = all.iter().copied().filter(|t| support.admits(t)).collect();
            (engine, types)
        })
        .collect()
});

pub fn supports(engine: EngineId, ty: &ExperimentType) -> bool {
    MATRIX
        .get(&engine)
        .is_some_and(|types| types.contains(ty))
}

/// Every experiment type the engine supports, in canonical enumeration order.
pub fn supported_types(engine: EngineId) -> &'static [ExperimentType] {
    MATRIX.get(&engine).map(Vec::as_slice).unwrap_or(&[])
}

pub fn capable_engines(ty: &ExperimentType) -> Vec<EngineId> {
    EngineId::ALL
        .into_iter()
        .filter(|&engine| supports(engine, ty))
        .collect()
}

/// The first engine of `preference` that supports `ty`.
pub fn select(preference: &[EngineId], ty: &ExperimentType) -> Result<EngineId, CalcError> {
    preference
        .iter()
        .copied()
        .find(|&engine| supports(engine, ty))
        .ok_or(CalcError::NoCapableEngine(*ty))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(text: &str) -> ExperimentType {
        ExperimentType::parse(text).unwrap()
    }

    #[test]
    fn default_type_is_supported_by_every_engine() {
        let default = ExperimentType::default();
        for engine in EngineId::ALL {
            assert!(supports(engine, &default), "{engine} should support {default}");
        }
    }

    #[test]
    fn matrix_matches_declared_axes() {
        assert_eq!(supported_types(EngineId::Rietveld).len(), 4);
        assert_eq!(supported_types(EngineId::Simulator).len(), 2);
        assert_eq!(supported_types(EngineId::Pdf).len(), 4);

        let tof = ty("tof");
        assert!(supports(EngineId::Rietveld, &tof));
        assert!(!supports(EngineId::Simulator, &tof));
        assert!(supports(EngineId::Pdf, &tof));
        assert!(!supports(EngineId::Rietveld, &ty("sc")));
        assert!(!supports(EngineId::Rietveld, &ty("pol")));
        assert!(!supports(EngineId::Pdf, &ty("2d")));
    }

    #[test]
    fn select_honours_preference_order() {
        let xray = ty("xray");
        assert_eq!(
            select(&[EngineId::Pdf, EngineId::Rietveld], &xray).unwrap(),
            EngineId::Pdf
        );
        assert_eq!(
            select(&[EngineId::Simulator, EngineId::Rietveld], &ty("tof")).unwrap(),
            EngineId::Rietveld
        );
    }

    #[test]
    fn select_without_a_capable_engine_fails() {
        let err = select(&EngineId::ALL, &ty("sc-pol")).unwrap_err();
        assert!(matches!(err, CalcError::NoCapableEngine(_)));
        assert!(capable_engines(&ty("sc")).is_empty());
    }

    #[test]
    fn engine_ids_parse_case_insensitively() {
        assert_eq!("PDF".parse::<EngineId>().unwrap(), EngineId::Pdf);
        assert_eq!(" rietveld ".parse::<EngineId>().unwrap(), EngineId::Rietveld);
        assert!("fullprof".parse::<EngineId>().is_err());
    }
}
