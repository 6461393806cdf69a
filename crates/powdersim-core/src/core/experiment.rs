use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ExperimentTypeError {
    #[error("Unknown experiment type token '{0}'")]
    UnknownToken(String),
    #[error("Contradictory values for the {axis} axis: '{first}' and '{second}'")]
    Contradictory {
        axis: Axis,
        first: &'static str,
        second: &'static str,
    },
    #[error("No value selected for the {0} axis")]
    EmptyAxis(Axis),
}

/// One of the five orthogonal classification axes of an experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Sample,
    Beam,
    Polarization,
    Dimensionality,
    Radiation,
}

impl Axis {
    /// Axes in canonical serialization order.
    pub const ALL: [Axis; 5] = [
        Axis::Sample,
        Axis::Beam,
        Axis::Polarization,
        Axis::Dimensionality,
        Axis::Radiation,
    ];
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::Sample => "sample",
            Axis::Beam => "beam",
            Axis::Polarization => "polarization",
            Axis::Dimensionality => "dimensionality",
            Axis::Radiation => "radiation",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SampleForm {
    #[default]
    Powder,
    SingleCrystal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BeamMode {
    #[default]
    ConstantWavelength,
    TimeOfFlight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dimensionality {
    #[default]
    OneD,
    TwoD,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Radiation {
    #[default]
    Neutron,
    XRay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Polarization {
    #[default]
    Unpolarized,
    Polarized,
    /// Longitudinal polarization analysis.
    Lpa,
    /// Spherical neutron polarimetry.
    Snp,
}

impl SampleForm {
    pub const ALL: [SampleForm; 2] = [SampleForm::Powder, SampleForm::SingleCrystal];
}

impl BeamMode {
    pub const ALL: [BeamMode; 2] = [BeamMode::ConstantWavelength, BeamMode::TimeOfFlight];
}

impl Dimensionality {
    pub const ALL: [Dimensionality; 2] = [Dimensionality::OneD, Dimensionality::TwoD];
}

impl Radiation {
    pub const ALL: [Radiation; 2] = [Radiation::Neutron, Radiation::XRay];
}

impl Polarization {
    pub const ALL: [Polarization; 4] = [
        Polarization::Unpolarized,
        Polarization::Polarized,
        Polarization::Lpa,
        Polarization::Snp,
    ];
}

/// A single value on one axis, e.g. `AxisValue::Beam(BeamMode::TimeOfFlight)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisValue {
    Sample(SampleForm),
    Beam(BeamMode),
    Polarization(Polarization),
    Dimensionality(Dimensionality),
    Radiation(Radiation),
}

impl AxisValue {
    pub fn axis(&self) -> Axis {
        match self {
            AxisValue::Sample(_) => Axis::Sample,
            AxisValue::Beam(_) => Axis::Beam,
            AxisValue::Polarization(_) => Axis::Polarization,
            AxisValue::Dimensionality(_) => Axis::Dimensionality,
            AxisValue::Radiation(_) => Axis::Radiation,
        }
    }

    /// The canonical token used in the hyphen-separated string form.
    pub fn token(&self) -> &'static str {
        match self {
            AxisValue::Sample(SampleForm::Powder) => "pd",
            AxisValue::Sample(SampleForm::SingleCrystal) => "sc",
            AxisValue::Beam(BeamMode::ConstantWavelength) => "cwl",
            AxisValue::Beam(BeamMode::TimeOfFlight) => "tof",
            AxisValue::Polarization(Polarization::Unpolarized) => "unp",
            AxisValue::Polarization(Polarization::Polarized) => "pol",
            AxisValue::Polarization(Polarization::Lpa) => "lpa",
            AxisValue::Polarization(Polarization::Snp) => "snp",
            AxisValue::Dimensionality(Dimensionality::OneD) => "1d",
            AxisValue::Dimensionality(Dimensionality::TwoD) => "2d",
            AxisValue::Radiation(Radiation::Neutron) => "neut",
            AxisValue::Radiation(Radiation::XRay) => "xray",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        let value = match token.trim().to_ascii_lowercase().as_str() {
            "pd" | "powder" => AxisValue::Sample(SampleForm::Powder),
            "sc" | "single_crystal" => AxisValue::Sample(SampleForm::SingleCrystal),
            "cwl" | "cw" => AxisValue::Beam(BeamMode::ConstantWavelength),
            "tof" => AxisValue::Beam(BeamMode::TimeOfFlight),
            "unp" | "unpolarized" => AxisValue::Polarization(Polarization::Unpolarized),
            "pol" | "polarized" => AxisValue::Polarization(Polarization::Polarized),
            "lpa" => AxisValue::Polarization(Polarization::Lpa),
            "snp" => AxisValue::Polarization(Polarization::Snp),
            "1d" => AxisValue::Dimensionality(Dimensionality::OneD),
            "2d" => AxisValue::Dimensionality(Dimensionality::TwoD),
            "neut" | "neutron" => AxisValue::Radiation(Radiation::Neutron),
            "xray" | "xrays" => AxisValue::Radiation(Radiation::XRay),
            _ => return None,
        };
        Some(value)
    }
}

impl From<SampleForm> for AxisValue {
    fn from(v: SampleForm) -> Self {
        AxisValue::Sample(v)
    }
}
impl From<BeamMode> for AxisValue {
    fn from(v: BeamMode) -> Self {
        AxisValue::Beam(v)
    }
}
impl From<Polarization> for AxisValue {
    fn from(v: Polarization) -> Self {
        AxisValue::Polarization(v)
    }
}
impl From<Dimensionality> for AxisValue {
    fn from(v: Dimensionality) -> Self {
        AxisValue::Dimensionality(v)
    }
}
impl From<Radiation> for AxisValue {
    fn from(v: Radiation) -> Self {
        AxisValue::Radiation(v)
    }
}

/// The raw twelve-flag form of an experiment type, as held by loosely typed callers.
///
/// Converting it with [`ExperimentType::from_flags`] enforces that exactly one flag is
/// set on every axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExperimentFlags {
    pub is_pd: bool,
    pub is_sc: bool,
    pub is_cwl: bool,
    pub is_tof: bool,
    pub is_1d: bool,
    pub is_2d: bool,
    pub is_neut: bool,
    pub is_xray: bool,
    pub is_unp: bool,
    pub is_pol: bool,
    pub is_lpa: bool,
    pub is_snp: bool,
}

/// Classification of an experiment across five orthogonal axes.
///
/// Each axis holds exactly one value, so contradictory combinations (both beams, both
/// dimensionalities, ...) are unrepresentable once a value of this type exists. The
/// canonical string form is `sample-beam-pol-dim-radiation`, e.g. `pd-cwl-unp-1d-neut`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExperimentType {
    sample: SampleForm,
    beam: BeamMode,
    polarization: Polarization,
    dimensionality: Dimensionality,
    radiation: Radiation,
}

impl ExperimentType {
    pub fn new(
        sample: SampleForm,
        beam: BeamMode,
        polarization: Polarization,
        dimensionality: Dimensionality,
        radiation: Radiation,
    ) -> Self {
        Self {
            sample,
            beam,
            polarization,
            dimensionality,
            radiation,
        }
    }

    /// Parses a hyphen-separated token string in any order. Axes that are not
    /// mentioned keep their default value.
    pub fn parse(text: &str) -> Result<Self, ExperimentTypeError> {
        let mut selected: [Option<AxisValue>; 5] = [None; 5];

        for token in text.split('-') {
            let value = AxisValue::from_token(token)
                .ok_or_else(|| ExperimentTypeError::UnknownToken(token.trim().to_string()))?;
            let slot = &mut selected[axis_index(value.axis())];
            match slot {
                Some(existing) if *existing != value => {
                    return Err(ExperimentTypeError::Contradictory {
                        axis: value.axis(),
                        first: existing.token(),
                        second: value.token(),
                    });
                }
                _ => *slot = Some(value),
            }
        }

        let mut result = Self::default();
        for value in selected.into_iter().flatten() {
            result.assign(value);
        }
        Ok(result)
    }

    /// Builds an experiment type from twelve independent flags, rejecting axes with no
    /// flag or with more than one flag set.
    pub fn from_flags(flags: ExperimentFlags) -> Result<Self, ExperimentTypeError> {
        let sample = pick(
            Axis::Sample,
            &[
                (flags.is_pd, SampleForm::Powder),
                (flags.is_sc, SampleForm::SingleCrystal),
            ],
        )?;
        let beam = pick(
            Axis::Beam,
            &[
                (flags.is_cwl, BeamMode::ConstantWavelength),
                (flags.is_tof, BeamMode::TimeOfFlight),
            ],
        )?;
        let dimensionality = pick(
            Axis::Dimensionality,
            &[
                (flags.is_1d, Dimensionality::OneD),
                (flags.is_2d, Dimensionality::TwoD),
            ],
        )?;
        let radiation = pick(
            Axis::Radiation,
            &[
                (flags.is_neut, Radiation::Neutron),
                (flags.is_xray, Radiation::XRay),
            ],
        )?;
        let polarization = pick(
            Axis::Polarization,
            &[
                (flags.is_unp, Polarization::Unpolarized),
                (flags.is_pol, Polarization::Polarized),
                (flags.is_lpa, Polarization::Lpa),
                (flags.is_snp, Polarization::Snp),
            ],
        )?;
        Ok(Self::new(
            sample,
            beam,
            polarization,
            dimensionality,
            radiation,
        ))
    }

    pub fn flags(&self) -> ExperimentFlags {
        ExperimentFlags {
            is_pd: self.sample == SampleForm::Powder,
            is_sc: self.sample == SampleForm::SingleCrystal,
            is_cwl: self.beam == BeamMode::ConstantWavelength,
            is_tof: self.beam == BeamMode::TimeOfFlight,
            is_1d: self.dimensionality == Dimensionality::OneD,
            is_2d: self.dimensionality == Dimensionality::TwoD,
            is_neut: self.radiation == Radiation::Neutron,
            is_xray: self.radiation == Radiation::XRay,
            is_unp: self.polarization == Polarization::Unpolarized,
            is_pol: self.polarization == Polarization::Polarized,
            is_lpa: self.polarization == Polarization::Lpa,
            is_snp: self.polarization == Polarization::Snp,
        }
    }

    /// Every experiment type, i.e. the Cartesian product of the five axes.
    pub fn all() -> Vec<ExperimentType> {
        let mut types = Vec::with_capacity(64);
        for sample in SampleForm::ALL {
            for beam in BeamMode::ALL {
                for polarization in Polarization::ALL {
                    for dimensionality in Dimensionality::ALL {
                        for radiation in Radiation::ALL {
                            types.push(Self::new(
                                sample,
                                beam,
                                polarization,
                                dimensionality,
                                radiation,
                            ));
                        }
                    }
                }
            }
        }
        types
    }

    pub fn value(&self, axis: Axis) -> AxisValue {
        match axis {
            Axis::Sample => AxisValue::Sample(self.sample),
            Axis::Beam => AxisValue::Beam(self.beam),
            Axis::Polarization => AxisValue::Polarization(self.polarization),
            Axis::Dimensionality => AxisValue::Dimensionality(self.dimensionality),
            Axis::Radiation => AxisValue::Radiation(self.radiation),
        }
    }

    /// Returns `true` if this experiment type holds `value` on its axis.
    pub fn supports(&self, value: impl Into<AxisValue>) -> bool {
        let value = value.into();
        self.value(value.axis()) == value
    }

    pub fn sample(&self) -> SampleForm {
        self.sample
    }
    pub fn beam(&self) -> BeamMode {
        self.beam
    }
    pub fn polarization(&self) -> Polarization {
        self.polarization
    }
    pub fn dimensionality(&self) -> Dimensionality {
        self.dimensionality
    }
    pub fn radiation(&self) -> Radiation {
        self.radiation
    }

    pub fn is_tof(&self) -> bool {
        self.beam == BeamMode::TimeOfFlight
    }

    /// Turns a single flag on or off. Turning a flag on selects it on its axis;
    /// turning the active flag off selects its pair (or, on the four-state
    /// polarization axis, falls back to unpolarized). Turning off an inactive flag
    /// is a no-op. The other four axes are never touched.
    pub fn set_flag(&mut self, value: impl Into<AxisValue>, on: bool) {
        let value = value.into();
        if on {
            self.assign(value);
            return;
        }
        if !self.supports(value) {
            return;
        }
        let replacement = match value {
            AxisValue::Sample(SampleForm::Powder) => AxisValue::Sample(SampleForm::SingleCrystal),
            AxisValue::Sample(SampleForm::SingleCrystal) => AxisValue::Sample(SampleForm::Powder),
            AxisValue::Beam(BeamMode::ConstantWavelength) => {
                AxisValue::Beam(BeamMode::TimeOfFlight)
            }
            AxisValue::Beam(BeamMode::TimeOfFlight) => {
                AxisValue::Beam(BeamMode::ConstantWavelength)
            }
            AxisValue::Dimensionality(Dimensionality::OneD) => {
                AxisValue::Dimensionality(Dimensionality::TwoD)
            }
            AxisValue::Dimensionality(Dimensionality::TwoD) => {
                AxisValue::Dimensionality(Dimensionality::OneD)
            }
            AxisValue::Radiation(Radiation::Neutron) => AxisValue::Radiation(Radiation::XRay),
            AxisValue::Radiation(Radiation::XRay) => AxisValue::Radiation(Radiation::Neutron),
            AxisValue::Polarization(Polarization::Unpolarized) => {
                AxisValue::Polarization(Polarization::Polarized)
            }
            AxisValue::Polarization(_) => AxisValue::Polarization(Polarization::Unpolarized),
        };
        self.assign(replacement);
    }

    pub fn set_powder(&mut self, on: bool) {
        self.set_flag(SampleForm::Powder, on);
    }
    pub fn set_single_crystal(&mut self, on: bool) {
        self.set_flag(SampleForm::SingleCrystal, on);
    }
    pub fn set_cwl(&mut self, on: bool) {
        self.set_flag(BeamMode::ConstantWavelength, on);
    }
    pub fn set_tof(&mut self, on: bool) {
        self.set_flag(BeamMode::TimeOfFlight, on);
    }
    pub fn set_1d(&mut self, on: bool) {
        self.set_flag(Dimensionality::OneD, on);
    }
    pub fn set_2d(&mut self, on: bool) {
        self.set_flag(Dimensionality::TwoD, on);
    }
    pub fn set_neutron(&mut self, on: bool) {
        self.set_flag(Radiation::Neutron, on);
    }
    pub fn set_xray(&mut self, on: bool) {
        self.set_flag(Radiation::XRay, on);
    }
    pub fn set_polarization(&mut self, polarization: Polarization) {
        self.polarization = polarization;
    }

    fn assign(&mut self, value: AxisValue) {
        match value {
            AxisValue::Sample(v) => self.sample = v,
            AxisValue::Beam(v) => self.beam = v,
            AxisValue::Polarization(v) => self.polarization = v,
            AxisValue::Dimensionality(v) => self.dimensionality = v,
            AxisValue::Radiation(v) => self.radiation = v,
        }
    }
}

fn axis_index(axis: Axis) -> usize {
    match axis {
        Axis::Sample => 0,
        Axis::Beam => 1,
        Axis::Polarization => 2,
        Axis::Dimensionality => 3,
        Axis::Radiation => 4,
    }
}

fn pick<T: Copy + Into<AxisValue>>(
    axis: Axis,
    candidates: &[(bool, T)],
) -> Result<T, ExperimentTypeError> {
    let mut chosen: Option<T> = None;
    for &(set, value) in candidates {
        if !set {
            continue;
        }
        if let Some(first) = chosen {
            return Err(ExperimentTypeError::Contradictory {
                axis,
                first: first.into().token(),
                second: value.into().token(),
            });
        }
        chosen = Some(value);
    }
    chosen.ok_or(ExperimentTypeError::EmptyAxis(axis))
}

impl fmt::Display for ExperimentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens: Vec<&str> = Axis::ALL.iter().map(|&a| self.value(a).token()).collect();
        f.write_str(&tokens.join("-"))
    }
}

impl FromStr for ExperimentType {
    type Err = ExperimentTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ExperimentType {
    type Error = ExperimentTypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ExperimentType> for String {
    fn from(value: ExperimentType) -> Self {
        value.to_string()
    }
}
