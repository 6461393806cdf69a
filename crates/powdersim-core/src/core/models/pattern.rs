use super::ModelError;
use crate::core::experiment::BeamMode;
use crate::core::uncertainty::Measured;
use serde::{Deserialize, Serialize};

/// Divisor applied to a pattern-level scale before it multiplies the summed phases.
pub const GLOBAL_SCALE_DIVISOR: f64 = 500.0;

/// Instrumental and sample conditions of a calculation.
///
/// Only the block matching the experiment's beam is consulted by the Rietveld engine;
/// the PDF block is read by the pair-distribution engine regardless of beam.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct Pattern {
    /// Optional pattern-level scale. When present, the summed phase contribution is
    /// multiplied by `scale / 500`.
    pub scale: Option<Measured>,
    pub cw: CwSetup,
    pub tof: TofSetup,
    pub pdf: PdfSetup,
}

impl Pattern {
    pub fn global_scale(&self) -> f64 {
        self.scale
            .map(|s| s.value / GLOBAL_SCALE_DIVISOR)
            .unwrap_or(1.0)
    }

    pub fn with_wavelength(mut self, wavelength: f64) -> Self {
        self.cw.wavelength = Measured::new(wavelength);
        self
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        let wavelength = self.cw.wavelength.value;
        if !(wavelength > 0.0) || !wavelength.is_finite() {
            return Err(ModelError::InvalidParameter {
                name: "wavelength",
                value: wavelength,
            });
        }
        if let Some(scale) = self.scale {
            if !scale.value.is_finite() {
                return Err(ModelError::InvalidParameter {
                    name: "scale",
                    value: scale.value,
                });
            }
        }
        let qmax = self.pdf.qmax.value;
        if !(qmax > 0.0) {
            return Err(ModelError::InvalidParameter {
                name: "qmax",
                value: qmax,
            });
        }
        Ok(())
    }

    /// Sets one profile parameter of the block that matches `beam`.
    ///
    /// Constant-wavelength keys are `u`, `v`, `w`, `x`, `y` and `p1`..`p4`;
    /// time-of-flight keys are `sigma0`..`sigma2`, `gamma0`..`gamma2`, `alpha0`,
    /// `alpha1`, `beta0` and `beta1`.
    pub fn set_profile_parameter(
        &mut self,
        beam: BeamMode,
        key: &str,
        value: Measured,
    ) -> Result<(), ModelError> {
        let slot = match beam {
            BeamMode::ConstantWavelength => self.cw.parameter_mut(key),
            BeamMode::TimeOfFlight => self.tof.parameter_mut(key),
        };
        match slot {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(ModelError::UnknownParameter(key.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct CwSetup {
    /// Wavelength in Å.
    pub wavelength: Measured,
    /// Zero shift in degrees 2θ, added to the grid before evaluation.
    pub zero_shift: Measured,
    pub resolution: CwResolution,
    pub asymmetry: Asymmetry,
}

impl Default for CwSetup {
    fn default() -> Self {
        Self {
            wavelength: Measured::new(1.54056),
            zero_shift: Measured::new(0.0),
            resolution: CwResolution::default(),
            asymmetry: Asymmetry::default(),
        }
    }
}

impl CwSetup {
    fn parameter_mut(&mut self, key: &str) -> Option<&mut Measured> {
        let slot = match key.to_ascii_lowercase().as_str() {
            "u" => &mut self.resolution.u,
            "v" => &mut self.resolution.v,
            "w" => &mut self.resolution.w,
            "x" => &mut self.resolution.x,
            "y" => &mut self.resolution.y,
            "p1" => &mut self.asymmetry.p1,
            "p2" => &mut self.asymmetry.p2,
            "p3" => &mut self.asymmetry.p3,
            "p4" => &mut self.asymmetry.p4,
            _ => return None,
        };
        Some(slot)
    }
}

/// Caglioti Gaussian widths `(u, v, w)` and Lorentzian widths `(x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CwResolution {
    pub u: Measured,
    pub v: Measured,
    pub w: Measured,
    pub x: Measured,
    pub y: Measured,
}

impl Default for CwResolution {
    fn default() -> Self {
        Self {
            u: Measured::new(0.0),
            v: Measured::new(0.0),
            w: Measured::new(0.01),
            x: Measured::new(0.0),
            y: Measured::new(0.0),
        }
    }
}

/// Bérar–Baldinozzi peak asymmetry coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Asymmetry {
    pub p1: Measured,
    pub p2: Measured,
    pub p3: Measured,
    pub p4: Measured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PeakShape {
    /// Gaussian convolved with back-to-back exponentials.
    #[default]
    Gauss,
    PseudoVoigt,
}

/// Time-of-flight diffractometer constants and peak-profile parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct TofSetup {
    /// Zero offset in µs.
    pub zero: Measured,
    /// Linear d → TOF constant in µs/Å.
    pub dtt1: Measured,
    /// Quadratic d → TOF constant in µs/Å².
    pub dtt2: Measured,
    /// Detector bank angle 2θ in degrees.
    pub ttheta_bank: Measured,
    pub peak_shape: PeakShape,
    pub sigma0: Measured,
    pub sigma1: Measured,
    pub sigma2: Measured,
    pub gamma0: Measured,
    pub gamma1: Measured,
    pub gamma2: Measured,
    pub alpha0: Measured,
    pub alpha1: Measured,
    pub beta0: Measured,
    pub beta1: Measured,
}

impl Default for TofSetup {
    fn default() -> Self {
        Self {
            zero: Measured::new(0.0),
            dtt1: Measured::new(10000.0),
            dtt2: Measured::new(0.0),
            ttheta_bank: Measured::new(150.0),
            peak_shape: PeakShape::Gauss,
            sigma0: Measured::new(0.0),
            sigma1: Measured::new(100.0),
            sigma2: Measured::new(0.0),
            gamma0: Measured::new(0.0),
            gamma1: Measured::new(0.0),
            gamma2: Measured::new(0.0),
            alpha0: Measured::new(0.0),
            alpha1: Measured::new(0.0),
            beta0: Measured::new(0.0),
            beta1: Measured::new(0.0),
        }
    }
}

impl TofSetup {
    /// Time of flight of a reflection with spacing `d`.
    pub fn time_of_flight(&self, d: f64) -> f64 {
        self.zero.value + self.dtt1.value * d + self.dtt2.value * d * d
    }

    fn parameter_mut(&mut self, key: &str) -> Option<&mut Measured> {
        let slot = match key.to_ascii_lowercase().as_str() {
            "sigma0" => &mut self.sigma0,
            "sigma1" => &mut self.sigma1,
            "sigma2" => &mut self.sigma2,
            "gamma0" => &mut self.gamma0,
            "gamma1" => &mut self.gamma1,
            "gamma2" => &mut self.gamma2,
            "alpha0" => &mut self.alpha0,
            "alpha1" => &mut self.alpha1,
            "beta0" => &mut self.beta0,
            "beta1" => &mut self.beta1,
            _ => return None,
        };
        Some(slot)
    }
}

/// Pair-distribution-function parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PdfSetup {
    /// Maximum momentum transfer in Å⁻¹ used to compute G(r).
    pub qmax: Measured,
    /// Instrumental Gaussian damping of G(r).
    pub qdamp: Measured,
    /// Instrumental peak broadening growing with r.
    pub qbroad: Measured,
    /// Correlated-motion coefficient (1/r term).
    pub delta1: Measured,
    /// Correlated-motion coefficient (1/r² term).
    pub delta2: Measured,
    /// Diameter of spherical particles in Å; zero disables the envelope.
    pub spdiameter: Measured,
}

impl Default for PdfSetup {
    fn default() -> Self {
        Self {
            qmax: Measured::new(30.0),
            qdamp: Measured::new(0.01),
            qbroad: Measured::new(0.0),
            delta1: Measured::new(0.0),
            delta2: Measured::new(0.0),
            spdiameter: Measured::new(0.0),
        }
    }
}
