//! Kinematic powder diffraction: reflection enumeration, structure factors and peak
//! shapes shared by the reference engines.

use super::scattering;
use super::{BeamSetup, CrystalModel, EngineFault, PhaseProfile, PowderModel, RietveldEngine};
use crate::core::experiment::Radiation;
use crate::core::models::pattern::{Asymmetry, CwSetup, PeakShape, TofSetup};
use crate::core::models::phase::inverse_d_squared;
use crate::core::models::reflection::{Reflection, ReflectionList};
use std::collections::HashSet;
use std::f64::consts::{LN_2, PI};
use tracing::debug;

/// Smallest d-spacing the reflection generator enumerates, in Å.
pub const MIN_D_SPACING: f64 = 0.25;

/// Reflections this far (degrees 2θ) outside the grid still contribute their tails.
const CW_MARGIN_DEG: f64 = 5.0;
/// Relative time-of-flight margin around the grid.
const TOF_MARGIN: f64 = 0.05;
/// Peaks are evaluated within this many widths of their centre.
const PEAK_WINDOW: f64 = 12.0;
const MIN_WIDTH: f64 = 1e-6;

/// One symmetry-unique reflection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniqueReflection {
    /// Representative indices (the largest member of the equivalence class).
    pub hkl: [i32; 3],
    pub d: f64,
    pub multiplicity: u32,
}

/// Enumerates the symmetry-unique, systematically allowed reflections with
/// `d_min <= d <= d_max`, ordered by decreasing d.
pub fn unique_reflections(
    crystal: &CrystalModel,
    d_min: f64,
    d_max: f64,
) -> Result<Vec<UniqueReflection>, EngineFault> {
    let gstar = crystal
        .cell
        .reciprocal_metric()
        .map_err(|e| EngineFault::Input(e.to_string()))?;
    let d_min = d_min.max(MIN_D_SPACING);
    if d_max <= d_min {
        return Ok(Vec::new());
    }

    // |h| <= a / d_min holds for any cell.
    let bound = |length: f64| (length / d_min).floor() as i32;
    let cell = &crystal.cell;
    let (h_max, k_max, l_max) = (bound(cell.a.value), bound(cell.b.value), bound(cell.c.value));
    let group = &crystal.space_group;

    let mut visited = HashSet::new();
    let mut found = Vec::new();
    for h in -h_max..=h_max {
        for k in -k_max..=k_max {
            for l in -l_max..=l_max {
                let hkl = [h, k, l];
                if hkl == [0, 0, 0] || visited.contains(&hkl) {
                    continue;
                }
                let inverse = inverse_d_squared(&gstar, hkl);
                if inverse <= 0.0 {
                    continue;
                }
                let d = inverse.sqrt().recip();
                if d < d_min || d > d_max {
                    continue;
                }
                let equivalents = group.equivalent_reflections(hkl);
                visited.extend(equivalents.iter().copied());
                if group.is_extinct(hkl) {
                    continue;
                }
                found.push(UniqueReflection {
                    hkl: equivalents.last().copied().unwrap_or(hkl),
                    d,
                    multiplicity: equivalents.len() as u32,
                });
            }
        }
    }
    found.sort_by(|a, b| b.d.total_cmp(&a.d).then_with(|| b.hkl.cmp(&a.hkl)));
    Ok(found)
}

/// `|F(hkl)|²` with isotropic Debye–Waller factors; `stl` is sin θ / λ.
pub fn structure_factor_squared(
    crystal: &CrystalModel,
    hkl: [i32; 3],
    stl: f64,
    radiation: Radiation,
) -> Result<f64, EngineFault> {
    let [h, k, l] = hkl.map(f64::from);
    let (mut re, mut im) = (0.0, 0.0);
    for site in &crystal.sites {
        let f = scattering::amplitude(&site.type_symbol, stl, radiation)?;
        let debye_waller = (-8.0 * PI * PI * site.u_iso * stl * stl).exp();
        let weight = f * site.occupancy * debye_waller;
        for p in &site.positions {
            let arg = 2.0 * PI * (h * p.x + k * p.y + l * p.z);
            re += weight * arg.cos();
            im += weight * arg.sin();
        }
    }
    Ok(re * re + im * im)
}

/// Lorentz factor of a powder reflection at Bragg angle `theta` (radians), with the
/// unpolarized-beam polarization factor for x-rays.
pub fn lorentz_polarization(theta: f64, radiation: Radiation) -> f64 {
    let lorentz = 1.0 / (theta.sin().powi(2) * theta.cos());
    match radiation {
        Radiation::Neutron => lorentz,
        Radiation::XRay => lorentz * 0.5 * (1.0 + (2.0 * theta).cos().powi(2)),
    }
}

/// Unit-area Gaussian.
pub fn gaussian(delta: f64, sigma: f64) -> f64 {
    (-0.5 * (delta / sigma).powi(2)).exp() / (sigma * (2.0 * PI).sqrt())
}

/// Unit-area pseudo-Voigt of full width `fwhm` and Lorentzian fraction `eta`.
pub fn pseudo_voigt(delta: f64, fwhm: f64, eta: f64) -> f64 {
    let x2 = (delta / fwhm).powi(2);
    let gauss = 2.0 / fwhm * (LN_2 / PI).sqrt() * (-4.0 * LN_2 * x2).exp();
    let lorentz = 2.0 / (PI * fwhm) / (1.0 + 4.0 * x2);
    eta * lorentz + (1.0 - eta) * gauss
}

/// Thompson–Cox–Hastings combination of Gaussian and Lorentzian widths into a
/// pseudo-Voigt `(fwhm, eta)`.
pub fn tch(hg: f64, hl: f64) -> (f64, f64) {
    let fwhm = (hg.powi(5)
        + 2.69269 * hg.powi(4) * hl
        + 2.42843 * hg.powi(3) * hl.powi(2)
        + 4.47163 * hg.powi(2) * hl.powi(3)
        + 0.07842 * hg * hl.powi(4)
        + hl.powi(5))
    .powf(0.2);
    if fwhm <= 0.0 {
        return (0.0, 0.0);
    }
    let q = hl / fwhm;
    let eta = (1.36603 * q - 0.47719 * q * q + 0.11116 * q.powi(3)).clamp(0.0, 1.0);
    (fwhm, eta)
}

/// Gaussian convolved with back-to-back exponentials (rise `alpha`, decay `beta`),
/// normalised to unit area.
pub fn back_to_back(delta: f64, sigma2: f64, alpha: f64, beta: f64) -> f64 {
    let norm = alpha * beta / (2.0 * (alpha + beta));
    let root = (2.0 * sigma2).sqrt();
    let gauss = (-delta * delta / (2.0 * sigma2)).exp();
    let u = 0.5 * alpha * (alpha * sigma2 + 2.0 * delta);
    let v = 0.5 * beta * (beta * sigma2 - 2.0 * delta);
    let y = (alpha * sigma2 + delta) / root;
    let z = (beta * sigma2 - delta) / root;
    norm * (exp_erfc(u, y, gauss) + exp_erfc(v, z, gauss))
}

// exp(a)·erfc(x) where exp(a - x²) == gauss.
fn exp_erfc(a: f64, x: f64, gauss: f64) -> f64 {
    if x < 0.0 {
        a.exp() * erfc(x)
    } else {
        gauss * erfcx(x)
    }
}

/// Scaled complementary error function `exp(x²)·erfc(x)` for `x >= 0`
/// (Numerical Recipes rational approximation, relative error below 1.2e-7).
fn erfcx(x: f64) -> f64 {
    let t = 1.0 / (1.0 + 0.5 * x);
    let poly = -1.26551223
        + t * (1.00002368
            + t * (0.37409196
                + t * (0.09678418
                    + t * (-0.18628806
                        + t * (0.27886807
                            + t * (-1.13520398
                                + t * (1.48851587 + t * (-0.82215223 + t * 0.17087277))))))));
    t * poly.exp()
}

pub fn erfc(x: f64) -> f64 {
    if x >= 0.0 {
        erfcx(x) * (-x * x).exp()
    } else {
        2.0 - erfcx(-x) * (-x * x).exp()
    }
}

fn deposit(
    x: &[f64],
    intensity: &mut [f64],
    center: f64,
    half_width: f64,
    shape: impl Fn(f64) -> f64,
) {
    let lo = x.partition_point(|&v| v < center - half_width);
    let hi = x.partition_point(|&v| v <= center + half_width);
    for (xi, yi) in x[lo..hi].iter().zip(&mut intensity[lo..hi]) {
        *yi += shape(xi - center);
    }
}

/// Caglioti Gaussian and Lorentzian widths at Bragg angle `theta`, combined.
fn cw_peak_width(setup: &CwSetup, theta: f64) -> Result<(f64, f64), EngineFault> {
    let res = &setup.resolution;
    let tan = theta.tan();
    let hg2 = res.u.value * tan * tan + res.v.value * tan + res.w.value;
    let hg = hg2.max(0.0).sqrt();
    let hl = (res.x.value * tan + res.y.value / theta.cos()).max(0.0);
    let (fwhm, eta) = tch(hg, hl);
    if fwhm < MIN_WIDTH || !fwhm.is_finite() {
        return Err(EngineFault::parameter("fwhm", fwhm));
    }
    Ok((fwhm, eta))
}

/// Bérar–Baldinozzi asymmetry correction.
fn asymmetry(asym: &Asymmetry, delta: f64, fwhm: f64, theta: f64) -> f64 {
    let z = delta / fwhm;
    let fa = 2.0 * z * (-z * z).exp();
    let fb = 2.0 * (2.0 * z * z - 3.0) * fa;
    1.0 + (asym.p1.value * fa + asym.p2.value * fb) / theta.tan()
        + (asym.p3.value * fa + asym.p4.value * fb) / (2.0 * theta).tan()
}

fn has_asymmetry(asym: &Asymmetry) -> bool {
    [asym.p1, asym.p2, asym.p3, asym.p4]
        .iter()
        .any(|p| p.value != 0.0)
}

/// Solves `t = zero + dtt1·d + dtt2·d²` for a positive d.
pub fn d_for_time(setup: &TofSetup, t: f64) -> Option<f64> {
    let (zero, dtt1, dtt2) = (setup.zero.value, setup.dtt1.value, setup.dtt2.value);
    let dt = t - zero;
    let d = if dtt2.abs() < 1e-12 {
        dt / dtt1
    } else {
        let discriminant = dtt1 * dtt1 + 4.0 * dtt2 * dt;
        if discriminant < 0.0 {
            return None;
        }
        (-dtt1 + discriminant.sqrt()) / (2.0 * dtt2)
    };
    (d > 0.0 && d.is_finite()).then_some(d)
}

/// Reference [`RietveldEngine`]: kinematic intensities with Thompson–Cox–Hastings
/// pseudo-Voigt peaks for constant wavelength and Gaussian ⊗ back-to-back exponential
/// (or pseudo-Voigt) peaks for time of flight.
#[derive(Debug, Clone, Default)]
pub struct KinematicEngine {
    quiet: bool,
}

impl KinematicEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn calc_cw(
        &self,
        setup: &CwSetup,
        radiation: Radiation,
        crystal: &CrystalModel,
        x: &[f64],
    ) -> Result<PhaseProfile, EngineFault> {
        let lambda = setup.wavelength.value;
        if !(lambda > 0.0) {
            return Err(EngineFault::parameter("wavelength", lambda));
        }
        let mut profile = PhaseProfile {
            intensity: vec![0.0; x.len()],
            reflections: ReflectionList::default(),
        };

        let tth_max = (x[x.len() - 1] + CW_MARGIN_DEG).min(179.0);
        if tth_max <= 0.0 {
            return Ok(profile);
        }
        let tth_min = x[0] - CW_MARGIN_DEG;
        let d_of = |tth: f64| lambda / (2.0 * (tth.to_radians() / 2.0).sin());
        let d_max = if tth_min > 0.0 { d_of(tth_min) } else { f64::INFINITY };
        let skip_asymmetry = !has_asymmetry(&setup.asymmetry);

        for r in unique_reflections(crystal, d_of(tth_max), d_max)? {
            let sin_theta = lambda / (2.0 * r.d);
            if sin_theta >= 1.0 {
                continue;
            }
            let theta = sin_theta.asin();
            let two_theta = 2.0 * theta.to_degrees();
            profile.reflections.push(Reflection {
                hkl: r.hkl,
                coord: two_theta,
                multiplicity: r.multiplicity,
            });

            let f2 = structure_factor_squared(crystal, r.hkl, 0.5 / r.d, radiation)?;
            let height = f64::from(r.multiplicity) * f2 * lorentz_polarization(theta, radiation);
            let (fwhm, eta) = cw_peak_width(setup, theta)?;
            deposit(
                x,
                &mut profile.intensity,
                two_theta,
                PEAK_WINDOW * fwhm,
                |delta| {
                    let correction = if skip_asymmetry {
                        1.0
                    } else {
                        asymmetry(&setup.asymmetry, delta, fwhm, theta)
                    };
                    height * pseudo_voigt(delta, fwhm, eta) * correction
                },
            );
        }
        Ok(profile)
    }

    fn calc_tof(
        &self,
        setup: &TofSetup,
        radiation: Radiation,
        crystal: &CrystalModel,
        x: &[f64],
    ) -> Result<PhaseProfile, EngineFault> {
        let dtt1 = setup.dtt1.value;
        if !(dtt1 > 0.0) {
            return Err(EngineFault::parameter("dtt1", dtt1));
        }
        let mut profile = PhaseProfile {
            intensity: vec![0.0; x.len()],
            reflections: ReflectionList::default(),
        };

        let Some(d_max) = d_for_time(setup, x[x.len() - 1] * (1.0 + TOF_MARGIN)) else {
            return Ok(profile);
        };
        let d_min = d_for_time(setup, x[0] * (1.0 - TOF_MARGIN)).unwrap_or(MIN_D_SPACING);
        let sin_bank = (setup.ttheta_bank.value.to_radians() / 2.0).sin();

        for r in unique_reflections(crystal, d_min, d_max)? {
            let d = r.d;
            let t = setup.time_of_flight(d);
            profile.reflections.push(Reflection {
                hkl: r.hkl,
                coord: t,
                multiplicity: r.multiplicity,
            });

            let f2 = structure_factor_squared(crystal, r.hkl, 0.5 / d, radiation)?;
            let height = f64::from(r.multiplicity) * f2 * d.powi(4) * sin_bank;
            let sigma2 =
                setup.sigma0.value + setup.sigma1.value * d * d + setup.sigma2.value * d.powi(4);
            let gamma =
                (setup.gamma0.value + setup.gamma1.value * d + setup.gamma2.value * d * d).max(0.0);
            let alpha = setup.alpha0.value + setup.alpha1.value / d;
            let beta = setup.beta0.value + setup.beta1.value / d.powi(4);

            match setup.peak_shape {
                PeakShape::Gauss => {
                    if !(sigma2 > 0.0) {
                        return Err(EngineFault::parameter("sigma^2", sigma2));
                    }
                    let sigma = sigma2.sqrt();
                    if alpha > 0.0 && beta > 0.0 {
                        let half_width = PEAK_WINDOW * sigma + PEAK_WINDOW / alpha.min(beta);
                        deposit(x, &mut profile.intensity, t, half_width, |delta| {
                            height * back_to_back(delta, sigma2, alpha, beta)
                        });
                    } else {
                        deposit(x, &mut profile.intensity, t, PEAK_WINDOW * sigma, |delta| {
                            height * gaussian(delta, sigma)
                        });
                    }
                }
                PeakShape::PseudoVoigt => {
                    let hg = (8.0 * LN_2 * sigma2.max(0.0)).sqrt();
                    let (fwhm, eta) = tch(hg, gamma);
                    if fwhm < MIN_WIDTH || !fwhm.is_finite() {
                        return Err(EngineFault::parameter("fwhm", fwhm));
                    }
                    deposit(x, &mut profile.intensity, t, PEAK_WINDOW * fwhm, |delta| {
                        height * pseudo_voigt(delta, fwhm, eta)
                    });
                }
            }
        }
        Ok(profile)
    }
}

impl RietveldEngine for KinematicEngine {
    fn silence(&mut self) {
        self.quiet = true;
    }

    fn calc_phase(&self, model: &PowderModel, x: &[f64]) -> Result<PhaseProfile, EngineFault> {
        let crystal = &model.crystal;
        if x.is_empty() || crystal.sites.is_empty() {
            return Ok(PhaseProfile {
                intensity: vec![0.0; x.len()],
                reflections: ReflectionList::default(),
            });
        }

        let mut profile = match &model.beam {
            BeamSetup::ConstantWavelength(setup) => {
                self.calc_cw(setup, model.radiation, crystal, x)?
            }
            BeamSetup::TimeOfFlight(setup) => self.calc_tof(setup, model.radiation, crystal, x)?,
        };
        if profile.intensity.iter().any(|v| !v.is_finite()) {
            return Err(EngineFault::NonFinite);
        }
        profile.reflections.sort_by_coord();

        if !self.quiet {
            debug!(
                phase = %crystal.label,
                reflections = profile.reflections.len(),
                "Computed kinematic phase profile."
            );
        }
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::AtomSite;
    use crate::core::models::pattern::Pattern;
    use crate::core::models::phase::{Cell, Phase, SpaceGroupSetting};
    use crate::core::experiment::BeamMode;

    fn copper() -> CrystalModel {
        let phase = Phase::new("Cu", Cell::cubic(3.615), SpaceGroupSetting::new("F m -3 m"))
            .with_atom(AtomSite::new("Cu1", "Cu", [0.0, 0.0, 0.0]).with_u_iso(0.005));
        CrystalModel::from_phase(&phase).unwrap()
    }

    fn grid(start: f64, stop: f64, step: f64) -> Vec<f64> {
        let n = ((stop - start) / step).round() as usize + 1;
        (0..n).map(|i| start + i as f64 * step).collect()
    }

    fn model(beam: BeamMode, crystal: CrystalModel) -> PowderModel {
        PowderModel {
            beam: BeamSetup::from_pattern(beam, &Pattern::default()),
            radiation: Radiation::Neutron,
            crystal,
        }
    }

    fn argmax(values: &[f64]) -> usize {
        values
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap()
    }

    #[test]
    fn fcc_reflections_obey_centering_absences() {
        let reflections = unique_reflections(&copper(), 1.0, f64::INFINITY).unwrap();
        let hkls: Vec<[i32; 3]> = reflections.iter().map(|r| r.hkl).collect();
        assert_eq!(hkls[0], [1, 1, 1]);
        assert_eq!(reflections[0].multiplicity, 8);
        assert_eq!(hkls[1], [2, 0, 0]);
        assert_eq!(reflections[1].multiplicity, 6);
        assert!(!hkls.contains(&[1, 0, 0]));
        assert!(!hkls.contains(&[1, 1, 0]));
        assert!(hkls.contains(&[2, 2, 0]));
    }

    #[test]
    fn fcc_structure_factor_is_four_atoms_in_phase() {
        let crystal = copper();
        let f2 = structure_factor_squared(&crystal, [1, 1, 1], 0.0, Radiation::Neutron).unwrap();
        let expected = (4.0f64 * 7.718).powi(2);
        assert!((f2 - expected).abs() < 1e-6 * expected);
        let forbidden =
            structure_factor_squared(&crystal, [1, 0, 0], 0.0, Radiation::Neutron).unwrap();
        assert!(forbidden < 1e-9);
    }

    #[test]
    fn cw_peak_appears_at_the_bragg_angle() {
        let x = grid(40.0, 46.0, 0.01);
        let profile = KinematicEngine::new()
            .calc_phase(&model(BeamMode::ConstantWavelength, copper()), &x)
            .unwrap();
        assert_eq!(profile.intensity.len(), x.len());

        let d111: f64 = 3.615 / 3.0f64.sqrt();
        let expected = 2.0 * (1.54056 / (2.0 * d111)).asin().to_degrees();
        let peak = x[argmax(&profile.intensity)];
        assert!((peak - expected).abs() < 0.02, "peak at {peak}, expected {expected}");

        let first = profile.reflections.get(0).unwrap();
        assert_eq!(first.hkl, [1, 1, 1]);
        assert!((first.coord - expected).abs() < 1e-9);
    }

    #[test]
    fn tof_peak_appears_at_the_converted_time() {
        let x = grid(15000.0, 25000.0, 5.0);
        let profile = KinematicEngine::new()
            .calc_phase(&model(BeamMode::TimeOfFlight, copper()), &x)
            .unwrap();
        let d111 = 3.615 / 3.0f64.sqrt();
        let peak = x[argmax(&profile.intensity)];
        assert!((peak - 10000.0 * d111).abs() < 10.0);
        assert!(
            profile
                .reflections
                .iter()
                .any(|r| r.hkl == [1, 1, 1] && (r.coord - 10000.0 * d111).abs() < 1e-6)
        );
    }

    #[test]
    fn phase_without_atoms_yields_zeros_and_no_reflections() {
        let empty = CrystalModel::from_phase(&Phase::new(
            "empty",
            Cell::cubic(4.0),
            SpaceGroupSetting::new("P m -3 m"),
        ))
        .unwrap();
        let x = vec![10.0, 20.0, 30.0];
        let profile = KinematicEngine::new()
            .calc_phase(&model(BeamMode::ConstantWavelength, empty), &x)
            .unwrap();
        assert_eq!(profile.intensity, vec![0.0; 3]);
        assert!(profile.reflections.is_empty());
    }

    #[test]
    fn invalid_wavelength_is_a_fault() {
        let mut m = model(BeamMode::ConstantWavelength, copper());
        if let BeamSetup::ConstantWavelength(setup) = &mut m.beam {
            setup.wavelength.value = 0.0;
        }
        let err = KinematicEngine::new().calc_phase(&m, &[10.0, 20.0]).unwrap_err();
        assert!(matches!(err, EngineFault::InvalidParameter { .. }));
    }

    #[test]
    fn peak_shapes_have_unit_area() {
        let step = 0.001;
        let area = |f: &dyn Fn(f64) -> f64, lo: f64, hi: f64| {
            grid(lo, hi, step).iter().map(|&d| f(d) * step).sum::<f64>()
        };
        let pv = area(&|d| pseudo_voigt(d, 0.2, 0.3), -20.0, 20.0);
        assert!((pv - 1.0).abs() < 0.01, "pseudo-Voigt area {pv}");
        let b2b = area(&|d| back_to_back(d, 4.0, 0.5, 0.1), -100.0, 250.0);
        assert!((b2b - 1.0).abs() < 1e-3, "back-to-back area {b2b}");
    }

    #[test]
    fn erfc_matches_reference_values() {
        assert!((erfc(0.0) - 1.0).abs() < 1e-6);
        assert!((erfc(1.0) - 0.157_299_2).abs() < 1e-6);
        assert!((erfc(-1.0) - 1.842_700_8).abs() < 1e-6);
        assert!(erfc(6.0) < 1e-15);
    }

    #[test]
    fn tch_reduces_to_pure_gaussian_without_lorentzian_width() {
        let (fwhm, eta) = tch(0.1, 0.0);
        assert!((fwhm - 0.1).abs() < 1e-12);
        assert_eq!(eta, 0.0);
    }
}
