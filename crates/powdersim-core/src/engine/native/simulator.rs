use super::kinematic::{
    lorentz_polarization, pseudo_voigt, structure_factor_squared, tch, unique_reflections,
};
use super::{CrystalModel, EngineFault, JobInfo, PowderSimulator, SimReflection};
use crate::core::io::cif::{CifDocument, phase_from_block};
use std::path::Path;
use tracing::debug;

const MARGIN_DEG: f64 = 5.0;
const PEAK_WINDOW: f64 = 12.0;

/// Reference [`PowderSimulator`] built on the kinematic routines. Peaks are Caglioti
/// Gaussians, mixed with a Lorentzian component when the job carries `x`/`y` widths.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSimulator {
    quiet: bool,
}

impl ReferenceSimulator {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_job(job: &JobInfo) -> Result<(), EngineFault> {
    if !(job.wavelength > 0.0) {
        return Err(EngineFault::parameter("wavelength", job.wavelength));
    }
    if !(job.theta_step > 0.0) {
        return Err(EngineFault::parameter("theta_step", job.theta_step));
    }
    Ok(())
}

impl PowderSimulator for ReferenceSimulator {
    type Crystal = CrystalModel;

    fn silence(&mut self) {
        self.quiet = true;
    }

    fn load_cif(&mut self, path: &Path) -> Result<CrystalModel, EngineFault> {
        let input = |e: &dyn std::fmt::Display| EngineFault::Input(e.to_string());
        let document = CifDocument::read_from_path(path).map_err(|e| input(&e))?;
        let block = document.first_block().map_err(|e| input(&e))?;
        let phase = phase_from_block(block).map_err(|e| input(&e))?;
        let crystal = CrystalModel::from_phase(&phase).map_err(|e| input(&e))?;
        if !self.quiet {
            debug!(path = %path.display(), atoms = crystal.atom_count(), "Loaded structure.");
        }
        Ok(crystal)
    }

    fn reflections(
        &self,
        crystal: &CrystalModel,
        job: &JobInfo,
    ) -> Result<Vec<SimReflection>, EngineFault> {
        check_job(job)?;
        let lambda = job.wavelength;
        let d_of = |tth: f64| lambda / (2.0 * (tth.to_radians() / 2.0).sin());
        let tth_max = (job.range_2theta.1 + MARGIN_DEG).min(179.0);
        if tth_max <= 0.0 {
            return Ok(Vec::new());
        }
        let tth_min = job.range_2theta.0 - MARGIN_DEG;
        let d_max = if tth_min > 0.0 { d_of(tth_min) } else { f64::INFINITY };

        unique_reflections(crystal, d_of(tth_max), d_max)?
            .into_iter()
            .map(|r| {
                let stl = 0.5 / r.d;
                Ok(SimReflection {
                    hkl: r.hkl,
                    stl,
                    f2: structure_factor_squared(crystal, r.hkl, stl, job.radiation)?,
                    multiplicity: r.multiplicity,
                })
            })
            .collect()
    }

    fn pattern(
        &self,
        _crystal: &CrystalModel,
        reflections: &[SimReflection],
        job: &JobInfo,
    ) -> Result<Vec<f64>, EngineFault> {
        check_job(job)?;
        let grid = job.grid();
        let mut intensity = vec![0.0; grid.len()];

        for reflection in reflections {
            let sin_theta = reflection.stl * job.wavelength;
            if sin_theta >= 1.0 {
                continue;
            }
            let theta = sin_theta.asin();
            let two_theta = 2.0 * theta.to_degrees();
            let tan = theta.tan();
            let hg = (job.u * tan * tan + job.v * tan + job.w).max(0.0).sqrt();
            let hl = (job.x * tan + job.y / theta.cos()).max(0.0);
            let (fwhm, eta) = tch(hg, hl);
            if !(fwhm > 0.0) || !fwhm.is_finite() {
                return Err(EngineFault::parameter("fwhm", fwhm));
            }
            let height = f64::from(reflection.multiplicity)
                * reflection.f2
                * lorentz_polarization(theta, job.radiation);

            let lo = grid.partition_point(|&t| t < two_theta - PEAK_WINDOW * fwhm);
            let hi = grid.partition_point(|&t| t <= two_theta + PEAK_WINDOW * fwhm);
            for (t, y) in grid[lo..hi].iter().zip(&mut intensity[lo..hi]) {
                *y += height * pseudo_voigt(t - two_theta, fwhm, eta);
            }
        }
        Ok(intensity)
    }
}
