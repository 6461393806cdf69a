use super::kinematic::gaussian;
use super::scattering;
use super::{CrystalModel, EngineFault, PdfEngine};
use crate::core::experiment::Radiation;
use crate::core::io::cif::{CifDocument, phase_from_block};
use nalgebra::Vector3;
use std::f64::consts::PI;
use tracing::debug;

/// Displacement assumed for atoms that carry no displacement data.
pub const DEFAULT_U_ISO: f64 = 0.005;

/// Pair distances this far beyond the last grid point still contribute their tails.
const R_MARGIN: f64 = 3.0;
const PEAK_WINDOW: f64 = 6.0;
const MIN_SIGMA: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Variables {
    pscale: f64,
    qmax: f64,
    qdamp: f64,
    qbroad: f64,
    delta1: f64,
    delta2: f64,
    spdiameter: f64,
}

impl Default for Variables {
    fn default() -> Self {
        Self {
            pscale: 1.0,
            qmax: 30.0,
            qdamp: 0.0,
            qbroad: 0.0,
            delta1: 0.0,
            delta2: 0.0,
            spdiameter: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Data {
    r: Vec<f64>,
    radiation: Radiation,
}

/// Reference [`PdfEngine`] computing the reduced pair distribution function
///
/// `G(r) = 1/(N r) Σᵢⱼ (bᵢ bⱼ / ⟨b⟩²) T(r - rᵢⱼ) - 4π r ρ₀`
///
/// from Gaussian pair peaks. Peak widths follow the correlated-motion model
/// `σᵢⱼ² = (Uᵢ + Uⱼ)(1 - δ₁/r - δ₂/r² + Q_broad² r²)`; finite-Q termination is
/// approximated by a width floor of `1/Q_max`. The result is damped by
/// `exp(-(Q_damp r)²/2)` and, when a particle diameter is set, by the spherical
/// particle envelope.
#[derive(Debug, Clone, Default)]
pub struct DebyePdf {
    quiet: bool,
    structure: Option<CrystalModel>,
    variables: Variables,
    data: Option<Data>,
}

impl DebyePdf {
    pub fn new() -> Self {
        Self::default()
    }

    fn structure(&self) -> Result<&CrystalModel, EngineFault> {
        self.structure
            .as_ref()
            .ok_or(EngineFault::NotLoaded("structure"))
    }
}

fn spherical_envelope(r: f64, diameter: f64) -> f64 {
    if diameter <= 0.0 {
        return 1.0;
    }
    if r >= diameter {
        return 0.0;
    }
    let x = r / diameter;
    1.0 - 1.5 * x + 0.5 * x.powi(3)
}

impl PdfEngine for DebyePdf {
    fn silence(&mut self) {
        self.quiet = true;
    }

    fn read_structure(&mut self, cif: &str) -> Result<(), EngineFault> {
        let input = |e: &dyn std::fmt::Display| EngineFault::Input(e.to_string());
        let document = CifDocument::parse(cif).map_err(|e| input(&e))?;
        let phase = phase_from_block(document.first_block().map_err(|e| input(&e))?)
            .map_err(|e| input(&e))?;
        let mut crystal = CrystalModel::from_phase(&phase).map_err(|e| input(&e))?;
        for (site, atom) in crystal.sites.iter_mut().zip(&phase.atoms) {
            if atom.u_iso.is_none() {
                site.u_iso = DEFAULT_U_ISO;
            }
        }
        self.structure = Some(crystal);
        Ok(())
    }

    fn atom_count(&self) -> usize {
        self.structure.as_ref().map_or(0, |s| s.sites.len())
    }

    fn set_var(&mut self, name: &str, value: f64) -> Result<(), EngineFault> {
        if !value.is_finite() {
            return Err(EngineFault::parameter(name, value));
        }
        let vars = &mut self.variables;
        let slot = match name {
            "pscale" => &mut vars.pscale,
            "qmax" => &mut vars.qmax,
            "qdamp" => &mut vars.qdamp,
            "qbroad" => &mut vars.qbroad,
            "delta1" => &mut vars.delta1,
            "delta2" => &mut vars.delta2,
            "spdiameter" => &mut vars.spdiameter,
            _ => return Err(EngineFault::UnknownVariable(name.to_string())),
        };
        if name == "qmax" && value <= 0.0 {
            return Err(EngineFault::parameter(name, value));
        }
        *slot = value;
        Ok(())
    }

    fn set_atom_adp(
        &mut self,
        index: usize,
        u11: f64,
        u22: f64,
        u33: f64,
    ) -> Result<(), EngineFault> {
        let structure = self
            .structure
            .as_mut()
            .ok_or(EngineFault::NotLoaded("structure"))?;
        let count = structure.sites.len();
        let site = structure
            .sites
            .get_mut(index)
            .ok_or(EngineFault::AtomIndex { index, count })?;
        for (name, value) in [("u11", u11), ("u22", u22), ("u33", u33)] {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(EngineFault::parameter(name, value));
            }
        }
        site.u_iso = (u11 + u22 + u33) / 3.0;
        Ok(())
    }

    fn read_data(
        &mut self,
        r: &[f64],
        noise: &[f64],
        radiation: Radiation,
    ) -> Result<(), EngineFault> {
        if noise.len() != r.len() {
            return Err(EngineFault::LengthMismatch {
                expected: r.len(),
                found: noise.len(),
            });
        }
        if r.windows(2).any(|w| w[1] <= w[0]) {
            return Err(EngineFault::Input("r grid must be strictly ascending".to_string()));
        }
        self.data = Some(Data {
            r: r.to_vec(),
            radiation,
        });
        Ok(())
    }

    fn calc(&mut self) -> Result<Vec<f64>, EngineFault> {
        let crystal = self.structure()?;
        let data = self.data.as_ref().ok_or(EngineFault::NotLoaded("data"))?;
        let grid = &data.r;
        let vars = self.variables;
        let mut g = vec![0.0; grid.len()];
        if grid.is_empty() || crystal.sites.is_empty() {
            return Ok(g);
        }

        let ortho = crystal.cell.orthogonalization();
        let mut atoms = Vec::with_capacity(crystal.atom_count());
        for site in &crystal.sites {
            let b = scattering::amplitude(&site.type_symbol, 0.0, data.radiation)?;
            for p in &site.positions {
                atoms.push((ortho * p, b * site.occupancy, site.occupancy, site.u_iso));
            }
        }
        let n_atoms: f64 = atoms.iter().map(|a| a.2).sum();
        if !(n_atoms > 0.0) {
            return Ok(g);
        }
        let mean_b = atoms.iter().map(|a| a.1).sum::<f64>() / n_atoms;
        if mean_b.abs() < 1e-12 {
            return Err(EngineFault::parameter("average scattering length", mean_b));
        }
        let density = n_atoms / crystal.cell.volume();

        let r_max = grid[grid.len() - 1] + R_MARGIN;
        let translations = |hkl: [i32; 3]| -> Result<i32, EngineFault> {
            let spacing = crystal
                .cell
                .d_spacing(hkl)
                .map_err(|e| EngineFault::Input(e.to_string()))?;
            Ok((r_max / spacing).ceil() as i32 + 1)
        };
        let (na, nb, nc) = (
            translations([1, 0, 0])?,
            translations([0, 1, 0])?,
            translations([0, 0, 1])?,
        );
        let sigma_floor2 = (1.0 / vars.qmax).powi(2);

        for (pi, wi, _, ui) in &atoms {
            for (pj, wj, _, uj) in &atoms {
                let weight = wi * wj / (mean_b * mean_b * n_atoms);
                for a in -na..=na {
                    for b in -nb..=nb {
                        for c in -nc..=nc {
                            let shift = ortho * Vector3::new(a as f64, b as f64, c as f64);
                            let r = (pj + shift - pi).norm();
                            if r < 1e-8 || r > r_max {
                                continue;
                            }
                            let correlation = 1.0 - vars.delta1 / r - vars.delta2 / (r * r)
                                + (vars.qbroad * r).powi(2);
                            let sigma2 = (ui + uj) * correlation.max(0.0) + sigma_floor2;
                            let sigma = sigma2.sqrt().max(MIN_SIGMA);

                            let lo = grid.partition_point(|&x| x < r - PEAK_WINDOW * sigma);
                            let hi = grid.partition_point(|&x| x <= r + PEAK_WINDOW * sigma);
                            for (x, y) in grid[lo..hi].iter().zip(&mut g[lo..hi]) {
                                if *x > 0.0 {
                                    *y += weight * gaussian(x - r, sigma) / x;
                                }
                            }
                        }
                    }
                }
            }
        }

        for (x, y) in grid.iter().zip(g.iter_mut()) {
            if *x <= 0.0 {
                *y = 0.0;
                continue;
            }
            let baseline = 4.0 * PI * x * density;
            let damping = (-0.5 * (vars.qdamp * x).powi(2)).exp();
            *y = vars.pscale * (*y - baseline) * damping * spherical_envelope(*x, vars.spdiameter);
        }

        if g.iter().any(|v| !v.is_finite()) {
            return Err(EngineFault::NonFinite);
        }
        if !self.quiet {
            debug!(
                phase = %crystal.label,
                points = g.len(),
                atoms = atoms.len(),
                "Computed G(r)."
            );
        }
        Ok(g)
    }
}
