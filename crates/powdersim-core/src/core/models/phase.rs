use super::ModelError;
use super::atom::AtomSite;
use crate::core::uncertainty::Measured;
use nalgebra::{Matrix3, Vector3};
use std::collections::HashSet;

/// Unit cell parameters. Lengths in Å, angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub a: Measured,
    pub b: Measured,
    pub c: Measured,
    pub alpha: Measured,
    pub beta: Measured,
    pub gamma: Measured,
}

impl Cell {
    pub fn new(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Self {
        Self {
            a: Measured::new(a),
            b: Measured::new(b),
            c: Measured::new(c),
            alpha: Measured::new(alpha),
            beta: Measured::new(beta),
            gamma: Measured::new(gamma),
        }
    }

    pub fn cubic(a: f64) -> Self {
        Self::new(a, a, a, 90.0, 90.0, 90.0)
    }

    pub fn tetragonal(a: f64, c: f64) -> Self {
        Self::new(a, a, c, 90.0, 90.0, 90.0)
    }

    pub fn hexagonal(a: f64, c: f64) -> Self {
        Self::new(a, a, c, 90.0, 90.0, 120.0)
    }

    fn lengths(&self) -> [f64; 3] {
        [self.a.value, self.b.value, self.c.value]
    }

    fn angles_rad(&self) -> [f64; 3] {
        [
            self.alpha.value.to_radians(),
            self.beta.value.to_radians(),
            self.gamma.value.to_radians(),
        ]
    }

    /// `V² / (abc)²`, zero when the three axes are coplanar.
    fn angular_radicand(&self) -> f64 {
        let [al, be, ga] = self.angles_rad();
        let (ca, cb, cg) = (al.cos(), be.cos(), ga.cos());
        1.0 - ca * ca - cb * cb - cg * cg + 2.0 * ca * cb * cg
    }

    pub fn volume(&self) -> f64 {
        let [a, b, c] = self.lengths();
        a * b * c * self.angular_radicand().max(0.0).sqrt()
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        for (name, length) in ["a", "b", "c"].iter().zip(self.lengths()) {
            if !(length > 0.0) || !length.is_finite() {
                return Err(ModelError::InvalidCell(format!(
                    "length {name} = {length} must be positive"
                )));
            }
        }
        for (name, angle) in ["alpha", "beta", "gamma"]
            .iter()
            .zip([self.alpha.value, self.beta.value, self.gamma.value])
        {
            if !(angle > 0.0 && angle < 180.0) {
                return Err(ModelError::InvalidCell(format!(
                    "angle {name} = {angle} must lie strictly between 0 and 180 degrees"
                )));
            }
        }
        if !(self.angular_radicand() > 1e-10) {
            return Err(ModelError::InvalidCell(
                "angles do not describe a three-dimensional cell".to_string(),
            ));
        }
        Ok(())
    }

    /// Direct-space metric tensor `G`.
    pub fn metric_tensor(&self) -> Matrix3<f64> {
        let [a, b, c] = self.lengths();
        let [al, be, ga] = self.angles_rad();
        Matrix3::new(
            a * a,
            a * b * ga.cos(),
            a * c * be.cos(),
            a * b * ga.cos(),
            b * b,
            b * c * al.cos(),
            a * c * be.cos(),
            b * c * al.cos(),
            c * c,
        )
    }

    /// Reciprocal metric tensor `G*`, or an error for a degenerate cell.
    pub fn reciprocal_metric(&self) -> Result<Matrix3<f64>, ModelError> {
        self.validate()?;
        self.metric_tensor()
            .try_inverse()
            .ok_or_else(|| ModelError::InvalidCell("metric tensor is singular".to_string()))
    }

    /// Interplanar spacing of the `(hkl)` planes.
    pub fn d_spacing(&self, hkl: [i32; 3]) -> Result<f64, ModelError> {
        let gstar = self.reciprocal_metric()?;
        Ok(1.0 / inverse_d_squared(&gstar, hkl).sqrt())
    }

    /// Matrix converting fractional to Cartesian coordinates, with `a` along `x` and
    /// `b` in the `xy` plane.
    pub fn orthogonalization(&self) -> Matrix3<f64> {
        let [a, b, c] = self.lengths();
        let [al, be, ga] = self.angles_rad();
        let (ca, cb, cg, sg) = (al.cos(), be.cos(), ga.cos(), ga.sin());
        let volume = self.volume();
        Matrix3::new(
            a,
            b * cg,
            c * cb,
            0.0,
            b * sg,
            c * (ca - cb * cg) / sg,
            0.0,
            0.0,
            volume / (a * b * sg),
        )
    }
}

/// `1/d²` for a reflection given the reciprocal metric tensor.
pub fn inverse_d_squared(gstar: &Matrix3<f64>, hkl: [i32; 3]) -> f64 {
    let h = Vector3::new(hkl[0] as f64, hkl[1] as f64, hkl[2] as f64);
    (h.transpose() * gstar * h)[(0, 0)]
}

/// The space group of a phase as named by the caller: a Hermann–Mauguin symbol and an
/// optional coordinate-system code (origin choice or axes, e.g. `"2"` or `"h"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaceGroupSetting {
    pub hm_symbol: String,
    pub coord_code: Option<String>,
}

impl SpaceGroupSetting {
    pub fn new(hm_symbol: impl Into<String>) -> Self {
        Self {
            hm_symbol: hm_symbol.into(),
            coord_code: None,
        }
    }

    pub fn with_code(hm_symbol: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            hm_symbol: hm_symbol.into(),
            coord_code: Some(code.into()),
        }
    }
}

impl Default for SpaceGroupSetting {
    fn default() -> Self {
        Self::new("P 1")
    }
}

/// A crystalline phase contributing to a pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct Phase {
    /// Label, unique within a calculation job.
    pub label: String,
    pub cell: Cell,
    pub space_group: SpaceGroupSetting,
    /// Atom sites in insertion order.
    pub atoms: Vec<AtomSite>,
    /// Phase scale factor `s_i`.
    pub scale: Measured,
}

impl Phase {
    pub fn new(label: impl Into<String>, cell: Cell, space_group: SpaceGroupSetting) -> Self {
        Self {
            label: label.into(),
            cell,
            space_group,
            atoms: Vec::new(),
            scale: Measured::new(1.0),
        }
    }

    pub fn with_atom(mut self, atom: AtomSite) -> Self {
        self.atoms.push(atom);
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = Measured::new(scale);
        self
    }

    pub fn atom(&self, label: &str) -> Option<&AtomSite> {
        self.atoms.iter().find(|a| a.label == label)
    }

    pub fn atom_index(&self, label: &str) -> Option<usize> {
        self.atoms.iter().position(|a| a.label == label)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.label.trim().is_empty() {
            return Err(ModelError::EmptyLabel);
        }
        self.cell.validate()?;
        validate_scale(&self.label, self.scale.value)?;

        let mut seen = HashSet::new();
        for atom in &self.atoms {
            atom.validate()?;
            if !seen.insert(atom.label.as_str()) {
                return Err(ModelError::DuplicateAtomLabel {
                    phase: self.label.clone(),
                    atom: atom.label.clone(),
                });
            }
        }
        Ok(())
    }
}

pub fn validate_scale(label: &str, scale: f64) -> Result<(), ModelError> {
    if scale.is_finite() && scale >= 0.0 {
        Ok(())
    } else {
        Err(ModelError::InvalidScale {
            label: label.to_string(),
            value: scale,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    #[test]
    fn cubic_cell_volume_and_d_spacing() {
        let cell = Cell::cubic(4.0);
        assert!((cell.volume() - 64.0).abs() < TOLERANCE);
        assert!((cell.d_spacing([1, 0, 0]).unwrap() - 4.0).abs() < TOLERANCE);
        assert!((cell.d_spacing([1, 1, 1]).unwrap() - 4.0 / 3f64.sqrt()).abs() < TOLERANCE);
    }

    #[test]
    fn hexagonal_d_spacing_matches_closed_form() {
        let (a, c) = (3.0, 5.0);
        let cell = Cell::hexagonal(a, c);
        let (h, k, l) = (1.0, 1.0, 1.0);
        let inv_d2 = 4.0 / 3.0 * (h * h + h * k + k * k) / (a * a) + l * l / (c * c);
        let expected = 1.0 / inv_d2.sqrt();
        assert!((cell.d_spacing([1, 1, 1]).unwrap() - expected).abs() < TOLERANCE);
    }

    #[test]
    fn orthogonalization_preserves_lengths() {
        let cell = Cell::new(5.0, 6.0, 7.0, 80.0, 95.0, 105.0);
        let m = cell.orthogonalization();
        let c_axis = m * Vector3::new(0.0, 0.0, 1.0);
        assert!((c_axis.norm() - 7.0).abs() < 1e-9);
        assert!((m.determinant() - cell.volume()).abs() < 1e-9);
    }

    #[test]
    fn validate_rejects_degenerate_cells() {
        assert!(Cell::cubic(-1.0).validate().is_err());
        assert!(Cell::new(1.0, 1.0, 1.0, 90.0, 90.0, 180.0).validate().is_err());
        assert!(Cell::new(1.0, 1.0, 1.0, 120.0, 120.0, 120.0).validate().is_err());
        assert!(Cell::new(100.0, 100.0, 100.0, 120.0, 120.0, 120.0).validate().is_err());
        assert!(Cell::new(1.0, 1.0, 1.0, 119.9, 119.9, 119.9).validate().is_ok());
    }

    #[test]
    fn phase_validation_rejects_duplicate_atom_labels() {
        let phase = Phase::new("si", Cell::cubic(5.43), SpaceGroupSetting::new("F d -3 m"))
            .with_atom(AtomSite::new("Si1", "Si", [0.0; 3]))
            .with_atom(AtomSite::new("Si1", "Si", [0.5; 3]));
        assert!(matches!(
            phase.validate(),
            Err(ModelError::DuplicateAtomLabel { .. })
        ));
    }

    #[test]
    fn phase_defaults_to_unit_scale() {
        let phase = Phase::new("p", Cell::cubic(3.0), SpaceGroupSetting::default());
        assert_eq!(phase.scale.value, 1.0);
        assert!(phase.validate().is_ok());
        assert!(phase.clone().with_scale(-1.0).validate().is_err());
    }
}
