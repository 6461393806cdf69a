use super::ModelError;
use crate::core::uncertainty::Measured;
use nalgebra::Vector3;

/// An atom site of a crystalline phase.
///
/// Positions are fractional coordinates wrapped into `[0, 1)`. The site describes the
/// asymmetric-unit position only; the symmetry-equivalent positions are produced by the
/// space group when a phase is registered with an engine.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomSite {
    /// Unique label within the phase (e.g. "Fe1").
    pub label: String,
    /// Element or ion symbol as written in the structure file (e.g. "Fe3+").
    pub type_symbol: String,
    /// Fractional coordinates `(x, y, z)`.
    pub fract: [Measured; 3],
    /// Site occupancy in `[0, 1]`.
    pub occupancy: Measured,
    /// Isotropic displacement parameter in Å², if known.
    pub u_iso: Option<Measured>,
}

impl AtomSite {
    pub fn new(label: impl Into<String>, type_symbol: impl Into<String>, xyz: [f64; 3]) -> Self {
        Self {
            label: label.into(),
            type_symbol: type_symbol.into(),
            fract: xyz.map(|v| Measured::new(wrap_fraction(v))),
            occupancy: Measured::new(1.0),
            u_iso: None,
        }
    }

    pub fn with_occupancy(mut self, occupancy: f64) -> Self {
        self.occupancy = Measured::new(occupancy);
        self
    }

    pub fn with_u_iso(mut self, u_iso: f64) -> Self {
        self.u_iso = Some(Measured::new(u_iso));
        self
    }

    /// Replaces the fractional coordinates, wrapping each into `[0, 1)` while keeping
    /// any attached uncertainty.
    pub fn set_fract(&mut self, fract: [Measured; 3]) {
        self.fract = fract.map(|m| Measured {
            value: wrap_fraction(m.value),
            error: m.error,
        });
    }

    pub fn position(&self) -> Vector3<f64> {
        Vector3::new(self.fract[0].value, self.fract[1].value, self.fract[2].value)
    }

    /// The element symbol with charge and numbering stripped, e.g. `"Fe3+"` → `"Fe"`.
    pub fn element(&self) -> String {
        element_symbol(&self.type_symbol)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.label.trim().is_empty() {
            return Err(ModelError::EmptyLabel);
        }
        if self.fract.iter().any(|m| !m.value.is_finite()) {
            return Err(ModelError::NonFiniteCoordinate {
                label: self.label.clone(),
            });
        }
        let occupancy = self.occupancy.value;
        if !(0.0..=1.0).contains(&occupancy) {
            return Err(ModelError::InvalidOccupancy {
                label: self.label.clone(),
                value: occupancy,
            });
        }
        if let Some(u) = self.u_iso {
            if !(u.value >= 0.0) {
                return Err(ModelError::NegativeDisplacement {
                    label: self.label.clone(),
                    value: u.value,
                });
            }
        }
        if self.element().is_empty() {
            return Err(ModelError::InvalidElement {
                label: self.label.clone(),
                symbol: self.type_symbol.clone(),
            });
        }
        Ok(())
    }
}

/// Wraps a fractional coordinate into `[0, 1)`.
pub fn wrap_fraction(value: f64) -> f64 {
    let wrapped = value.rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs.
    if wrapped >= 1.0 { 0.0 } else { wrapped }
}

/// Extracts a capitalised element symbol from a type symbol or site label.
pub fn element_symbol(raw: &str) -> String {
    let mut chars = raw.trim().chars().filter(|c| !c.is_whitespace());
    let Some(first) = chars.next().filter(|c| c.is_ascii_alphabetic()) else {
        return String::new();
    };
    let mut symbol = first.to_ascii_uppercase().to_string();
    if let Some(second) = chars.next().filter(|c| c.is_ascii_alphabetic()) {
        symbol.push(second.to_ascii_lowercase());
    }
    symbol
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_wraps_coordinates_into_unit_interval() {
        let atom = AtomSite::new("O1", "O", [1.25, -0.25, 2.0]);
        let p = atom.position();
        assert!((p.x - 0.25).abs() < 1e-12);
        assert!((p.y - 0.75).abs() < 1e-12);
        assert_eq!(p.z, 0.0);
    }

    #[test]
    fn wrap_fraction_never_returns_one() {
        assert_eq!(wrap_fraction(-1e-18), 0.0);
        assert!(wrap_fraction(0.999_999) < 1.0);
    }

    #[test]
    fn element_strips_charge_and_numbering() {
        assert_eq!(element_symbol("Fe3+"), "Fe");
        assert_eq!(element_symbol("O2-"), "O");
        assert_eq!(element_symbol("SI"), "Si");
        assert_eq!(element_symbol("Ca1"), "Ca");
        assert_eq!(element_symbol("3+"), "");
    }

    #[test]
    fn validate_rejects_bad_occupancy_and_displacement() {
        let atom = AtomSite::new("Fe1", "Fe", [0.0; 3]).with_occupancy(1.5);
        assert!(matches!(
            atom.validate(),
            Err(ModelError::InvalidOccupancy { .. })
        ));

        let atom = AtomSite::new("Fe1", "Fe", [0.0; 3]).with_u_iso(-0.01);
        assert!(matches!(
            atom.validate(),
            Err(ModelError::NegativeDisplacement { .. })
        ));

        let atom = AtomSite::new("", "Fe", [0.0; 3]);
        assert_eq!(atom.validate(), Err(ModelError::EmptyLabel));
    }

    #[test]
    fn validate_accepts_a_plain_site() {
        let atom = AtomSite::new("Si1", "Si4+", [0.125, 0.125, 0.125]).with_u_iso(0.005);
        assert!(atom.validate().is_ok());
        assert_eq!(atom.element(), "Si");
    }
}
