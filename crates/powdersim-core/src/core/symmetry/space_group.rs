use super::SymmetryError;
use super::hall::{self, HallSymbol};
use super::operations::SymOp;
use super::tables::{self, Centering, SpaceGroupEntry};
use crate::core::models::atom::wrap_fraction;
use crate::core::models::phase::SpaceGroupSetting;
use nalgebra::Vector3;
use std::collections::{BTreeSet, HashSet};

const MAX_ORDER: usize = 192;
const POSITION_TOLERANCE: f64 = 1e-4;
const PHASE_TOLERANCE: f64 = 1e-6;

/// A fully expanded space group: every symmetry operator of the conventional cell,
/// lattice centering included.
#[derive(Debug, Clone)]
pub struct SpaceGroup {
    number: u16,
    symbol: &'static str,
    centering: Centering,
    operations: Vec<SymOp>,
}

impl SpaceGroup {
    pub fn from_symbol(symbol: &str, coord_code: Option<&str>) -> Result<Self, SymmetryError> {
        let entry = tables::lookup(symbol, coord_code)?;
        Self::from_entry(entry)
    }

    pub fn from_setting(setting: &SpaceGroupSetting) -> Result<Self, SymmetryError> {
        Self::from_symbol(&setting.hm_symbol, setting.coord_code.as_deref())
    }

    fn from_entry(entry: &'static SpaceGroupEntry) -> Result<Self, SymmetryError> {
        let HallSymbol {
            centering,
            generators,
        } = hall::parse(entry.hall)?;

        let identity = SymOp::identity();
        let mut seen = HashSet::from([identity.key()]);
        let mut operations = vec![identity];

        let mut cursor = 0;
        while cursor < operations.len() {
            let current = operations[cursor];
            for generator in &generators {
                let product = generator.compose(&current);
                if seen.insert(product.key()) {
                    operations.push(product);
                }
            }
            if operations.len() > MAX_ORDER {
                return Err(not_closed(entry));
            }
            cursor += 1;
        }

        let coset_count = operations.len();
        for shift in centering.translations() {
            let shift = Vector3::from(*shift);
            for index in 0..coset_count {
                let centred = operations[index].with_added_translation(&shift);
                if seen.insert(centred.key()) {
                    operations.push(centred);
                }
            }
        }
        if operations.len() > MAX_ORDER {
            return Err(not_closed(entry));
        }

        Ok(Self {
            number: entry.number,
            symbol: entry.symbol,
            centering,
            operations,
        })
    }

    pub fn number(&self) -> u16 {
        self.number
    }

    pub fn symbol(&self) -> &'static str {
        self.symbol
    }

    pub fn centering(&self) -> Centering {
        self.centering
    }

    pub fn operations(&self) -> &[SymOp] {
        &self.operations
    }

    pub fn order(&self) -> usize {
        self.operations.len()
    }

    pub fn is_centrosymmetric(&self) -> bool {
        self.operations.iter().any(|op| {
            op.rotation == -nalgebra::Matrix3::<i32>::identity()
        })
    }

    /// All distinct symmetry-equivalent positions of `position` inside the unit cell.
    pub fn orbit(&self, position: &Vector3<f64>) -> Vec<Vector3<f64>> {
        let mut orbit: Vec<Vector3<f64>> = Vec::new();
        for op in &self.operations {
            let image = op.apply(position).map(wrap_fraction);
            if !orbit.iter().any(|q| same_site(&image, q)) {
                orbit.push(image);
            }
        }
        orbit
    }

    /// Number of equivalent positions of a site (its Wyckoff multiplicity).
    pub fn site_multiplicity(&self, position: &Vector3<f64>) -> usize {
        self.orbit(position).len()
    }

    /// `true` when the reflection is systematically absent.
    pub fn is_extinct(&self, hkl: [i32; 3]) -> bool {
        if hkl == [0, 0, 0] {
            return false;
        }
        self.operations.iter().any(|op| {
            if op.rotate_hkl(hkl) != hkl {
                return false;
            }
            let phase = op.phase_shift(hkl);
            (phase - phase.round()).abs() > PHASE_TOLERANCE
        })
    }

    /// The symmetry-equivalent Miller indices of `hkl`, Friedel mates included, in
    /// ascending order.
    pub fn equivalent_reflections(&self, hkl: [i32; 3]) -> Vec<[i32; 3]> {
        let mut set = BTreeSet::new();
        for op in &self.operations {
            let [h, k, l] = op.rotate_hkl(hkl);
            set.insert([h, k, l]);
            set.insert([-h, -k, -l]);
        }
        set.into_iter().collect()
    }

    pub fn reflection_multiplicity(&self, hkl: [i32; 3]) -> u32 {
        self.equivalent_reflections(hkl).len() as u32
    }

    /// The representative of the equivalence class of `hkl` (its largest member).
    pub fn canonical_reflection(&self, hkl: [i32; 3]) -> [i32; 3] {
        self.equivalent_reflections(hkl)
            .last()
            .copied()
            .unwrap_or(hkl)
    }
}

fn same_site(a: &Vector3<f64>, b: &Vector3<f64>) -> bool {
    (a - b).iter().all(|d| {
        let wrapped = d - d.round();
        wrapped.abs() < POSITION_TOLERANCE
    })
}

fn not_closed(entry: &SpaceGroupEntry) -> SymmetryError {
    SymmetryError::InvalidOperator {
        operator: entry.hall.to_string(),
        reason: format!("generators of {} do not close into a group", entry.symbol),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(symbol: &str) -> SpaceGroup {
        SpaceGroup::from_symbol(symbol, None).unwrap()
    }

    #[test]
    fn expanded_groups_have_the_tabulated_order() {
        let expected = [
            ("P 1", 1),
            ("P -1", 2),
            ("P 21/c", 4),
            ("C 2/c", 8),
            ("P n m a", 8),
            ("P b c a", 8),
            ("P 4/m m m", 16),
            ("P 42/m n m", 16),
            ("I 41/a m d", 32),
            ("R -3 m", 36),
            ("R -3 c", 36),
            ("P 63/m m c", 24),
            ("P 21 3", 12),
            ("P m -3 m", 48),
            ("F -4 3 m", 96),
            ("F m -3 m", 192),
            ("F d -3 m", 192),
            ("I a -3 d", 96),
        ];
        for (symbol, order) in expected {
            assert_eq!(group(symbol).order(), order, "order of {symbol}");
        }
        assert_eq!(SpaceGroup::from_symbol("Fd-3m", Some("1")).unwrap().order(), 192);
    }

    /// Order of the crystal class of space group `number`.
    fn point_group_order(number: u16) -> usize {
        const CLASSES: [(u16, usize); 32] = [
            (1, 1), (2, 2), (5, 2), (9, 2), (15, 4), (24, 4), (46, 4), (74, 8),
            (80, 4), (82, 4), (88, 8), (98, 8), (110, 8), (122, 8), (142, 16),
            (146, 3), (148, 6), (155, 6), (161, 6), (167, 12), (173, 6), (174, 6),
            (176, 12), (182, 12), (186, 12), (190, 12), (194, 24), (199, 12),
            (206, 24), (214, 24), (220, 24), (230, 48),
        ];
        CLASSES
            .iter()
            .find(|(last, _)| number <= *last)
            .map(|(_, order)| *order)
            .unwrap()
    }

    #[test]
    fn every_tabulated_setting_expands_to_its_full_order() {
        for (key, entry) in tables::SPACE_GROUPS.entries() {
            let group = SpaceGroup::from_entry(entry).unwrap();
            let lattice_points = group.centering().translations().len() + 1;
            assert_eq!(
                group.order(),
                point_group_order(entry.number) * lattice_points,
                "order of {key}"
            );
        }
    }

    #[test]
    fn origin_choice_two_puts_the_inversion_centre_at_the_origin() {
        let inversion = SymOp::parse("-x,-y,-z").unwrap().key();
        for symbol in ["P 4/n m m", "P n -3 m", "I 41/a", "C c c e", "F d d d"] {
            let group = group(symbol);
            assert!(
                group.operations().iter().any(|op| op.key() == inversion),
                "{symbol}"
            );
        }
        let origin_1 = SpaceGroup::from_symbol("P 4/n m m", Some("1")).unwrap();
        assert!(origin_1.operations().iter().all(|op| op.key() != inversion));
    }

    #[test]
    fn orbits_have_wyckoff_multiplicities() {
        let fm3m = group("F m -3 m");
        assert_eq!(fm3m.site_multiplicity(&Vector3::zeros()), 4);
        assert_eq!(fm3m.site_multiplicity(&Vector3::new(0.25, 0.25, 0.25)), 8);

        let fd3m = group("F d -3 m");
        assert_eq!(fd3m.site_multiplicity(&Vector3::new(0.125, 0.125, 0.125)), 8);

        let fd3m_origin_1 = SpaceGroup::from_symbol("F d -3 m", Some("1")).unwrap();
        assert_eq!(fd3m_origin_1.site_multiplicity(&Vector3::zeros()), 8);

        let pnma = group("P n m a");
        assert_eq!(pnma.site_multiplicity(&Vector3::new(0.1, 0.25, 0.3)), 4);
        assert_eq!(pnma.site_multiplicity(&Vector3::new(0.1, 0.2, 0.3)), 8);
    }

    #[test]
    fn systematic_absences_follow_lattice_and_glides() {
        let fm3m = group("F m -3 m");
        assert!(fm3m.is_extinct([1, 0, 0]));
        assert!(!fm3m.is_extinct([1, 1, 1]));
        assert!(!fm3m.is_extinct([2, 0, 0]));

        let fd3m = group("F d -3 m");
        assert!(fd3m.is_extinct([2, 0, 0]));
        assert!(!fd3m.is_extinct([1, 1, 1]));
        assert!(!fd3m.is_extinct([2, 2, 0]));
        assert!(!fd3m.is_extinct([4, 0, 0]));

        let p21c = group("P 21/c");
        assert!(p21c.is_extinct([0, 1, 0]));
        assert!(!p21c.is_extinct([0, 2, 0]));
        assert!(p21c.is_extinct([1, 0, 1]));
        assert!(!p21c.is_extinct([1, 0, 2]));
    }

    #[test]
    fn screw_axes_and_glides_of_common_groups() {
        let p212121 = group("P 21 21 21");
        for hkl in [[1, 0, 0], [0, 1, 0], [0, 0, 1]] {
            assert!(p212121.is_extinct(hkl), "{hkl:?}");
        }
        assert!(!p212121.is_extinct([2, 0, 0]));
        assert!(!p212121.is_extinct([1, 1, 1]));

        let p63m = group("P 63/m");
        assert!(p63m.is_extinct([0, 0, 1]));
        assert!(!p63m.is_extinct([0, 0, 2]));

        let p4132 = group("P 41 3 2");
        assert!(p4132.is_extinct([2, 0, 0]));
        assert!(!p4132.is_extinct([4, 0, 0]));

        let p3112 = group("P 31 1 2");
        assert!(p3112.is_extinct([0, 0, 1]));
        assert!(!p3112.is_extinct([0, 0, 3]));

        let r3m = group("R 3 m");
        assert!(r3m.is_extinct([1, 0, 0]));
        assert!(!r3m.is_extinct([1, 0, 1]));
        let r3c_rhombohedral = SpaceGroup::from_symbol("R -3 c", Some("r")).unwrap();
        assert_eq!(r3c_rhombohedral.order(), 12);
        assert!(r3c_rhombohedral.is_extinct([1, 0, 0]));
        assert!(!r3c_rhombohedral.is_extinct([1, 1, 0]));
    }

    #[test]
    fn reflection_multiplicities_include_friedel_mates() {
        let pm3m = group("P m -3 m");
        assert_eq!(pm3m.reflection_multiplicity([1, 0, 0]), 6);
        assert_eq!(pm3m.reflection_multiplicity([1, 1, 0]), 12);
        assert_eq!(pm3m.reflection_multiplicity([1, 1, 1]), 8);
        assert_eq!(pm3m.reflection_multiplicity([1, 2, 3]), 48);

        let p1 = group("P 1");
        assert_eq!(p1.reflection_multiplicity([1, 2, 3]), 2);
        assert_eq!(pm3m.canonical_reflection([0, 0, -1]), [1, 0, 0]);
    }

    #[test]
    fn centrosymmetry_is_detected() {
        assert!(group("F m -3 m").is_centrosymmetric());
        assert!(!group("F -4 3 m").is_centrosymmetric());
        assert!(!group("P 21 3").is_centrosymmetric());
    }

    #[test]
    fn unknown_symbol_is_an_error() {
        assert!(matches!(
            SpaceGroup::from_symbol("X 42", None),
            Err(SymmetryError::UnknownSpaceGroup(_))
        ));
    }
}
