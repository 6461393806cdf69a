use super::SymmetryError;
use super::operations::SymOp;
use super::tables::Centering;
use nalgebra::{Matrix3, Vector3};

/// Lattice and generators encoded by a Hall symbol such as `-P 2ac 2n`.
#[derive(Debug, Clone)]
pub struct HallSymbol {
    pub centering: Centering,
    /// Generators in symbol order; the inversion of a leading `-` comes last.
    pub generators: Vec<SymOp>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
    Z,
    /// Face diagonal `'` relative to the preceding axis.
    Prime,
    /// Face diagonal `"` relative to the preceding axis.
    DoublePrime,
    /// Body diagonal `*`.
    Body,
}

impl Axis {
    fn from_char(c: char) -> Option<Self> {
        match c {
            'x' => Some(Axis::X),
            'y' => Some(Axis::Y),
            'z' => Some(Axis::Z),
            '\'' => Some(Axis::Prime),
            '"' => Some(Axis::DoublePrime),
            '*' => Some(Axis::Body),
            _ => None,
        }
    }

    fn direction(self) -> Option<Vector3<f64>> {
        match self {
            Axis::X => Some(Vector3::x()),
            Axis::Y => Some(Vector3::y()),
            Axis::Z => Some(Vector3::z()),
            _ => None,
        }
    }
}

/// Parses a Hall symbol with an optional origin shift `(vx vy vz)` in twelfths.
pub fn parse(symbol: &str) -> Result<HallSymbol, SymmetryError> {
    let (body, shift) = match symbol.split_once('(') {
        Some((body, rest)) => {
            let inner = rest
                .strip_suffix(')')
                .ok_or_else(|| invalid(symbol, "unterminated origin shift"))?;
            (body, Some(parse_shift(symbol, inner)?))
        }
        None => (symbol, None),
    };

    let mut tokens = body.split_whitespace();
    let lattice = tokens
        .next()
        .ok_or_else(|| invalid(symbol, "missing lattice symbol"))?;
    let (centrosymmetric, lattice) = match lattice.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, lattice),
    };
    let centering = match lattice {
        "P" => Centering::P,
        "A" => Centering::A,
        "B" => Centering::B,
        "C" => Centering::C,
        "I" => Centering::I,
        "F" => Centering::F,
        "R" => Centering::R,
        other => return Err(invalid(symbol, format!("unsupported lattice '{other}'"))),
    };

    let mut generators = Vec::new();
    let mut previous_order = None;
    let mut previous_axis = Axis::Z;
    for (position, token) in tokens.enumerate() {
        let matrix = MatrixSymbol::parse(symbol, token)?;
        let axis = matrix
            .axis
            .or_else(|| default_axis(position, matrix.order, previous_order))
            .ok_or_else(|| invalid(symbol, format!("cannot infer the axis of '{token}'")))?;
        generators.push(matrix.to_op(symbol, axis, previous_axis)?);
        previous_order = Some(matrix.order);
        if matches!(axis, Axis::X | Axis::Y | Axis::Z) {
            previous_axis = axis;
        }
    }
    if centrosymmetric {
        generators.push(SymOp::new(-Matrix3::identity(), Vector3::zeros()));
    }

    if let Some(shift) = shift {
        generators = generators.iter().map(|op| shift_origin(op, &shift)).collect();
    }
    Ok(HallSymbol {
        centering,
        generators,
    })
}

/// Hall's implicit axes: the first rotation is along `z`, a second 2-fold follows `x`
/// after a 2 or 4 and the `'` diagonal after a 3 or 6, a third 3-fold is the body diagonal.
fn default_axis(position: usize, order: u8, previous: Option<u8>) -> Option<Axis> {
    match (position, order, previous) {
        (_, 1, _) => Some(Axis::Z),
        (0, _, _) => Some(Axis::Z),
        (1, 2, Some(2 | 4)) => Some(Axis::X),
        (1, 2, Some(3 | 6)) => Some(Axis::Prime),
        (2, 3, _) => Some(Axis::Body),
        _ => None,
    }
}

struct MatrixSymbol {
    improper: bool,
    order: u8,
    axis: Option<Axis>,
    screw: u8,
    translation: Vector3<f64>,
}

impl MatrixSymbol {
    fn parse(symbol: &str, token: &str) -> Result<Self, SymmetryError> {
        let (improper, rest) = match token.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, token),
        };
        let mut chars = rest.chars();
        let order = match chars.next() {
            Some(c @ ('1' | '2' | '3' | '4' | '6')) => c as u8 - b'0',
            _ => return Err(invalid(symbol, format!("'{token}' has no rotation order"))),
        };

        let mut parsed = Self {
            improper,
            order,
            axis: None,
            screw: 0,
            translation: Vector3::zeros(),
        };
        for c in chars {
            if let Some(axis) = Axis::from_char(c) {
                parsed.axis = Some(axis);
            } else if let Some(shift) = translation_symbol(c) {
                parsed.translation += shift;
            } else if let Some(digit) = c.to_digit(10).filter(|d| (1..=5).contains(d)) {
                parsed.screw = digit as u8;
            } else {
                return Err(invalid(symbol, format!("unexpected '{c}' in '{token}'")));
            }
        }
        Ok(parsed)
    }

    fn to_op(&self, symbol: &str, axis: Axis, previous: Axis) -> Result<SymOp, SymmetryError> {
        let rotation = rotation_matrix(self.order, axis, previous)
            .ok_or_else(|| invalid(symbol, format!("no {}-fold rotation along that axis", self.order)))?;
        let mut translation = self.translation;
        if self.screw > 0 {
            let direction = axis
                .direction()
                .ok_or_else(|| invalid(symbol, "screw component on a diagonal axis"))?;
            translation += direction * (self.screw as f64 / self.order as f64);
        }
        let rotation = if self.improper { -rotation } else { rotation };
        Ok(SymOp::new(rotation, translation))
    }
}

fn translation_symbol(c: char) -> Option<Vector3<f64>> {
    let v = match c {
        'a' => [0.5, 0.0, 0.0],
        'b' => [0.0, 0.5, 0.0],
        'c' => [0.0, 0.0, 0.5],
        'n' => [0.5, 0.5, 0.5],
        'u' => [0.25, 0.0, 0.0],
        'v' => [0.0, 0.25, 0.0],
        'w' => [0.0, 0.0, 0.25],
        'd' => [0.25, 0.25, 0.25],
        _ => return None,
    };
    Some(Vector3::from(v))
}

fn rotation_matrix(order: u8, axis: Axis, previous: Axis) -> Option<Matrix3<i32>> {
    #[rustfmt::skip]
    let m = match (order, axis, previous) {
        (1, _, _) => [1, 0, 0, 0, 1, 0, 0, 0, 1],
        (2, Axis::X, _) => [1, 0, 0, 0, -1, 0, 0, 0, -1],
        (2, Axis::Y, _) => [-1, 0, 0, 0, 1, 0, 0, 0, -1],
        (2, Axis::Z, _) => [-1, 0, 0, 0, -1, 0, 0, 0, 1],
        (3, Axis::X, _) => [1, 0, 0, 0, 0, -1, 0, 1, -1],
        (3, Axis::Y, _) => [-1, 0, 1, 0, 1, 0, -1, 0, 0],
        (3, Axis::Z, _) => [0, -1, 0, 1, -1, 0, 0, 0, 1],
        (4, Axis::X, _) => [1, 0, 0, 0, 0, -1, 0, 1, 0],
        (4, Axis::Y, _) => [0, 0, 1, 0, 1, 0, -1, 0, 0],
        (4, Axis::Z, _) => [0, -1, 0, 1, 0, 0, 0, 0, 1],
        (6, Axis::X, _) => [1, 0, 0, 0, 1, -1, 0, 1, 0],
        (6, Axis::Y, _) => [0, 0, 1, 0, 1, 0, -1, 0, 1],
        (6, Axis::Z, _) => [1, -1, 0, 1, 0, 0, 0, 0, 1],
        (2, Axis::Prime, Axis::X) => [-1, 0, 0, 0, 0, -1, 0, -1, 0],
        (2, Axis::Prime, Axis::Y) => [0, 0, -1, 0, -1, 0, -1, 0, 0],
        (2, Axis::Prime, _) => [0, -1, 0, -1, 0, 0, 0, 0, -1],
        (2, Axis::DoublePrime, Axis::X) => [-1, 0, 0, 0, 0, 1, 0, 1, 0],
        (2, Axis::DoublePrime, Axis::Y) => [0, 0, 1, 0, -1, 0, 1, 0, 0],
        (2, Axis::DoublePrime, _) => [0, 1, 0, 1, 0, 0, 0, 0, -1],
        (3, Axis::Body, _) => [0, 0, 1, 1, 0, 0, 0, 1, 0],
        _ => return None,
    };
    Some(Matrix3::from_row_slice(&m))
}

fn parse_shift(symbol: &str, inner: &str) -> Result<Vector3<f64>, SymmetryError> {
    let parts = inner
        .split_whitespace()
        .map(|p| p.parse::<i32>().map(|v| v as f64 / 12.0))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| invalid(symbol, "origin shift must be integer twelfths"))?;
    match parts.as_slice() {
        [x, y, z] => Ok(Vector3::new(*x, *y, *z)),
        _ => Err(invalid(symbol, "origin shift needs three components")),
    }
}

/// `{R|t}` seen from an origin moved by `v`: `{R | t + v - R·v}`.
fn shift_origin(op: &SymOp, shift: &Vector3<f64>) -> SymOp {
    let rotation = op.rotation.map(|v| v as f64);
    SymOp::new(op.rotation, op.translation + shift - rotation * shift)
}

fn invalid(symbol: &str, reason: impl Into<String>) -> SymmetryError {
    SymmetryError::InvalidHallSymbol {
        symbol: symbol.trim().to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ops(symbol: &str) -> Vec<SymOp> {
        parse(symbol).unwrap().generators
    }

    fn assert_op(op: &SymOp, triplet: &str) {
        assert_eq!(op.key(), SymOp::parse(triplet).unwrap().key(), "expected {triplet}");
    }

    #[test]
    fn screw_and_glide_translations_are_placed_on_the_axis() {
        let p21c = ops("-P 2ybc");
        assert_eq!(p21c.len(), 2);
        assert_op(&p21c[0], "-x,y+1/2,-z+1/2");
        assert_op(&p21c[1], "-x,-y,-z");

        let p61 = ops("P 61");
        assert_op(&p61[0], "x-y,x,z+1/6");
    }

    #[test]
    fn implicit_axes_follow_the_preceding_rotation() {
        let p321 = ops("P 3 2\"");
        assert_op(&p321[1], "y,x,-z");
        let p312 = ops("P 3 2");
        assert_op(&p312[1], "-y,-x,-z");
        let p432 = ops("P 4 2 3");
        assert_op(&p432[1], "x,-y,-z");
        assert_op(&p432[2], "z,x,y");
    }

    #[test]
    fn origin_shift_moves_the_two_fold_axes() {
        let p3112 = ops("P 31 2c (0 0 1)");
        assert_op(&p3112[0], "-y,x-y,z+1/3");
        assert_op(&p3112[1], "-y,-x,-z+2/3");
    }

    #[test]
    fn lattice_symbol_sets_the_centering() {
        assert_eq!(parse("-F 4vw 2vw 3").unwrap().centering, Centering::F);
        assert_eq!(parse("-R 3 2\"").unwrap().centering, Centering::R);
        assert_eq!(parse("P 3*").unwrap().centering, Centering::P);
    }

    #[test]
    fn malformed_symbols_are_rejected() {
        for bad in ["", "Q 2", "P 5", "P 2q", "P 31 2c (0 0)", "P 3 3"] {
            assert!(
                matches!(parse(bad), Err(SymmetryError::InvalidHallSymbol { .. })),
                "{bad:?} should not parse"
            );
        }
    }
}
