use super::SymmetryError;
use nalgebra::{Matrix3, Vector3};
use std::fmt;

// Translations of every supported group are multiples of 1/48.
const TRANSLATION_GRID: f64 = 48.0;
const TOLERANCE: f64 = 1e-6;

/// A Seitz operator `{R|t}` acting on fractional coordinates: `x' = R·x + t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymOp {
    pub rotation: Matrix3<i32>,
    pub translation: Vector3<f64>,
}

impl SymOp {
    pub fn identity() -> Self {
        Self {
            rotation: Matrix3::identity(),
            translation: Vector3::zeros(),
        }
    }

    pub fn new(rotation: Matrix3<i32>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation: translation.map(wrap_translation),
        }
    }

    /// Parses a Jones-faithful triplet such as `"-x+1/2, y, -z+3/4"`.
    pub fn parse(text: &str) -> Result<Self, SymmetryError> {
        let components: Vec<&str> = text.split(',').collect();
        if components.len() != 3 {
            return Err(invalid(text, "expected three comma-separated components"));
        }

        let mut rotation = Matrix3::<i32>::zeros();
        let mut translation = Vector3::<f64>::zeros();
        for (row, component) in components.iter().enumerate() {
            let (coefficients, shift) = parse_component(component).map_err(|r| invalid(text, r))?;
            for (col, coefficient) in coefficients.into_iter().enumerate() {
                rotation[(row, col)] = coefficient;
            }
            translation[row] = shift;
        }

        let det = rotation.map(|v| v as f64).determinant();
        if (det.abs() - 1.0).abs() > TOLERANCE {
            return Err(invalid(text, "rotation part is not unimodular"));
        }
        Ok(Self::new(rotation, translation))
    }

    pub fn apply(&self, position: &Vector3<f64>) -> Vector3<f64> {
        self.rotate(position) + self.translation
    }

    fn rotate(&self, v: &Vector3<f64>) -> Vector3<f64> {
        let r = &self.rotation;
        Vector3::from_fn(|i, _| {
            r[(i, 0)] as f64 * v.x + r[(i, 1)] as f64 * v.y + r[(i, 2)] as f64 * v.z
        })
    }

    /// `self ∘ other`, i.e. `other` applied first. Translations are reduced modulo 1.
    pub fn compose(&self, other: &SymOp) -> SymOp {
        SymOp::new(
            self.rotation * other.rotation,
            self.rotate(&other.translation) + self.translation,
        )
    }

    pub fn with_added_translation(&self, shift: &Vector3<f64>) -> SymOp {
        SymOp::new(self.rotation, self.translation + shift)
    }

    /// Transforms Miller indices as a row vector: `h' = h·R`.
    pub fn rotate_hkl(&self, hkl: [i32; 3]) -> [i32; 3] {
        let r = &self.rotation;
        std::array::from_fn(|j| hkl[0] * r[(0, j)] + hkl[1] * r[(1, j)] + hkl[2] * r[(2, j)])
    }

    /// Phase shift `h·t` of this operator for a reflection.
    pub fn phase_shift(&self, hkl: [i32; 3]) -> f64 {
        hkl[0] as f64 * self.translation.x
            + hkl[1] as f64 * self.translation.y
            + hkl[2] as f64 * self.translation.z
    }

    pub fn is_identity(&self) -> bool {
        self.rotation == Matrix3::identity() && self.translation.iter().all(|t| t.abs() < TOLERANCE)
    }

    /// Discrete identity of the operator, used to deduplicate group elements.
    pub(crate) fn key(&self) -> ([i32; 9], [i64; 3]) {
        let mut rotation = [0; 9];
        for (slot, value) in rotation.iter_mut().zip(self.rotation.iter()) {
            *slot = *value;
        }
        let translation = std::array::from_fn(|i| {
            ((self.translation[i] * TRANSLATION_GRID).round() as i64).rem_euclid(TRANSLATION_GRID as i64)
        });
        (rotation, translation)
    }
}

fn wrap_translation(t: f64) -> f64 {
    let wrapped = t.rem_euclid(1.0);
    if (1.0 - wrapped) < TOLERANCE || wrapped < TOLERANCE {
        0.0
    } else {
        wrapped
    }
}

fn invalid(operator: &str, reason: impl Into<String>) -> SymmetryError {
    SymmetryError::InvalidOperator {
        operator: operator.trim().to_string(),
        reason: reason.into(),
    }
}

fn parse_component(component: &str) -> Result<([i32; 3], f64), String> {
    let mut coefficients = [0i32; 3];
    let mut shift = 0.0;
    let mut sign = 1i32;
    let mut pending_sign = false;
    let mut seen_term = false;

    let chars: Vec<char> = component.chars().filter(|c| !c.is_whitespace()).collect();
    if chars.is_empty() {
        return Err("empty component".to_string());
    }

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '+' | '-' => {
                if pending_sign {
                    return Err(format!("repeated sign in '{component}'"));
                }
                sign = if c == '-' { -1 } else { 1 };
                pending_sign = true;
                i += 1;
            }
            'x' | 'y' | 'z' | 'X' | 'Y' | 'Z' => {
                if seen_term && !pending_sign {
                    return Err(format!("missing operator before '{c}'"));
                }
                let col = match c.to_ascii_lowercase() {
                    'x' => 0,
                    'y' => 1,
                    _ => 2,
                };
                coefficients[col] += sign;
                sign = 1;
                pending_sign = false;
                seen_term = true;
                i += 1;
            }
            '0'..='9' | '.' => {
                if seen_term && !pending_sign {
                    return Err(format!("missing operator before '{c}'"));
                }
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.' || chars[i] == '/') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                shift += sign as f64 * parse_fraction(&literal)?;
                sign = 1;
                pending_sign = false;
                seen_term = true;
            }
            other => return Err(format!("unexpected character '{other}'")),
        }
    }

    if pending_sign {
        return Err(format!("dangling sign in '{component}'"));
    }
    Ok((coefficients, shift))
}

fn parse_fraction(literal: &str) -> Result<f64, String> {
    let bad = || format!("invalid number '{literal}'");
    match literal.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().map_err(|_| bad())?;
            let den: f64 = den.parse().map_err(|_| bad())?;
            if den == 0.0 {
                return Err(bad());
            }
            Ok(num / den)
        }
        None => literal.parse().map_err(|_| bad()),
    }
}

impl fmt::Display for SymOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut components = Vec::with_capacity(3);
        for row in 0..3 {
            let mut text = String::new();
            for (col, name) in ["x", "y", "z"].iter().enumerate() {
                match self.rotation[(row, col)] {
                    0 => {}
                    1 => {
                        if !text.is_empty() {
                            text.push('+');
                        }
                        text.push_str(name);
                    }
                    -1 => {
                        text.push('-');
                        text.push_str(name);
                    }
                    n => text.push_str(&format!("{n:+}{name}")),
                }
            }
            let t = self.translation[row];
            if t.abs() > TOLERANCE {
                text.push('+');
                text.push_str(&format_fraction(t));
            }
            if text.is_empty() {
                text.push('0');
            }
            components.push(text);
        }
        write!(f, "{}", components.join(","))
    }
}

fn format_fraction(value: f64) -> String {
    for den in [2, 3, 4, 6, 8, 12, 24, 48] {
        let num = value * den as f64;
        if (num - num.round()).abs() < TOLERANCE {
            return format!("{}/{}", num.round() as i64, den);
        }
    }
    format!("{value:.6}")
}
