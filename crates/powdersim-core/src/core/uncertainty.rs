use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum MeasuredParseError {
    #[error("Value is missing ('{0}')")]
    Missing(String),
    #[error("Invalid number '{0}'")]
    InvalidNumber(String),
    #[error("Invalid uncertainty in '{0}': expected digits enclosed in parentheses")]
    InvalidUncertainty(String),
}

/// A numeric value with an optional standard uncertainty.
///
/// Every instrumental and structural quantity in powdersim is carried as a `Measured`
/// so the uncertainty travels with the number instead of living in a side channel.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Measured {
    pub value: f64,
    pub error: Option<f64>,
}

impl Measured {
    pub const fn new(value: f64) -> Self {
        Self { value, error: None }
    }

    pub const fn with_error(value: f64, error: f64) -> Self {
        Self {
            value,
            error: Some(error),
        }
    }

    /// Parses the CIF `V(E)` notation, where the digits of `E` apply to the last digits
    /// of `V`.
    ///
    /// `"1.234(5)"` yields `(1.234, 0.005)` and `"1.23"` yields `(1.23, None)`. A value
    /// written without a decimal point takes the error `10^(number of error digits)`,
    /// so `"12(3)"` yields `(12, 10)`.
    pub fn parse(text: &str) -> Result<Self, MeasuredParseError> {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed == "?" || trimmed == "." {
            return Err(MeasuredParseError::Missing(text.to_string()));
        }

        let Some(open) = trimmed.find('(') else {
            let value = parse_number(trimmed)?;
            return Ok(Self::new(value));
        };

        let number = &trimmed[..open];
        let digits = trimmed[open + 1..]
            .strip_suffix(')')
            .ok_or_else(|| MeasuredParseError::InvalidUncertainty(text.to_string()))?;
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(MeasuredParseError::InvalidUncertainty(text.to_string()));
        }

        let value = parse_number(number)?;
        let raw_error: f64 = digits
            .parse()
            .map_err(|_| MeasuredParseError::InvalidUncertainty(text.to_string()))?;

        let (mantissa, exponent) = split_exponent(number)?;
        let error = match mantissa.split_once('.') {
            Some((_, fraction)) => scale_by_power_of_ten(raw_error, exponent - fraction.len() as i32),
            None => scale_by_power_of_ten(1.0, exponent + digits.len() as i32),
        };

        Ok(Self::with_error(value, error))
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

fn parse_number(text: &str) -> Result<f64, MeasuredParseError> {
    text.parse::<f64>()
        .map_err(|_| MeasuredParseError::InvalidNumber(text.to_string()))
}

fn split_exponent(number: &str) -> Result<(&str, i32), MeasuredParseError> {
    match number.find(['e', 'E']) {
        Some(idx) => {
            let exponent = number[idx + 1..]
                .parse::<i32>()
                .map_err(|_| MeasuredParseError::InvalidNumber(number.to_string()))?;
            Ok((&number[..idx], exponent))
        }
        None => Ok((number, 0)),
    }
}

// Dividing by an exact power of ten keeps results like 5e-3 correctly rounded.
fn scale_by_power_of_ten(value: f64, power: i32) -> f64 {
    if power >= 0 {
        value * 10f64.powi(power)
    } else {
        value / 10f64.powi(-power)
    }
}

impl FromStr for Measured {
    type Err = MeasuredParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<f64> for Measured {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for Measured {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.error {
            Some(error) => write!(f, "{} ± {}", self.value, error),
            None => write!(f, "{}", self.value),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMeasured {
    Number(f64),
    Text(String),
    Full { value: f64, error: Option<f64> },
}

impl<'de> Deserialize<'de> for Measured {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match RawMeasured::deserialize(deserializer)? {
            RawMeasured::Number(value) => Ok(Self::new(value)),
            RawMeasured::Text(text) => Self::parse(&text).map_err(serde::de::Error::custom),
            RawMeasured::Full { value, error } => Ok(Self { value, error }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-12,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn parse_applies_error_digits_to_last_decimal_places() {
        let m = Measured::parse("1.234(5)").unwrap();
        assert_close(m.value, 1.234);
        assert_close(m.error.unwrap(), 0.005);

        let m = Measured::parse("0.0123(4)").unwrap();
        assert_close(m.value, 0.0123);
        assert_close(m.error.unwrap(), 0.0004);

        let m = Measured::parse("5.4309(12)").unwrap();
        assert_close(m.error.unwrap(), 0.0012);
    }

    #[test]
    fn parse_integer_value_uses_power_of_ten_error() {
        let m = Measured::parse("12(3)").unwrap();
        assert_close(m.value, 12.0);
        assert_close(m.error.unwrap(), 10.0);
    }

    #[test]
    fn parse_without_parentheses_has_no_error() {
        let m = Measured::parse("1.23").unwrap();
        assert_close(m.value, 1.23);
        assert_eq!(m.error, None);
        assert!(!m.has_error());
    }

    #[test]
    fn parse_handles_exponent_mantissa() {
        let m = Measured::parse("1.5e-3(2)").unwrap();
        assert_close(m.value, 1.5e-3);
        assert_close(m.error.unwrap(), 2e-4);
    }

    #[test]
    fn parse_handles_negative_values_and_whitespace() {
        let m = Measured::parse("  -0.25(3) ").unwrap();
        assert_close(m.value, -0.25);
        assert_close(m.error.unwrap(), 0.03);
    }

    #[test]
    fn parse_rejects_missing_and_malformed_values() {
        assert!(matches!(
            Measured::parse("?"),
            Err(MeasuredParseError::Missing(_))
        ));
        assert!(matches!(
            Measured::parse("abc"),
            Err(MeasuredParseError::InvalidNumber(_))
        ));
        assert!(matches!(
            Measured::parse("1.2(3"),
            Err(MeasuredParseError::InvalidUncertainty(_))
        ));
        assert!(matches!(
            Measured::parse("1.2(x)"),
            Err(MeasuredParseError::InvalidUncertainty(_))
        ));
    }

    #[test]
    fn deserializes_from_number_string_and_table() {
        #[derive(Deserialize)]
        struct Holder {
            a: Measured,
            b: Measured,
            c: Measured,
        }
        let holder: Holder = toml::from_str(
            r#"
a = 1.5
b = "2.25(4)"
c = { value = 3.0, error = 0.1 }
"#,
        )
        .unwrap();
        assert_eq!(holder.a, Measured::new(1.5));
        assert_close(holder.b.value, 2.25);
        assert_close(holder.b.error.unwrap(), 0.04);
        assert_eq!(holder.c, Measured::with_error(3.0, 0.1));
    }
}
