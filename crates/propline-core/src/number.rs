// Numeric coercion for projection values.

use serde::{Serialize, Serializer};
use std::fmt;

/// A coerced projection number. Integers stay integers so that counts like
/// carries or targets render without a trailing `.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatValue {
    Int(i64),
    Float(f64),
}

impl StatValue {
    pub fn as_f64(self) -> f64 {
        match self {
            StatValue::Int(v) => v as f64,
            StatValue::Float(v) => v,
        }
    }
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatValue::Int(v) => write!(f, "{v}"),
            StatValue::Float(v) => write!(f, "{v:?}"),
        }
    }
}

impl Serialize for StatValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            StatValue::Int(v) => serializer.serialize_i64(v),
            StatValue::Float(v) => serializer.serialize_f64(v),
        }
    }
}

/// Integer first, then float, else `None`. Surrounding whitespace is ignored
/// and non-finite spellings ("NaN", "inf") are rejected.
pub fn coerce(text: &str) -> Option<StatValue> {
    let text = text.trim();
    if let Ok(v) = text.parse::<i64>() {
        return Some(StatValue::Int(v));
    }
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(StatValue::Float(v)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_text_yields_int() {
        assert_eq!(coerce("12"), Some(StatValue::Int(12)));
        assert_eq!(coerce(" -3 "), Some(StatValue::Int(-3)));
    }

    #[test]
    fn decimal_text_yields_float() {
        assert_eq!(coerce("12.5"), Some(StatValue::Float(12.5)));
        assert_eq!(coerce(".5"), Some(StatValue::Float(0.5)));
    }

    #[test]
    fn garbage_yields_none() {
        assert_eq!(coerce("abc"), None);
        assert_eq!(coerce(""), None);
        assert_eq!(coerce("1.2.3"), None);
    }

    #[test]
    fn non_finite_rejected() {
        assert_eq!(coerce("NaN"), None);
        assert_eq!(coerce("inf"), None);
        assert_eq!(coerce("-infinity"), None);
    }

    #[test]
    fn display_keeps_float_marker() {
        assert_eq!(StatValue::Int(55).to_string(), "55");
        assert_eq!(StatValue::Float(55.0).to_string(), "55.0");
        assert_eq!(StatValue::Float(12.3).to_string(), "12.3");
    }
}
