use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::variant::ProtocolVariant;

/// A data-group value after typing.
///
/// Serialized untagged: integers as JSON numbers, text as JSON strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypedValue {
    Integer(i64),
    Text(String),
}

impl TypedValue {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("value {value:?} of numeric label {label} is not an integer")]
    NotAnInteger { label: String, value: String },
}

/// Type a raw value, failing when a numeric label holds non-numeric text.
pub fn try_type_value(
    label: &str,
    raw_value: &str,
    variant: ProtocolVariant,
) -> Result<TypedValue, ValueError> {
    if variant.is_textual(label) {
        return Ok(TypedValue::Text(raw_value.to_string()));
    }
    raw_value
        .trim()
        .parse::<i64>()
        .map(TypedValue::Integer)
        .map_err(|_| ValueError::NotAnInteger {
            label: label.to_string(),
            value: raw_value.to_string(),
        })
}

/// Type a raw value; numeric labels that fail to parse become `0`.
///
/// # Examples
/// ```
/// use teleinfo_core::protocols::value::{TypedValue, type_value};
/// use teleinfo_core::protocols::variant::ProtocolVariant;
///
/// let base = type_value("BASE", "123456789", ProtocolVariant::Historical);
/// assert_eq!(base, TypedValue::Integer(123456789));
/// let ptec = type_value("PTEC", "TH..", ProtocolVariant::Historical);
/// assert_eq!(ptec, TypedValue::Text("TH..".to_string()));
/// ```
pub fn type_value(label: &str, raw_value: &str, variant: ProtocolVariant) -> TypedValue {
    try_type_value(label, raw_value, variant).unwrap_or(TypedValue::Integer(0))
}

#[cfg(test)]
mod tests {
    use super::{TypedValue, ValueError, try_type_value, type_value};
    use crate::protocols::variant::ProtocolVariant;

    #[test]
    fn numeric_labels_drop_leading_zeros() {
        assert_eq!(
            type_value("IINST", "005", ProtocolVariant::Historical),
            TypedValue::Integer(5)
        );
        assert_eq!(
            type_value("EASF02", "000762043", ProtocolVariant::Standard),
            TypedValue::Integer(762043)
        );
    }

    #[test]
    fn textual_labels_keep_raw_value() {
        assert_eq!(
            type_value("EASD02", "000361497", ProtocolVariant::Standard),
            TypedValue::Text("000361497".to_string())
        );
        assert_eq!(
            type_value("LTARF", "   HP MERCREDI  ", ProtocolVariant::Standard),
            TypedValue::Text("   HP MERCREDI  ".to_string())
        );
    }

    #[test]
    fn conversion_failure_falls_back_to_zero() {
        assert_eq!(
            type_value("PAPP", "0X289", ProtocolVariant::Historical),
            TypedValue::Integer(0)
        );
        let err = try_type_value("PAPP", "0X289", ProtocolVariant::Historical).unwrap_err();
        assert_eq!(
            err,
            ValueError::NotAnInteger {
                label: "PAPP".to_string(),
                value: "0X289".to_string(),
            }
        );
    }

    #[test]
    fn overflow_is_a_conversion_failure() {
        let raw = "99999999999999999999";
        assert!(try_type_value("EAST", raw, ProtocolVariant::Standard).is_err());
        assert_eq!(
            type_value("EAST", raw, ProtocolVariant::Standard),
            TypedValue::Integer(0)
        );
    }

    #[test]
    fn typing_is_pure() {
        let inputs = [
            ("BASE", "123456789"),
            ("PTEC", "HP.."),
            ("PAPP", "garbage"),
            ("MOTDETAT", "000000"),
        ];
        for (label, raw) in inputs {
            let first = type_value(label, raw, ProtocolVariant::Historical);
            let second = type_value(label, raw, ProtocolVariant::Historical);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn serializes_untagged() {
        let json = serde_json::to_string(&vec![
            TypedValue::Integer(4),
            TypedValue::Text("HC..".to_string()),
        ])
        .unwrap();
        assert_eq!(json, r#"[4,"HC.."]"#);
    }
}
