//! Field-level type coercion and defaulting.
//!
//! [`coerce`] is the single entry point: it turns one raw input value into
//! a typed [`FieldValue`] (or "no value" for absent optional fields). It is
//! pure and total over its inputs; the raw value is never mutated.

use crate::value::{FieldType, FieldValue};
use serde_yaml::Value;
use thiserror::Error;

/// Errors raised while coercing a single field.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    /// The field is required, absent, and has no default.
    #[error("required field '{field}' has no value and no default")]
    MissingRequiredField { field: String },

    /// The raw value cannot be converted to the declared type.
    #[error("field '{field}': cannot coerce {given} to {expected}")]
    TypeCoercion {
        field: String,
        expected: FieldType,
        given: String,
    },
}

/// Result alias for coercion.
pub type Result<T> = std::result::Result<T, TransformError>;

/// Coerces one raw value against a field declaration.
///
/// - absent/empty with a default: the default is returned.
/// - absent/empty, no default, required: [`TransformError::MissingRequiredField`].
/// - absent/empty, no default, optional: `Ok(None)` (field omitted).
/// - present: converted per `value_type`.
///
/// A value counts as absent when the key is missing, the value is YAML
/// null, or it is a string that is empty after trimming.
pub fn coerce(
    field: &str,
    raw: Option<&Value>,
    value_type: FieldType,
    default: Option<&FieldValue>,
    required: bool,
) -> Result<Option<FieldValue>> {
    if is_absent(raw) {
        if let Some(default) = default {
            return Ok(Some(default.clone()));
        }
        if required {
            return Err(TransformError::MissingRequiredField {
                field: field.to_owned(),
            });
        }
        return Ok(None);
    }
    // is_absent returned false, so raw is Some.
    convert(field, raw.unwrap_or(&Value::Null), value_type).map(Some)
}

/// Converts a present raw value to the declared type.
pub fn convert(field: &str, raw: &Value, value_type: FieldType) -> Result<FieldValue> {
    let mismatch = || TransformError::TypeCoercion {
        field: field.to_owned(),
        expected: value_type,
        given: describe(raw),
    };

    match value_type {
        FieldType::String => match raw {
            Value::String(s) => Ok(FieldValue::Text(s.clone())),
            Value::Number(n) => Ok(FieldValue::Text(n.to_string())),
            Value::Bool(b) => Ok(FieldValue::Text(b.to_string())),
            _ => Err(mismatch()),
        },
        FieldType::Integer => match raw {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(FieldValue::Integer(i))
                } else {
                    // Whole-valued floats are accepted; 5.5 is not an integer.
                    match n.as_f64() {
                        Some(f) if f.fract() == 0.0 => Ok(FieldValue::Integer(f as i64)),
                        _ => Err(mismatch()),
                    }
                }
            }
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|_| mismatch()),
            _ => Err(mismatch()),
        },
        FieldType::Float => match raw {
            Value::Number(n) => n.as_f64().map(FieldValue::Float).ok_or_else(mismatch),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(FieldValue::Float)
                .map_err(|_| mismatch()),
            _ => Err(mismatch()),
        },
        FieldType::Boolean => match raw {
            Value::Bool(b) => Ok(FieldValue::Boolean(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Ok(FieldValue::Boolean(false)),
                Some(1) => Ok(FieldValue::Boolean(true)),
                _ => Err(mismatch()),
            },
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(FieldValue::Boolean(true)),
                "false" | "no" | "0" => Ok(FieldValue::Boolean(false)),
                _ => Err(mismatch()),
            },
            _ => Err(mismatch()),
        },
    }
}

/// Returns `true` when the raw value counts as absent.
fn is_absent(raw: Option<&Value>) -> bool {
    match raw {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// Short description of a raw value for error messages.
fn describe(raw: &Value) -> String {
    match raw {
        Value::String(s) => format!("text '{s}'"),
        Value::Number(n) => format!("number {n}"),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Sequence(_) => "a sequence".to_owned(),
        Value::Mapping(_) => "a mapping".to_owned(),
        Value::Null => "null".to_owned(),
        Value::Tagged(_) => "a tagged value".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> Value {
        Value::from(s)
    }

    #[test]
    fn absent_with_default_returns_default() {
        let default = FieldValue::Text("Development".into());
        let out = coerce("Activity", None, FieldType::String, Some(&default), true).unwrap();
        assert_eq!(out, Some(default));
    }

    #[test]
    fn absent_required_without_default_fails() {
        let err = coerce("Title", None, FieldType::String, None, true).unwrap_err();
        assert_eq!(
            err,
            TransformError::MissingRequiredField {
                field: "Title".into()
            }
        );
    }

    #[test]
    fn absent_optional_is_no_value() {
        assert_eq!(
            coerce("Tags", None, FieldType::String, None, false).unwrap(),
            None
        );
    }

    #[test]
    fn empty_and_null_count_as_absent() {
        for raw in [Value::Null, text(""), text("   ")] {
            assert_eq!(
                coerce("Tags", Some(&raw), FieldType::String, None, false).unwrap(),
                None
            );
        }
    }

    #[test]
    fn numeric_text_parses() {
        let raw = text("5");
        assert_eq!(
            coerce("Points", Some(&raw), FieldType::Float, None, false).unwrap(),
            Some(FieldValue::Float(5.0))
        );
        let raw = text("42");
        assert_eq!(
            coerce("Count", Some(&raw), FieldType::Integer, None, false).unwrap(),
            Some(FieldValue::Integer(42))
        );
    }

    #[test]
    fn non_numeric_text_fails() {
        let raw = text("lots");
        let err = coerce("Points", Some(&raw), FieldType::Float, None, false).unwrap_err();
        assert!(matches!(err, TransformError::TypeCoercion { .. }));
    }

    #[test]
    fn fractional_value_is_not_an_integer() {
        let raw = text("5.5");
        assert!(coerce("Count", Some(&raw), FieldType::Integer, None, false).is_err());
        let raw: Value = serde_yaml::from_str("5.0").unwrap();
        assert_eq!(
            coerce("Count", Some(&raw), FieldType::Integer, None, false).unwrap(),
            Some(FieldValue::Integer(5))
        );
    }

    #[test]
    fn numeric_coercion_is_idempotent() {
        // Coercing an already-correct native value changes nothing.
        let raw: Value = serde_yaml::from_str("3.5").unwrap();
        let once = convert("X", &raw, FieldType::Float).unwrap();
        let again = convert("X", &Value::from(3.5), FieldType::Float).unwrap();
        assert_eq!(once, again);
    }

    #[test]
    fn boolean_word_forms() {
        for (s, expected) in [
            ("Yes", true),
            ("no", false),
            ("TRUE", true),
            ("false", false),
            ("1", true),
            ("0", false),
        ] {
            let raw = text(s);
            assert_eq!(
                coerce("Flag", Some(&raw), FieldType::Boolean, None, false).unwrap(),
                Some(FieldValue::Boolean(expected)),
                "input {s:?}"
            );
        }
    }

    #[test]
    fn boolean_rejects_maybe() {
        let raw = text("maybe");
        let err = coerce("Flag", Some(&raw), FieldType::Boolean, None, false).unwrap_err();
        assert!(matches!(err, TransformError::TypeCoercion { .. }));
    }

    #[test]
    fn native_scalars_stringify_for_string_fields() {
        let raw: Value = serde_yaml::from_str("7").unwrap();
        assert_eq!(
            convert("Label", &raw, FieldType::String).unwrap(),
            FieldValue::Text("7".into())
        );
    }

    #[test]
    fn collections_never_coerce() {
        let raw: Value = serde_yaml::from_str("[1, 2]").unwrap();
        assert!(convert("X", &raw, FieldType::String).is_err());
        assert!(convert("X", &raw, FieldType::Integer).is_err());
    }
}
