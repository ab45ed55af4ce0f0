//! Field value types shared by templates, payloads, and coercion.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Declared type of a template field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FieldType {
    /// Free text, passed through unchanged.
    #[default]
    String,
    Integer,
    Float,
    Boolean,
}

impl FieldType {
    /// Returns the string representation used in template files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
        }
    }

    /// Parses a template type name. Returns `None` for unknown names.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "string" => Some(Self::String),
            "integer" => Some(Self::Integer),
            "float" => Some(Self::Float),
            "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "unknown field type '{s}' (expected string, integer, float, or boolean)"
            ))
        })
    }
}

/// A coerced, typed field value ready for submission.
///
/// Serializes to the corresponding JSON scalar (`"x"`, `5`, `5.0`, `true`),
/// which is what the work item API expects in patch operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// Returns the [`FieldType`] this value belongs to.
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Text(_) => FieldType::String,
            Self::Integer(_) => FieldType::Integer,
            Self::Float(_) => FieldType::Float,
            Self::Boolean(_) => FieldType::Boolean,
        }
    }

    /// Returns the inner text when this is a `Text` value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Converts to a `serde_json::Value` scalar.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Integer(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Value::from(*f),
            Self::Boolean(b) => serde_json::Value::Bool(*b),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for FieldValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn field_type_roundtrip() {
        for t in [
            FieldType::String,
            FieldType::Integer,
            FieldType::Float,
            FieldType::Boolean,
        ] {
            assert_eq!(FieldType::parse(t.as_str()), Some(t));
        }
        assert_eq!(FieldType::parse("decimal"), None);
    }

    #[test]
    fn field_type_deserialize_rejects_unknown() {
        let err = serde_yaml::from_str::<FieldType>("decimal").unwrap_err();
        assert!(err.to_string().contains("unknown field type"));
    }

    #[test]
    fn value_serializes_as_scalar() {
        assert_eq!(
            serde_json::to_string(&FieldValue::Float(5.0)).unwrap(),
            "5.0"
        );
        assert_eq!(
            serde_json::to_string(&FieldValue::Text("x".into())).unwrap(),
            r#""x""#
        );
        assert_eq!(
            serde_json::to_string(&FieldValue::Boolean(true)).unwrap(),
            "true"
        );
    }

    #[test]
    fn value_reports_its_type() {
        assert_eq!(FieldValue::Integer(3).field_type(), FieldType::Integer);
        assert_eq!(FieldValue::from("a").field_type(), FieldType::String);
    }
}
