use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::column_type::ColumnType;

/// A canonical field value: the JSON-facing type model every dialect's
/// native values are coerced into.
///
/// Decimals and JSON documents travel as strings end-to-end so round trips
/// are exact regardless of the underlying store.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Text(String),
    Integer(i64),
    Decimal(String),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    Json(String),
}

/// Errors from coercing client input into a [`FieldValue`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValueError {
    /// The JSON value's type does not match the declared column type.
    TypeMismatch {
        expected: String,
        actual: String,
    },
    /// Decimal string did not match the numeric pattern.
    InvalidDecimal { value: String },
    /// Datetime string was not RFC 3339.
    InvalidDateTime { value: String, reason: String },
    /// JSON column payload was a string that is not valid JSON.
    InvalidJson { reason: String },
    /// An integer arrived as a float or out of the i64 range.
    NotAnInteger { value: String },
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeMismatch { expected, actual } => {
                write!(f, "expected {expected}, got {actual}")
            }
            Self::InvalidDecimal { value } => {
                write!(f, "invalid decimal '{value}': expected digits with an optional fraction")
            }
            Self::InvalidDateTime { value, reason } => {
                write!(f, "invalid datetime '{value}': {reason}")
            }
            Self::InvalidJson { reason } => write!(f, "invalid json payload: {reason}"),
            Self::NotAnInteger { value } => {
                write!(f, "expected integer, got '{value}'")
            }
        }
    }
}

impl std::error::Error for ValueError {}

impl FieldValue {
    /// Coerces a JSON value into the canonical value for a declared column
    /// type. Strict: strings are not accepted for numeric or boolean
    /// columns, and floats are not accepted for integer columns.
    pub fn from_json(value: &Value, column_type: ColumnType) -> Result<Self, ValueError> {
        if value.is_null() {
            return Ok(Self::Null);
        }
        match column_type {
            ColumnType::String => match value {
                Value::String(s) => Ok(Self::Text(s.clone())),
                other => Err(mismatch("string", other)),
            },
            ColumnType::Integer => match value {
                Value::Number(n) => n
                    .as_i64()
                    .map(Self::Integer)
                    .ok_or_else(|| ValueError::NotAnInteger {
                        value: n.to_string(),
                    }),
                other => Err(mismatch("integer", other)),
            },
            ColumnType::Decimal => match value {
                Value::Number(n) => Ok(Self::Decimal(n.to_string())),
                Value::String(s) => parse_decimal(s).map(Self::Decimal),
                other => Err(mismatch("decimal", other)),
            },
            ColumnType::Boolean => match value {
                Value::Bool(b) => Ok(Self::Boolean(*b)),
                other => Err(mismatch("boolean", other)),
            },
            ColumnType::DateTime => match value {
                Value::String(s) => parse_datetime(s).map(Self::DateTime),
                other => Err(mismatch("datetime", other)),
            },
            ColumnType::Json => match value {
                Value::String(s) => {
                    serde_json::from_str::<Value>(s).map_err(|e| ValueError::InvalidJson {
                        reason: e.to_string(),
                    })?;
                    Ok(Self::Json(s.clone()))
                }
                other => Ok(Self::Json(other.to_string())),
            },
        }
    }

    /// Coerces a raw query-string value for a declared column type.
    ///
    /// Query parameters are untyped text, so numeric and boolean values are
    /// parsed from their string spellings here, unlike [`Self::from_json`].
    pub fn from_query_str(raw: &str, column_type: ColumnType) -> Result<Self, ValueError> {
        match column_type {
            ColumnType::String => Ok(Self::Text(raw.to_string())),
            ColumnType::Integer => raw
                .parse::<i64>()
                .map(Self::Integer)
                .map_err(|_| ValueError::NotAnInteger {
                    value: raw.to_string(),
                }),
            ColumnType::Decimal => parse_decimal(raw).map(Self::Decimal),
            ColumnType::Boolean => match raw {
                "true" | "1" => Ok(Self::Boolean(true)),
                "false" | "0" => Ok(Self::Boolean(false)),
                other => Err(ValueError::TypeMismatch {
                    expected: "boolean".into(),
                    actual: format!("'{other}'"),
                }),
            },
            ColumnType::DateTime => parse_datetime(raw).map(Self::DateTime),
            ColumnType::Json => Ok(Self::Json(raw.to_string())),
        }
    }

    /// Converts back to the JSON representation returned to clients.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Text(s) => Value::String(s.clone()),
            Self::Integer(i) => Value::Number((*i).into()),
            Self::Decimal(s) => Value::String(s.clone()),
            Self::Boolean(b) => Value::Bool(*b),
            Self::DateTime(dt) => Value::String(dt.to_rfc3339()),
            Self::Json(s) => Value::String(s.clone()),
        }
    }

    /// Returns true when the value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

fn mismatch(expected: &str, actual: &Value) -> ValueError {
    ValueError::TypeMismatch {
        expected: expected.to_string(),
        actual: json_type_name(actual).to_string(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Validates a decimal string: optional sign, digits, optional fraction.
pub fn parse_decimal(s: &str) -> Result<String, ValueError> {
    let body = s.strip_prefix('-').unwrap_or(s);
    let mut parts = body.splitn(2, '.');
    let int_part = parts.next().unwrap_or("");
    let frac_part = parts.next();
    let digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
    let ok = digits(int_part) && frac_part.map_or(true, digits);
    if ok {
        Ok(s.to_string())
    } else {
        Err(ValueError::InvalidDecimal {
            value: s.to_string(),
        })
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, ValueError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ValueError::InvalidDateTime {
            value: s.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_accepts_only_strings() {
        let v = FieldValue::from_json(&json!("hello"), ColumnType::String).unwrap();
        assert_eq!(v, FieldValue::Text("hello".into()));
        assert!(FieldValue::from_json(&json!(42), ColumnType::String).is_err());
        assert!(FieldValue::from_json(&json!(true), ColumnType::String).is_err());
    }

    #[test]
    fn integer_rejects_strings_and_floats() {
        let v = FieldValue::from_json(&json!(42), ColumnType::Integer).unwrap();
        assert_eq!(v, FieldValue::Integer(42));
        assert!(FieldValue::from_json(&json!("nope"), ColumnType::Integer).is_err());
        assert!(FieldValue::from_json(&json!(1.5), ColumnType::Integer).is_err());
    }

    #[test]
    fn decimal_accepts_numbers_and_numeric_strings() {
        let v = FieldValue::from_json(&json!(1.25), ColumnType::Decimal).unwrap();
        assert_eq!(v, FieldValue::Decimal("1.25".into()));
        let v = FieldValue::from_json(&json!("10.50"), ColumnType::Decimal).unwrap();
        assert_eq!(v, FieldValue::Decimal("10.50".into()));
        let v = FieldValue::from_json(&json!("-3"), ColumnType::Decimal).unwrap();
        assert_eq!(v, FieldValue::Decimal("-3".into()));
        assert!(FieldValue::from_json(&json!("ten"), ColumnType::Decimal).is_err());
        assert!(FieldValue::from_json(&json!("1."), ColumnType::Decimal).is_err());
        assert!(FieldValue::from_json(&json!(".5"), ColumnType::Decimal).is_err());
    }

    #[test]
    fn boolean_accepts_only_bools() {
        let v = FieldValue::from_json(&json!(true), ColumnType::Boolean).unwrap();
        assert_eq!(v, FieldValue::Boolean(true));
        assert!(FieldValue::from_json(&json!(1), ColumnType::Boolean).is_err());
        assert!(FieldValue::from_json(&json!("true"), ColumnType::Boolean).is_err());
    }

    #[test]
    fn datetime_parses_rfc3339() {
        let v = FieldValue::from_json(&json!("2024-01-15T10:30:00Z"), ColumnType::DateTime).unwrap();
        assert!(matches!(v, FieldValue::DateTime(_)));
        assert!(FieldValue::from_json(&json!("yesterday"), ColumnType::DateTime).is_err());
    }

    #[test]
    fn json_column_keeps_strings_and_serializes_values() {
        let v = FieldValue::from_json(&json!("{\"a\": 1}"), ColumnType::Json).unwrap();
        assert_eq!(v, FieldValue::Json("{\"a\": 1}".into()));
        let v = FieldValue::from_json(&json!({"a": 1}), ColumnType::Json).unwrap();
        assert_eq!(v, FieldValue::Json("{\"a\":1}".into()));
        assert!(FieldValue::from_json(&json!("{not json"), ColumnType::Json).is_err());
    }

    #[test]
    fn null_is_accepted_for_every_type() {
        for ty in ColumnType::ALL {
            let v = FieldValue::from_json(&Value::Null, *ty).unwrap();
            assert!(v.is_null());
        }
    }

    #[test]
    fn query_str_coercion() {
        assert_eq!(
            FieldValue::from_query_str("42", ColumnType::Integer).unwrap(),
            FieldValue::Integer(42)
        );
        assert_eq!(
            FieldValue::from_query_str("1", ColumnType::Boolean).unwrap(),
            FieldValue::Boolean(true)
        );
        assert_eq!(
            FieldValue::from_query_str("false", ColumnType::Boolean).unwrap(),
            FieldValue::Boolean(false)
        );
        assert!(FieldValue::from_query_str("abc", ColumnType::Integer).is_err());
        assert!(FieldValue::from_query_str("maybe", ColumnType::Boolean).is_err());
    }

    #[test]
    fn to_json_roundtrip_shapes() {
        assert_eq!(FieldValue::Null.to_json(), Value::Null);
        assert_eq!(FieldValue::Integer(7).to_json(), json!(7));
        assert_eq!(FieldValue::Boolean(false).to_json(), json!(false));
        assert_eq!(
            FieldValue::Decimal("0.00".into()).to_json(),
            json!("0.00")
        );
        assert_eq!(
            FieldValue::Json("{}".into()).to_json(),
            json!("{}")
        );
    }

    #[test]
    fn mismatch_error_names_both_types() {
        let err = FieldValue::from_json(&json!([1]), ColumnType::String).unwrap_err();
        assert_eq!(err.to_string(), "expected string, got array");
    }
}
