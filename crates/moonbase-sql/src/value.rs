use chrono::{DateTime, Utc};
use moonbase_core::types::FieldValue;

// ---------------------------------------------------------------------------
// SqlParam
// ---------------------------------------------------------------------------

/// A value bound to a statement placeholder.
///
/// Decimals travel as their textual form; datetimes keep the parsed instant
/// so each driver can format them the way its dialect expects.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Null,
    Text(String),
    Int(i64),
    Bool(bool),
    Decimal(String),
    DateTime(DateTime<Utc>),
}

impl From<&FieldValue> for SqlParam {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Null => Self::Null,
            FieldValue::Text(s) => Self::Text(s.clone()),
            FieldValue::Integer(i) => Self::Int(*i),
            FieldValue::Decimal(s) => Self::Decimal(s.clone()),
            FieldValue::Boolean(b) => Self::Bool(*b),
            FieldValue::DateTime(dt) => Self::DateTime(*dt),
            FieldValue::Json(s) => Self::Text(s.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// SqlScalar / SqlRow
// ---------------------------------------------------------------------------

/// A single value as decoded from a driver row, before projection into the
/// canonical JSON type model.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlScalar {
    Null,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Bytes(Vec<u8>),
}

/// An opaque row handed back by a driver: column names paired with scalars.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SqlRow {
    pub columns: Vec<String>,
    pub values: Vec<SqlScalar>,
}

impl SqlRow {
    /// Builds a row from (name, value) pairs.
    pub fn from_pairs(pairs: Vec<(String, SqlScalar)>) -> Self {
        let (columns, values) = pairs.into_iter().unzip();
        Self { columns, values }
    }

    /// Returns the scalar for a column name, if present.
    pub fn get(&self, name: &str) -> Option<&SqlScalar> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|i| &self.values[i])
    }

    /// Iterates (name, value) pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlScalar)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

// ---------------------------------------------------------------------------
// Coercions
// ---------------------------------------------------------------------------

/// Normalizes a dialect-native boolean representation.
///
/// Stores hand booleans back as integers (SQLite, MySQL TINYINT), native
/// booleans (Postgres), or strings on some driver paths; all of them map
/// to a plain true/false here. Returns `None` for values with no boolean
/// reading.
pub fn normalize_boolean(scalar: &SqlScalar) -> Option<bool> {
    match scalar {
        SqlScalar::Bool(b) => Some(*b),
        SqlScalar::Int(0) => Some(false),
        SqlScalar::Int(1) => Some(true),
        SqlScalar::Float(f) if *f == 0.0 => Some(false),
        SqlScalar::Float(f) if *f == 1.0 => Some(true),
        SqlScalar::Text(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "t" | "1" | "yes" | "on" => Some(true),
            "false" | "f" | "0" | "no" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Escapes LIKE wildcards (`%`, `_`) and the escape character itself.
pub fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_value_to_param() {
        assert_eq!(SqlParam::from(&FieldValue::Null), SqlParam::Null);
        assert_eq!(
            SqlParam::from(&FieldValue::Text("x".into())),
            SqlParam::Text("x".into())
        );
        assert_eq!(SqlParam::from(&FieldValue::Integer(5)), SqlParam::Int(5));
        assert_eq!(
            SqlParam::from(&FieldValue::Decimal("1.50".into())),
            SqlParam::Decimal("1.50".into())
        );
        assert_eq!(
            SqlParam::from(&FieldValue::Boolean(true)),
            SqlParam::Bool(true)
        );
        assert_eq!(
            SqlParam::from(&FieldValue::Json("{}".into())),
            SqlParam::Text("{}".into())
        );
    }

    #[test]
    fn row_lookup() {
        let row = SqlRow::from_pairs(vec![
            ("id".into(), SqlScalar::Text("abc".into())),
            ("age".into(), SqlScalar::Int(30)),
        ]);
        assert_eq!(row.get("age"), Some(&SqlScalar::Int(30)));
        assert_eq!(row.get("missing"), None);
        let names: Vec<&str> = row.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["id", "age"]);
    }

    #[test]
    fn boolean_normalization_paths() {
        assert_eq!(normalize_boolean(&SqlScalar::Bool(true)), Some(true));
        assert_eq!(normalize_boolean(&SqlScalar::Int(0)), Some(false));
        assert_eq!(normalize_boolean(&SqlScalar::Int(1)), Some(true));
        assert_eq!(normalize_boolean(&SqlScalar::Int(2)), None);
        assert_eq!(
            normalize_boolean(&SqlScalar::Text("true".into())),
            Some(true)
        );
        assert_eq!(normalize_boolean(&SqlScalar::Text("T".into())), Some(true));
        assert_eq!(
            normalize_boolean(&SqlScalar::Text("f".into())),
            Some(false)
        );
        assert_eq!(normalize_boolean(&SqlScalar::Text("maybe".into())), None);
        assert_eq!(normalize_boolean(&SqlScalar::Float(1.0)), Some(true));
        assert_eq!(normalize_boolean(&SqlScalar::Null), None);
    }

    #[test]
    fn like_escaping() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("50%"), "50\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }
}
