//! Row projection: opaque driver rows into the canonical JSON record shape.
//!
//! Drops the surrogate key, re-keys the ULID column as `"id"`, normalizes
//! booleans from their dialect-native representations, and coerces byte
//! blobs to strings.

use chrono::{DateTime, NaiveDateTime, Utc};
use moonbase_core::types::{Collection, ColumnType};
use moonbase_sql::{normalize_boolean, SqlRow, SqlScalar};
use serde_json::{Map, Value};

/// Projects one row into the JSON record returned to clients.
///
/// Columns the schema does not know (beyond `id`/`pkid`) are skipped, which
/// makes projection safe across the logical/physical drift window of a
/// partially failed schema update.
pub fn project_record(collection: &Collection, row: &SqlRow) -> Map<String, Value> {
    let mut record = Map::with_capacity(row.columns.len());
    for (name, scalar) in row.iter() {
        if name == "pkid" {
            continue;
        }
        if name == "id" {
            record.insert("id".to_string(), scalar_to_text(scalar));
            continue;
        }
        let Some(column) = collection.column(name) else {
            continue;
        };
        record.insert(
            name.to_string(),
            project_scalar(scalar, column.column_type),
        );
    }
    record
}

/// Projects every row of a result set.
pub fn project_rows(collection: &Collection, rows: &[SqlRow]) -> Vec<Map<String, Value>> {
    rows.iter().map(|r| project_record(collection, r)).collect()
}

/// Extracts the `id` of a projected-or-raw row.
pub fn row_id(row: &SqlRow) -> Option<String> {
    match row.get("id") {
        Some(SqlScalar::Text(s)) => Some(s.clone()),
        Some(SqlScalar::Bytes(b)) => Some(String::from_utf8_lossy(b).into_owned()),
        _ => None,
    }
}

/// Reads a COUNT(*) scalar from whatever shape the driver produced.
pub fn scalar_count(row: &SqlRow) -> u64 {
    match row.values.first() {
        Some(SqlScalar::Int(n)) => u64::try_from(*n).unwrap_or(0),
        Some(SqlScalar::Float(f)) => *f as u64,
        Some(SqlScalar::Text(s)) => s.parse().unwrap_or(0),
        _ => 0,
    }
}

fn project_scalar(scalar: &SqlScalar, column_type: ColumnType) -> Value {
    if matches!(scalar, SqlScalar::Null) {
        return Value::Null;
    }
    match column_type {
        ColumnType::String | ColumnType::Json => scalar_to_text(scalar),
        ColumnType::Integer => match scalar {
            SqlScalar::Int(n) => Value::Number((*n).into()),
            SqlScalar::Float(f) => Value::Number((*f as i64).into()),
            SqlScalar::Text(s) => s
                .parse::<i64>()
                .map(|n| Value::Number(n.into()))
                .unwrap_or(Value::Null),
            SqlScalar::Bool(b) => Value::Number(i64::from(*b).into()),
            _ => Value::Null,
        },
        // Decimals stay textual so values round trip exactly.
        ColumnType::Decimal => match scalar {
            SqlScalar::Text(s) => Value::String(s.clone()),
            SqlScalar::Int(n) => Value::String(n.to_string()),
            SqlScalar::Float(f) => Value::String(f.to_string()),
            SqlScalar::Bytes(b) => Value::String(String::from_utf8_lossy(b).into_owned()),
            _ => Value::Null,
        },
        ColumnType::Boolean => match normalize_boolean(scalar) {
            Some(b) => Value::Bool(b),
            None => Value::Null,
        },
        ColumnType::DateTime => match scalar {
            SqlScalar::Text(s) => Value::String(canonicalize_datetime(s)),
            SqlScalar::Int(n) => Value::String(n.to_string()),
            _ => Value::Null,
        },
    }
}

fn scalar_to_text(scalar: &SqlScalar) -> Value {
    match scalar {
        SqlScalar::Text(s) => Value::String(s.clone()),
        SqlScalar::Bytes(b) => Value::String(String::from_utf8_lossy(b).into_owned()),
        SqlScalar::Int(n) => Value::String(n.to_string()),
        SqlScalar::Float(f) => Value::String(f.to_string()),
        SqlScalar::Bool(b) => Value::String(b.to_string()),
        SqlScalar::Null => Value::Null,
    }
}

/// Renders stored datetimes as RFC 3339 regardless of how the dialect
/// formats them on the way out.
fn canonicalize_datetime(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Utc).to_rfc3339();
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc).to_rfc3339();
        }
    }
    raw.to_string()
}
