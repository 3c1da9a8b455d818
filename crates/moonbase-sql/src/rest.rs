//! Parsing REST query-string parameters into the typed query IR.
//!
//! Reserved keys (`limit`, `after`, `sort`, `q`, `fields`, `atomic`) have
//! fixed meanings; every other key is a `col[op]=value` filter whose column
//! must exist in the collection schema.

use std::collections::HashMap;
use std::fmt;

use moonbase_core::error::LimitError;
use moonbase_core::limits::{Limits, DEFAULT_PAGE_SIZE};
use moonbase_core::types::{Collection, ColumnName, FieldValue, RecordId};

use crate::query::{validate_limit, ColumnRef, Filter, FilterOp, ListQuery, SortOrder};

/// Query keys that are never filter columns.
const RESERVED_PARAMS: &[&str] = &["limit", "after", "sort", "q", "fields", "atomic"];

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from translating raw query parameters into a [`ListQuery`].
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum QueryParseError {
    InvalidLimit { message: String },
    InvalidCursor { value: String },
    UnknownSortField { name: String },
    UnknownFilterColumn { name: String },
    UnknownProjectionField { name: String },
    UnknownFilterOp { column: String, op: String },
    BadFilterValue { column: String, reason: String },
    MalformedKey { key: String },
    Limit(LimitError),
}

impl fmt::Display for QueryParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLimit { message } => write!(f, "invalid limit: {message}"),
            Self::InvalidCursor { value } => {
                write!(f, "invalid cursor '{value}': expected a record id")
            }
            Self::UnknownSortField { name } => {
                write!(f, "unknown sort field '{name}'")
            }
            Self::UnknownFilterColumn { name } => {
                write!(f, "unknown filter column '{name}'")
            }
            Self::UnknownProjectionField { name } => {
                write!(f, "unknown field '{name}' in projection")
            }
            Self::UnknownFilterOp { column, op } => {
                write!(
                    f,
                    "unknown filter operator '{op}' on column '{column}': expected eq, ne, gt, lt, gte, lte, like, or in"
                )
            }
            Self::BadFilterValue { column, reason } => {
                write!(f, "bad filter value for column '{column}': {reason}")
            }
            Self::MalformedKey { key } => {
                write!(f, "malformed query parameter '{key}'")
            }
            Self::Limit(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for QueryParseError {}

impl From<LimitError> for QueryParseError {
    fn from(e: LimitError) -> Self {
        Self::Limit(e)
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parses the full parameter map of a list request.
pub fn parse_list_params(
    params: &HashMap<String, String>,
    collection: &Collection,
    limits: &Limits,
) -> Result<ListQuery, QueryParseError> {
    let limit = match params.get("limit") {
        Some(raw) => {
            let parsed: u32 = raw.parse().map_err(|_| QueryParseError::InvalidLimit {
                message: format!("'{raw}' is not a number"),
            })?;
            validate_limit(parsed).map_err(|message| QueryParseError::InvalidLimit { message })?
        }
        None => DEFAULT_PAGE_SIZE,
    };

    let after = match params.get("after") {
        Some(raw) => Some(RecordId::parse(raw).map_err(|_| QueryParseError::InvalidCursor {
            value: raw.clone(),
        })?),
        None => None,
    };

    let sort = match params.get("sort") {
        Some(raw) => parse_sort(raw, collection, limits)?,
        None => Vec::new(),
    };

    let search = params
        .get("q")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let fields = match params.get("fields") {
        Some(raw) => Some(parse_fields(raw, collection)?),
        None => None,
    };

    let filters = parse_filters(params, collection, limits)?;

    tracing::trace!(
        collection = %collection.name,
        limit,
        filters = filters.len(),
        "parsed list query"
    );
    Ok(ListQuery {
        limit,
        after,
        sort,
        search,
        filters,
        fields,
    })
}

/// Parses `f1,-f2,+f3` into sort clauses. Each field must be a user column
/// or the literal `id`.
pub fn parse_sort(
    raw: &str,
    collection: &Collection,
    limits: &Limits,
) -> Result<Vec<(ColumnRef, SortOrder)>, QueryParseError> {
    let mut sort = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (name, order) = if let Some(stripped) = part.strip_prefix('-') {
            (stripped, SortOrder::Desc)
        } else if let Some(stripped) = part.strip_prefix('+') {
            (stripped, SortOrder::Asc)
        } else {
            (part, SortOrder::Asc)
        };
        let column = resolve_column_ref(name, collection)
            .ok_or_else(|| QueryParseError::UnknownSortField {
                name: name.to_string(),
            })?;
        sort.push((column, order));
    }
    limits.check_sort_field_count(sort.len())?;
    Ok(sort)
}

/// Parses the `fields` projection list. `id` is implied and deduplicated;
/// unknown names fail.
pub fn parse_fields(
    raw: &str,
    collection: &Collection,
) -> Result<Vec<ColumnName>, QueryParseError> {
    let mut fields: Vec<ColumnName> = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() || part == "id" {
            continue;
        }
        let column = collection
            .column(part)
            .ok_or_else(|| QueryParseError::UnknownProjectionField {
                name: part.to_string(),
            })?;
        if !fields.iter().any(|f| f == &column.name) {
            fields.push(column.name.clone());
        }
    }
    Ok(fields)
}

/// Collects every non-reserved key as a typed filter.
pub fn parse_filters(
    params: &HashMap<String, String>,
    collection: &Collection,
    limits: &Limits,
) -> Result<Vec<Filter>, QueryParseError> {
    // Deterministic compile output regardless of map iteration order.
    let mut keys: Vec<&String> = params
        .keys()
        .filter(|k| !RESERVED_PARAMS.contains(&k.as_str()))
        .collect();
    keys.sort();

    let mut filters = Vec::new();
    for key in keys {
        let value = &params[key];
        let (column_name, op) = parse_filter_key(key)?;
        let column = collection
            .column(column_name)
            .ok_or_else(|| QueryParseError::UnknownFilterColumn {
                name: column_name.to_string(),
            })?;

        let values = match op {
            FilterOp::Like => {
                if !column.column_type.is_text_like() {
                    return Err(QueryParseError::BadFilterValue {
                        column: column_name.to_string(),
                        reason: format!(
                            "'like' requires a string column, '{}' is {}",
                            column_name, column.column_type
                        ),
                    });
                }
                vec![FieldValue::Text(value.clone())]
            }
            FilterOp::In => {
                let mut values = Vec::new();
                for part in value.split(',') {
                    let coerced = FieldValue::from_query_str(part.trim(), column.column_type)
                        .map_err(|e| QueryParseError::BadFilterValue {
                            column: column_name.to_string(),
                            reason: e.to_string(),
                        })?;
                    values.push(coerced);
                }
                if values.is_empty() {
                    return Err(QueryParseError::BadFilterValue {
                        column: column_name.to_string(),
                        reason: "'in' requires at least one value".to_string(),
                    });
                }
                values
            }
            _ => {
                let coerced = FieldValue::from_query_str(value, column.column_type).map_err(
                    |e| QueryParseError::BadFilterValue {
                        column: column_name.to_string(),
                        reason: e.to_string(),
                    },
                )?;
                vec![coerced]
            }
        };

        filters.push(Filter {
            column: column.name.clone(),
            column_type: column.column_type,
            op,
            values,
        });
    }
    limits.check_filter_count(filters.len())?;
    Ok(filters)
}

/// Splits a filter key into `(column, operator)`.
///
/// `"price[gte]"` parses to `("price", Gte)`; a bare `"price"` means `Eq`.
fn parse_filter_key(key: &str) -> Result<(&str, FilterOp), QueryParseError> {
    match key.find('[') {
        Some(open) => {
            if !key.ends_with(']') || open == 0 {
                return Err(QueryParseError::MalformedKey {
                    key: key.to_string(),
                });
            }
            let column = &key[..open];
            let op_str = &key[open + 1..key.len() - 1];
            let op = FilterOp::parse(op_str).ok_or_else(|| QueryParseError::UnknownFilterOp {
                column: column.to_string(),
                op: op_str.to_string(),
            })?;
            Ok((column, op))
        }
        None => Ok((key, FilterOp::Eq)),
    }
}

/// Returns true when the request selects atomic batch mode.
///
/// Only `true` and `1` select it; anything else is best-effort.
pub fn is_atomic(params: &HashMap<String, String>) -> bool {
    matches!(params.get("atomic").map(String::as_str), Some("true") | Some("1"))
}

fn resolve_column_ref(name: &str, collection: &Collection) -> Option<ColumnRef> {
    if name == "id" {
        return Some(ColumnRef::Id);
    }
    collection
        .column(name)
        .map(|c| ColumnRef::User(c.name.clone()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
