//! Control-plane handlers: collection lifecycle.
//!
//! Request bodies are decoded from the raw JSON map with explicit
//! allowed-key sets, so unknown keys (including any `default` /
//! `default_value` inside column lists) are rejected before anything is
//! bound into typed structures.

use std::collections::HashMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use moonbase_core::changeset::{ChangeSet, RenameColumn};
use moonbase_core::types::{Collection, CollectionName, Column, ColumnName, ColumnType};
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::state::AppState;

const CREATE_KEYS: &[&str] = &["name", "columns"];
const UPDATE_KEYS: &[&str] = &[
    "name",
    "rename_columns",
    "modify_columns",
    "add_columns",
    "remove_columns",
];
const DESTROY_KEYS: &[&str] = &["name"];
const COLUMN_KEYS: &[&str] = &["name", "type", "nullable", "unique"];
const RENAME_KEYS: &[&str] = &["old_name", "new_name"];

pub async fn list(state: &AppState) -> Result<Response, ApiError> {
    let collections = state.manager.list().await;
    let count = collections.len();
    Ok(Json(serde_json::json!({
        "collections": collections,
        "count": count,
    }))
    .into_response())
}

pub async fn get(
    state: &AppState,
    params: &HashMap<String, String>,
) -> Result<Response, ApiError> {
    let name = require_param(params, "name")?;
    let collection = state.manager.get(name).await?;
    Ok(Json(collection).into_response())
}

pub async fn create(state: &AppState, body: &Value) -> Result<Response, ApiError> {
    let object = as_object(body)?;
    check_keys(object, CREATE_KEYS)?;

    let name = require_str(object, "name")?;
    let name = CollectionName::new(name).map_err(|e| ApiError::bad_request(e.to_string()))?;

    let raw_columns = object
        .get("columns")
        .and_then(Value::as_array)
        .ok_or_else(|| ApiError::bad_request("'columns' must be a non-empty array"))?;
    let mut columns = Vec::with_capacity(raw_columns.len());
    for raw in raw_columns {
        columns.push(parse_column(raw)?);
    }

    let collection =
        Collection::new(name, columns).map_err(|e| ApiError::bad_request(e.to_string()))?;
    let created = state.manager.create(collection).await?;
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

pub async fn update(state: &AppState, body: &Value) -> Result<Response, ApiError> {
    let object = as_object(body)?;
    check_keys(object, UPDATE_KEYS)?;
    let name = require_str(object, "name")?.to_string();

    let mut changeset = ChangeSet::default();
    if let Some(renames) = object.get("rename_columns") {
        for raw in as_array(renames, "rename_columns")? {
            let rename = as_object(raw)?;
            check_keys(rename, RENAME_KEYS)?;
            changeset.rename_columns.push(RenameColumn {
                old_name: parse_column_name(require_str(rename, "old_name")?)?,
                new_name: parse_column_name(require_str(rename, "new_name")?)?,
            });
        }
    }
    if let Some(modifies) = object.get("modify_columns") {
        for raw in as_array(modifies, "modify_columns")? {
            changeset.modify_columns.push(parse_column(raw)?);
        }
    }
    if let Some(adds) = object.get("add_columns") {
        for raw in as_array(adds, "add_columns")? {
            changeset.add_columns.push(parse_column(raw)?);
        }
    }
    if let Some(removes) = object.get("remove_columns") {
        for raw in as_array(removes, "remove_columns")? {
            let name = raw
                .as_str()
                .ok_or_else(|| ApiError::bad_request("'remove_columns' holds column names"))?;
            changeset.remove_columns.push(parse_column_name(name)?);
        }
    }

    let updated = state.manager.update(&name, changeset).await?;
    Ok(Json(updated).into_response())
}

pub async fn destroy(state: &AppState, body: &Value) -> Result<Response, ApiError> {
    let object = as_object(body)?;
    check_keys(object, DESTROY_KEYS)?;
    let name = require_str(object, "name")?;
    state.manager.destroy(name).await?;
    Ok(Json(serde_json::json!({
        "message": format!("collection '{name}' destroyed"),
    }))
    .into_response())
}

// ---------------------------------------------------------------------------
// Decoding helpers
// ---------------------------------------------------------------------------

fn as_object(value: &Value) -> Result<&Map<String, Value>, ApiError> {
    value
        .as_object()
        .ok_or_else(|| ApiError::bad_request("body must be a JSON object"))
}

fn as_array<'a>(value: &'a Value, field: &str) -> Result<&'a Vec<Value>, ApiError> {
    value
        .as_array()
        .ok_or_else(|| ApiError::bad_request(format!("'{field}' must be an array")))
}

fn check_keys(object: &Map<String, Value>, allowed: &[&str]) -> Result<(), ApiError> {
    for key in object.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(ApiError::bad_request(format!("unknown field '{key}'")));
        }
    }
    Ok(())
}

fn require_str<'a>(object: &'a Map<String, Value>, field: &str) -> Result<&'a str, ApiError> {
    object
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("missing required field '{field}'")))
}

fn require_param<'a>(
    params: &'a HashMap<String, String>,
    name: &str,
) -> Result<&'a str, ApiError> {
    params
        .get(name)
        .map(String::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("missing required query parameter '{name}'")))
}

fn parse_column_name(name: &str) -> Result<ColumnName, ApiError> {
    ColumnName::new(name).map_err(|e| ApiError::bad_request(e.to_string()))
}

/// Decodes one column definition. Defaults are system-managed (the
/// type-based null replacement), so a `default` / `default_value` key here
/// fails the allowed-key check like any other unknown field.
fn parse_column(value: &Value) -> Result<Column, ApiError> {
    let object = as_object(value)?;
    check_keys(object, COLUMN_KEYS)?;

    let name = parse_column_name(require_str(object, "name")?)?;
    let column_type: ColumnType = require_str(object, "type")?
        .parse()
        .map_err(|e: moonbase_core::TypeError| ApiError::bad_request(e.to_string()))?;
    let nullable = optional_bool(object, "nullable")?.unwrap_or(true);
    let unique = optional_bool(object, "unique")?.unwrap_or(false);

    Column::new(name, column_type, nullable, unique, None)
        .map_err(|e| ApiError::bad_request(e.to_string()))
}

fn optional_bool(object: &Map<String, Value>, field: &str) -> Result<Option<bool>, ApiError> {
    match object.get(field) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(ApiError::bad_request(format!(
            "'{field}' must be a boolean"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_column_happy_path() {
        let column = parse_column(&json!({
            "name": "email",
            "type": "string",
            "nullable": false,
            "unique": true,
        }))
        .unwrap();
        assert_eq!(column.name.as_str(), "email");
        assert_eq!(column.column_type, ColumnType::String);
        assert!(!column.nullable);
        assert!(column.unique);
    }

    #[test]
    fn parse_column_rejects_default_keys() {
        for key in ["default", "default_value"] {
            let err = parse_column(&json!({
                "name": "status",
                "type": "string",
                key: "active",
            }))
            .unwrap_err();
            assert!(
                err.message.contains(&format!("unknown field '{key}'")),
                "{key} should be rejected"
            );
        }
    }

    #[test]
    fn parse_column_deprecated_type_guidance() {
        let err = parse_column(&json!({"name": "body_text", "type": "text"})).unwrap_err();
        assert!(err.message.contains("use 'string' instead"));
        let err = parse_column(&json!({"name": "score", "type": "float"})).unwrap_err();
        assert!(err.message.contains("use 'decimal' instead"));
    }

    #[test]
    fn parse_column_missing_fields() {
        let err = parse_column(&json!({"type": "string"})).unwrap_err();
        assert!(err.message.contains("'name'"));
        let err = parse_column(&json!({"name": "email"})).unwrap_err();
        assert!(err.message.contains("'type'"));
    }

    #[test]
    fn parse_column_non_bool_flags_rejected() {
        let err =
            parse_column(&json!({"name": "email", "type": "string", "nullable": "yes"}))
                .unwrap_err();
        assert!(err.message.contains("'nullable' must be a boolean"));
    }

    #[test]
    fn check_keys_rejects_unknowns() {
        let object = json!({"name": "x", "surprise": 1});
        let err = check_keys(object.as_object().unwrap(), &["name"]).unwrap_err();
        assert!(err.message.contains("unknown field 'surprise'"));
    }
}
