//! Data-plane handlers: CRUD and batch over one collection.
//!
//! Batch detection follows the shape of the `data` field: an array is a
//! batch, an object is a single record (back-compat), a string is a single
//! destroy (back-compat). The `atomic` query parameter selects the batch
//! mode.

use std::collections::HashMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use moonbase_sql::rest;
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::state::AppState;

pub async fn list(
    state: &AppState,
    name: &str,
    params: &HashMap<String, String>,
) -> Result<Response, ApiError> {
    let page = state.data.list(name, params).await?;
    Ok(Json(serde_json::json!({
        "data": page.data,
        "total": page.total,
        "next_cursor": page.next_cursor,
        "limit": page.limit,
    }))
    .into_response())
}

pub async fn get(
    state: &AppState,
    name: &str,
    params: &HashMap<String, String>,
) -> Result<Response, ApiError> {
    let id = params
        .get("id")
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request("missing required query parameter 'id'"))?;
    let record = state.data.get(name, id).await?;
    Ok(Json(record).into_response())
}

pub async fn schema(state: &AppState, name: &str) -> Result<Response, ApiError> {
    let collection = state.manager.get(name).await?;
    Ok(Json(collection).into_response())
}

pub async fn create(
    state: &AppState,
    name: &str,
    params: &HashMap<String, String>,
    body: &Value,
) -> Result<Response, ApiError> {
    match batch_payload(body) {
        Some(items) => {
            if rest::is_atomic(params) {
                let created = state.batch.create_atomic(name, items).await?;
                Ok((
                    StatusCode::CREATED,
                    Json(serde_json::json!({
                        "message": format!("{} records created", created.len()),
                        "data": created,
                    })),
                )
                    .into_response())
            } else {
                let outcome = state.batch.create_best_effort(name, items).await?;
                Ok((StatusCode::MULTI_STATUS, Json(outcome)).into_response())
            }
        }
        None => {
            let record = single_record(body)?;
            let created = state.data.create(name, &record).await?;
            Ok((StatusCode::CREATED, Json(created)).into_response())
        }
    }
}

pub async fn update(
    state: &AppState,
    name: &str,
    params: &HashMap<String, String>,
    body: &Value,
) -> Result<Response, ApiError> {
    if let Some(items) = batch_payload(body) {
        return if rest::is_atomic(params) {
            let updated = state.batch.update_atomic(name, items).await?;
            Ok(Json(serde_json::json!({
                "message": format!("{} records updated", updated.len()),
                "data": updated,
            }))
            .into_response())
        } else {
            let outcome = state.batch.update_best_effort(name, items).await?;
            Ok((StatusCode::MULTI_STATUS, Json(outcome)).into_response())
        };
    }

    let (id, fields) = single_update_target(body)?;
    let updated = state.data.update(name, &id, &fields).await?;
    Ok(Json(updated).into_response())
}

pub async fn destroy(
    state: &AppState,
    name: &str,
    params: &HashMap<String, String>,
    body: &Value,
) -> Result<Response, ApiError> {
    if let Some(items) = batch_payload(body) {
        return if rest::is_atomic(params) {
            let deleted = state.batch.destroy_atomic(name, items).await?;
            Ok(Json(serde_json::json!({
                "message": format!("{deleted} records deleted"),
                "deleted": deleted,
            }))
            .into_response())
        } else {
            let outcome = state.batch.destroy_best_effort(name, items).await?;
            Ok((StatusCode::MULTI_STATUS, Json(outcome)).into_response())
        };
    }

    let id = single_destroy_target(body)?;
    state.data.destroy(name, &id).await?;
    Ok(Json(serde_json::json!({
        "message": format!("record '{id}' deleted"),
    }))
    .into_response())
}

// ---------------------------------------------------------------------------
// Body shape detection
// ---------------------------------------------------------------------------

/// Returns the batch items when `data` is an array.
fn batch_payload(body: &Value) -> Option<&Vec<Value>> {
    body.as_object()?.get("data")?.as_array()
}

/// A single create body: the record itself, or `{data: {record}}`.
fn single_record(body: &Value) -> Result<Map<String, Value>, ApiError> {
    let object = body
        .as_object()
        .ok_or_else(|| ApiError::bad_request("body must be a JSON object"))?;
    if object.len() == 1 {
        if let Some(data) = object.get("data") {
            return data
                .as_object()
                .cloned()
                .ok_or_else(|| ApiError::bad_request("'data' must be an object or array"));
        }
    }
    Ok(object.clone())
}

/// A single update body: `{id, data}` is canonical; `{data: {id, ...}}`
/// and flat `{id, ...fields}` are accepted for back-compat. The id is
/// lifted out and never reaches the SET clause.
fn single_update_target(body: &Value) -> Result<(String, Map<String, Value>), ApiError> {
    let object = body
        .as_object()
        .ok_or_else(|| ApiError::bad_request("body must be a JSON object"))?;

    let data = match object.get("data") {
        Some(Value::Object(data)) => Some(data.clone()),
        Some(_) => return Err(ApiError::bad_request("'data' must be an object or array")),
        None => None,
    };

    let id = object
        .get("id")
        .and_then(Value::as_str)
        .or_else(|| {
            data.as_ref()
                .and_then(|d| d.get("id"))
                .and_then(Value::as_str)
        })
        .ok_or_else(|| ApiError::bad_request("missing required field 'id'"))?
        .to_string();

    let mut fields = match data {
        Some(data) => data,
        None => {
            let mut flat = object.clone();
            flat.remove("id");
            flat
        }
    };
    fields.remove("id");
    Ok((id, fields))
}

/// A single destroy body: a bare id string, `{id}`, or `{data: "id"}`.
fn single_destroy_target(body: &Value) -> Result<String, ApiError> {
    if let Some(id) = body.as_str() {
        return Ok(id.to_string());
    }
    let object = body
        .as_object()
        .ok_or_else(|| ApiError::bad_request("body must be an id string or a JSON object"))?;
    if let Some(id) = object.get("id").and_then(Value::as_str) {
        return Ok(id.to_string());
    }
    if let Some(id) = object.get("data").and_then(Value::as_str) {
        return Ok(id.to_string());
    }
    Err(ApiError::bad_request("missing required field 'id'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn batch_detection_on_data_array() {
        assert!(batch_payload(&json!({"data": [{"a": 1}]})).is_some());
        assert!(batch_payload(&json!({"data": {"a": 1}})).is_none());
        assert!(batch_payload(&json!({"a": 1})).is_none());
        assert!(batch_payload(&json!("string")).is_none());
    }

    #[test]
    fn single_record_accepts_flat_and_enveloped() {
        let flat = single_record(&json!({"title": "A"})).unwrap();
        assert_eq!(flat["title"], json!("A"));
        let wrapped = single_record(&json!({"data": {"title": "A"}})).unwrap();
        assert_eq!(wrapped["title"], json!("A"));
        assert!(single_record(&json!([1, 2])).is_err());
    }

    #[test]
    fn update_target_canonical_envelope() {
        let (id, fields) =
            single_update_target(&json!({"id": "01ARZ3NDEKTSV4RRFFQ69G5FAV", "data": {"price": 2}}))
                .unwrap();
        assert_eq!(id, "01ARZ3NDEKTSV4RRFFQ69G5FAV");
        assert_eq!(fields["price"], json!(2));
    }

    #[test]
    fn update_target_legacy_id_inside_data() {
        let (id, fields) = single_update_target(
            &json!({"data": {"id": "01ARZ3NDEKTSV4RRFFQ69G5FAV", "price": 2}}),
        )
        .unwrap();
        assert_eq!(id, "01ARZ3NDEKTSV4RRFFQ69G5FAV");
        // The id never reaches the SET clause.
        assert!(fields.get("id").is_none());
        assert_eq!(fields["price"], json!(2));
    }

    #[test]
    fn update_target_flat_shape() {
        let (id, fields) =
            single_update_target(&json!({"id": "01ARZ3NDEKTSV4RRFFQ69G5FAV", "price": 2}))
                .unwrap();
        assert_eq!(id, "01ARZ3NDEKTSV4RRFFQ69G5FAV");
        assert_eq!(fields["price"], json!(2));
        assert!(fields.get("id").is_none());
    }

    #[test]
    fn update_target_requires_id() {
        assert!(single_update_target(&json!({"data": {"price": 2}})).is_err());
    }

    #[test]
    fn destroy_target_shapes() {
        assert_eq!(
            single_destroy_target(&json!("01ARZ3NDEKTSV4RRFFQ69G5FAV")).unwrap(),
            "01ARZ3NDEKTSV4RRFFQ69G5FAV"
        );
        assert_eq!(
            single_destroy_target(&json!({"id": "01ARZ3NDEKTSV4RRFFQ69G5FAV"})).unwrap(),
            "01ARZ3NDEKTSV4RRFFQ69G5FAV"
        );
        assert_eq!(
            single_destroy_target(&json!({"data": "01ARZ3NDEKTSV4RRFFQ69G5FAV"})).unwrap(),
            "01ARZ3NDEKTSV4RRFFQ69G5FAV"
        );
        assert!(single_destroy_target(&json!({"data": 42})).is_err());
    }
}
