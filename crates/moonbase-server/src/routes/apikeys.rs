//! Admin handlers for API-key management. The plaintext key appears in the
//! create and rotate responses and nowhere else.

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;

use super::users::{audit, body_object, check_keys, required};
use crate::auth::admin_claims;
use crate::error::ApiError;
use crate::state::AppState;

const CREATE_KEYS: &[&str] = &["name"];
const ID_KEYS: &[&str] = &["id"];

pub async fn list(state: &AppState, headers: &HeaderMap) -> Result<Response, ApiError> {
    let claims = admin_claims(state.tokens.as_ref(), headers)?;
    audit("apikeys.list", &claims, None);
    let keys = state.apikeys.list().await?;
    let count = keys.len();
    Ok(Json(serde_json::json!({"apikeys": keys, "count": count})).into_response())
}

pub async fn create(
    state: &AppState,
    headers: &HeaderMap,
    body: &Value,
) -> Result<Response, ApiError> {
    let claims = admin_claims(state.tokens.as_ref(), headers)?;
    let object = body_object(body)?;
    check_keys(object, CREATE_KEYS)?;
    let name = required(object, "name")?;
    let issued = state.apikeys.create(&claims.user_id, name).await?;
    audit("apikeys.create", &claims, Some(&issued.key.id));
    Ok((StatusCode::CREATED, Json(issued)).into_response())
}

pub async fn destroy(
    state: &AppState,
    headers: &HeaderMap,
    body: &Value,
) -> Result<Response, ApiError> {
    let claims = admin_claims(state.tokens.as_ref(), headers)?;
    let object = body_object(body)?;
    check_keys(object, ID_KEYS)?;
    let id = required(object, "id")?;
    audit("apikeys.destroy", &claims, Some(id));
    state.apikeys.destroy(id).await?;
    Ok(Json(serde_json::json!({"message": format!("api key '{id}' deleted")})).into_response())
}

pub async fn rotate(
    state: &AppState,
    headers: &HeaderMap,
    body: &Value,
) -> Result<Response, ApiError> {
    let claims = admin_claims(state.tokens.as_ref(), headers)?;
    let object = body_object(body)?;
    check_keys(object, ID_KEYS)?;
    let id = required(object, "id")?;
    audit("apikeys.rotate", &claims, Some(id));
    let issued = state.apikeys.rotate(id).await?;
    Ok(Json(issued).into_response())
}
