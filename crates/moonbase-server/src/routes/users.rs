//! Admin handlers for account management. Every endpoint passes the admin
//! gate, and every action lands in the audit log before the response is
//! written.

use std::collections::HashMap;

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use moonbase_engine::admin::{Claims, NewUser, Role, UserPatch};
use serde_json::{Map, Value};
use tracing::info;

use crate::auth::admin_claims;
use crate::error::ApiError;
use crate::state::AppState;

const CREATE_KEYS: &[&str] = &["username", "email", "password", "role"];
const UPDATE_KEYS: &[&str] = &["id", "email", "role"];
const DESTROY_KEYS: &[&str] = &["id"];
const RESET_KEYS: &[&str] = &["id", "password"];

/// Audit trail entry, written before any response.
pub(crate) fn audit(action: &str, actor: &Claims, target: Option<&str>) {
    info!(
        target: "moonbase::audit",
        actor = %actor.user_id,
        actor_name = %actor.username,
        action,
        target = target.unwrap_or("-"),
        "admin action"
    );
}

pub async fn list(state: &AppState, headers: &HeaderMap) -> Result<Response, ApiError> {
    let claims = admin_claims(state.tokens.as_ref(), headers)?;
    audit("users.list", &claims, None);
    let users = state.users.list().await?;
    let count = users.len();
    Ok(Json(serde_json::json!({"users": users, "count": count})).into_response())
}

pub async fn get(
    state: &AppState,
    headers: &HeaderMap,
    params: &HashMap<String, String>,
) -> Result<Response, ApiError> {
    let claims = admin_claims(state.tokens.as_ref(), headers)?;
    let id = params
        .get("id")
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request("missing required query parameter 'id'"))?;
    audit("users.get", &claims, Some(id));
    let user = state.users.get(id).await?;
    Ok(Json(user).into_response())
}

pub async fn create(
    state: &AppState,
    headers: &HeaderMap,
    body: &Value,
) -> Result<Response, ApiError> {
    let claims = admin_claims(state.tokens.as_ref(), headers)?;
    let object = body_object(body)?;
    check_keys(object, CREATE_KEYS)?;

    let role: Role = required(object, "role")?
        .parse()
        .map_err(ApiError::from)?;
    let new_user = NewUser {
        username: required(object, "username")?.to_string(),
        email: required(object, "email")?.to_string(),
        password: required(object, "password")?.to_string(),
        role,
    };
    let user = state.users.create(new_user).await?;
    audit("users.create", &claims, Some(&user.id));
    Ok((StatusCode::CREATED, Json(user)).into_response())
}

pub async fn update(
    state: &AppState,
    headers: &HeaderMap,
    body: &Value,
) -> Result<Response, ApiError> {
    let claims = admin_claims(state.tokens.as_ref(), headers)?;
    let object = body_object(body)?;
    check_keys(object, UPDATE_KEYS)?;
    let id = required(object, "id")?.to_string();

    let role = match object.get("role").and_then(Value::as_str) {
        Some(raw) => Some(raw.parse::<Role>().map_err(ApiError::from)?),
        None => None,
    };
    let patch = UserPatch {
        email: object
            .get("email")
            .and_then(Value::as_str)
            .map(String::from),
        role,
    };
    audit("users.update", &claims, Some(&id));
    let user = state.users.update(&claims.user_id, &id, patch).await?;
    Ok(Json(user).into_response())
}

pub async fn destroy(
    state: &AppState,
    headers: &HeaderMap,
    body: &Value,
) -> Result<Response, ApiError> {
    let claims = admin_claims(state.tokens.as_ref(), headers)?;
    let object = body_object(body)?;
    check_keys(object, DESTROY_KEYS)?;
    let id = required(object, "id")?.to_string();
    audit("users.destroy", &claims, Some(&id));
    state.users.destroy(&claims.user_id, &id).await?;
    Ok(Json(serde_json::json!({"message": format!("user '{id}' deleted")})).into_response())
}

pub async fn reset_password(
    state: &AppState,
    headers: &HeaderMap,
    body: &Value,
) -> Result<Response, ApiError> {
    let claims = admin_claims(state.tokens.as_ref(), headers)?;
    let object = body_object(body)?;
    check_keys(object, RESET_KEYS)?;
    let id = required(object, "id")?.to_string();
    let password = required(object, "password")?;
    audit("users.reset_password", &claims, Some(&id));
    state
        .users
        .reset_password(&claims.user_id, &id, password)
        .await?;
    Ok(Json(serde_json::json!({"message": "password reset"})).into_response())
}

// ---------------------------------------------------------------------------
// Decoding helpers (shared with the apikeys handlers)
// ---------------------------------------------------------------------------

pub(crate) fn body_object(body: &Value) -> Result<&Map<String, Value>, ApiError> {
    body.as_object()
        .ok_or_else(|| ApiError::bad_request("body must be a JSON object"))
}

pub(crate) fn check_keys(object: &Map<String, Value>, allowed: &[&str]) -> Result<(), ApiError> {
    for key in object.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(ApiError::bad_request(format!("unknown field '{key}'")));
        }
    }
    Ok(())
}

pub(crate) fn required<'a>(
    object: &'a Map<String, Value>,
    field: &str,
) -> Result<&'a str, ApiError> {
    object
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            ApiError::bad_request(format!("missing required field '{field}'"))
                .with_code("MISSING_REQUIRED_FIELD")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn required_field_carries_symbolic_code() {
        let object = json!({"email": "a@b.co"});
        let err = required(object.as_object().unwrap(), "username").unwrap_err();
        assert_eq!(err.error_code, Some("MISSING_REQUIRED_FIELD"));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn empty_string_counts_as_missing() {
        let object = json!({"username": ""});
        assert!(required(object.as_object().unwrap(), "username").is_err());
    }
}
