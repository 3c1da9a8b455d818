//! The `/auth:login` endpoint: username + password in, bearer token out.

use axum::response::{IntoResponse, Response};
use axum::Json;
use moonbase_engine::admin::Claims;
use serde_json::Value;
use tracing::info;

use super::users::{body_object, check_keys, required};
use crate::error::ApiError;
use crate::state::AppState;

const LOGIN_KEYS: &[&str] = &["username", "password"];

/// Token lifetime: 24 hours.
const TOKEN_TTL_SECS: u64 = 24 * 60 * 60;

pub async fn login(state: &AppState, body: &Value) -> Result<Response, ApiError> {
    let object = body_object(body)?;
    check_keys(object, LOGIN_KEYS)?;
    let username = required(object, "username")?;
    let password = required(object, "password")?;

    let user = state.users.authenticate(username, password).await?;
    let claims = Claims {
        user_id: user.id.clone(),
        username: user.username.clone(),
        role: user.role,
    };
    let token = state.tokens.issue(&claims, TOKEN_TTL_SECS)?;
    info!(user = %user.id, "login");
    Ok(Json(serde_json::json!({"token": token, "user": user})).into_response())
}
