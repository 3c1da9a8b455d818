//! Routing for the AIP-136 colon-verb URL scheme.
//!
//! Every resource path is a single segment `resource:verb` (for example
//! `/collections:create` or `/customers:list`), so the router carries one
//! dynamic route per method and dispatches on the split segment. Fixed
//! paths (`/health`, `/doc`) are registered before the dynamic one.

pub mod apikeys;
pub mod collections;
pub mod login;
pub mod records;
pub mod users;

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use moonbase_core::error::LimitError;
use serde_json::Value;

use crate::doc;
use crate::error::ApiError;
use crate::state::AppState;

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/doc", get(doc::doc_handler))
        .route("/{action}", get(dispatch_get).post(dispatch_post))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Response {
    Json(serde_json::json!({
        "status": "ok",
        "dialect": state.dialect.as_str(),
    }))
    .into_response()
}

fn split_action(action: &str) -> Result<(&str, &str), ApiError> {
    action
        .split_once(':')
        .filter(|(resource, verb)| !resource.is_empty() && !verb.is_empty())
        .ok_or_else(|| ApiError::not_found(format!("unknown endpoint '{action}'")))
}

fn invalid_action(verb: &str) -> ApiError {
    ApiError::bad_request(format!("invalid action '{verb}'")).with_code("INVALID_ACTION")
}

async fn dispatch_get(
    State(state): State<AppState>,
    Path(action): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let (resource, verb) = split_action(&action)?;
    match (resource, verb) {
        ("collections", "list") => collections::list(&state).await,
        ("collections", "get") => collections::get(&state, &params).await,
        ("users", "list") => users::list(&state, &headers).await,
        ("users", "get") => users::get(&state, &headers, &params).await,
        ("apikeys", "list") => apikeys::list(&state, &headers).await,
        ("collections" | "users" | "apikeys" | "auth", other) => Err(invalid_action(other)),
        (name, "list") => records::list(&state, name, &params).await,
        (name, "get") => records::get(&state, name, &params).await,
        (name, "schema") => records::schema(&state, name).await,
        (_, other) => Err(invalid_action(other)),
    }
}

async fn dispatch_post(
    State(state): State<AppState>,
    Path(action): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let (resource, verb) = split_action(&action)?;
    check_payload_size(&state, body.len() as u64)?;
    let body: Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("invalid JSON body: {e}")))?;

    match (resource, verb) {
        ("collections", "create") => collections::create(&state, &body).await,
        ("collections", "update") => collections::update(&state, &body).await,
        ("collections", "destroy") => collections::destroy(&state, &body).await,
        ("auth", "login") => login::login(&state, &body).await,
        ("users", "create") => users::create(&state, &headers, &body).await,
        ("users", "update") => users::update(&state, &headers, &body).await,
        ("users", "destroy") => users::destroy(&state, &headers, &body).await,
        ("users", "reset_password") => users::reset_password(&state, &headers, &body).await,
        ("apikeys", "create") => apikeys::create(&state, &headers, &body).await,
        ("apikeys", "destroy") => apikeys::destroy(&state, &headers, &body).await,
        ("apikeys", "rotate") => apikeys::rotate(&state, &headers, &body).await,
        ("collections" | "users" | "apikeys" | "auth", other) => Err(invalid_action(other)),
        (name, "create") => records::create(&state, name, &params, &body).await,
        (name, "update") => records::update(&state, name, &params, &body).await,
        (name, "destroy") => records::destroy(&state, name, &params, &body).await,
        (_, other) => Err(invalid_action(other)),
    }
}

fn check_payload_size(state: &AppState, bytes: u64) -> Result<(), ApiError> {
    state.limits.check_payload_bytes(bytes).map_err(|e| {
        let status = match e {
            LimitError::PayloadTooLarge { .. } => axum::http::StatusCode::PAYLOAD_TOO_LARGE,
            _ => axum::http::StatusCode::BAD_REQUEST,
        };
        ApiError::new(status, e.to_string())
    })
}
