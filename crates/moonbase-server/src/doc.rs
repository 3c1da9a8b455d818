//! The `/doc` endpoint: a JSON description of every registered collection,
//! served with an ETag derived from the registry snapshot so unchanged
//! schemas answer `304 Not Modified`.

use axum::extract::State;
use axum::http::header::{ETAG, IF_NONE_MATCH};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use sha2::{Digest, Sha256};

use crate::state::AppState;

pub async fn doc_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let collections = state.manager.list().await;
    let body = serde_json::json!({
        "service": "moonbase",
        "dialect": state.dialect.as_str(),
        "collections": collections,
    });

    let etag = compute_etag(&body);
    let client_tag = headers.get(IF_NONE_MATCH).and_then(|v| v.to_str().ok());
    if client_tag == Some(etag.as_str()) {
        return ([(ETAG, etag)], StatusCode::NOT_MODIFIED).into_response();
    }
    ([(ETAG, etag)], Json(body)).into_response()
}

fn compute_etag(body: &serde_json::Value) -> String {
    let serialized = serde_json::to_vec(body).unwrap_or_default();
    let digest = Sha256::digest(&serialized);
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    format!("\"{hex}\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn etag_is_stable_and_quoted() {
        let body = json!({"collections": []});
        let a = compute_etag(&body);
        let b = compute_etag(&body);
        assert_eq!(a, b);
        assert!(a.starts_with('"') && a.ends_with('"'));
        assert_eq!(a.len(), 66);
    }

    #[test]
    fn etag_changes_with_content() {
        let a = compute_etag(&json!({"collections": []}));
        let b = compute_etag(&json!({"collections": ["x"]}));
        assert_ne!(a, b);
    }
}
