use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use moonbase_core::error::LimitError;
use moonbase_engine::admin::{AdminError, AuthError};
use moonbase_engine::EngineError;

/// The HTTP-facing error: status, message, and optional symbolic code.
///
/// Serialized as the envelope `{"error": msg, "code": status,
/// "error_code"?: symbol}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub error_code: Option<&'static str>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            error_code: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.error_code = Some(code);
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = serde_json::json!({
            "error": self.message,
            "code": self.status.as_u16(),
        });
        if let Some(code) = self.error_code {
            body["error_code"] = serde_json::Value::String(code.to_string());
        }
        (self.status, Json(body)).into_response()
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        let status = match &err {
            EngineError::Validation { .. } => StatusCode::BAD_REQUEST,
            EngineError::CollectionNotFound { .. } | EngineError::RecordNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            EngineError::CollectionExists { .. } | EngineError::Conflict { .. } => {
                StatusCode::CONFLICT
            }
            EngineError::Limit(limit) => match limit {
                LimitError::BatchTooLarge { .. } | LimitError::PayloadTooLarge { .. } => {
                    StatusCode::PAYLOAD_TOO_LARGE
                }
                _ => StatusCode::BAD_REQUEST,
            },
            EngineError::Ddl { .. } | EngineError::Driver(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, err.to_string())
    }
}

impl From<AdminError> for ApiError {
    fn from(err: AdminError) -> Self {
        let status =
            StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self {
            status,
            message: err.to_string(),
            error_code: err.code(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let status =
            StatusCode::from_u16(err.status()).unwrap_or(StatusCode::UNAUTHORIZED);
        Self {
            status,
            message: err.to_string(),
            error_code: err.code(),
        }
    }
}
