use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{ IntoResponse, Response },
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm::chat::ChatError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Upstream(#[from] ChatError),
    /// Upstream failure whose gateway status is forwarded to the caller.
    #[error(transparent)]
    Passthrough(ChatError),
}

impl ApiError {
    pub fn missing_field(field: &str) -> Self {
        ApiError::BadRequest(format!("Missing '{}' in request body", field))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Passthrough(e) =>
                e
                    .status()
                    .and_then(|s| StatusCode::from_u16(s).ok())
                    .filter(|s| s.is_client_error() || s.is_server_error())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::missing_field("message").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Upstream(ChatError::Status { status: 401, body: String::new() }).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Passthrough(ChatError::Status { status: 401, body: String::new() }).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Passthrough(ChatError::Malformed("x".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_missing_field_message() {
        assert_eq!(
            ApiError::missing_field("prompt").to_string(),
            "Missing 'prompt' in request body"
        );
    }
}
