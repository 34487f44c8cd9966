//! API error types and JSON error response formatting.
//!
//! ApiError provides a consistent JSON error response format across all
//! endpoints, mapping internal errors to appropriate HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mind_chat::ChatError;
use serde::{Deserialize, Serialize};

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "bad_request", "login_required").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - missing or invalid parameters.
    BadRequest(String),
    /// 401 Unauthorized - missing or unknown session token.
    Unauthorized(String),
    /// 401 Unauthorized - passphrase rejected by the access gate.
    InvalidCredential(String),
    /// 403 Forbidden - the session has not passed the gate yet.
    LoginRequired,
    /// 500 Internal Server Error - unexpected server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            ApiError::InvalidCredential(msg) => {
                (StatusCode::UNAUTHORIZED, "invalid_credential", msg)
            }
            ApiError::LoginRequired => (
                StatusCode::FORBIDDEN,
                "login_required",
                "Sign in before using the chat".to_string(),
            ),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
        };

        let body = ErrorBody {
            error: error_code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::NotSignedIn => ApiError::LoginRequired,
            ChatError::EmptyMessage | ChatError::MessageTooLong(_) => {
                ApiError::BadRequest(err.to_string())
            }
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(resp: Response) -> ErrorBody {
        let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_invalid_credential_response() {
        let resp = ApiError::InvalidCredential("Clave incorrecta: sol".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body = body_of(resp).await;
        assert_eq!(body.error, "invalid_credential");
        assert_eq!(body.message, "Clave incorrecta: sol");
    }

    #[tokio::test]
    async fn test_login_required_response() {
        let resp = ApiError::LoginRequired.into_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_of(resp).await.error, "login_required");
    }

    #[test]
    fn test_from_chat_error() {
        assert!(matches!(
            ApiError::from(ChatError::NotSignedIn),
            ApiError::LoginRequired
        ));
        assert!(matches!(
            ApiError::from(ChatError::EmptyMessage),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from(ChatError::Session("poisoned".to_string())),
            ApiError::Internal(_)
        ));
    }
}
