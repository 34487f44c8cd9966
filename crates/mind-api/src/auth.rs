//! Session authentication via bearer tokens.
//!
//! Each browser session receives an opaque token from `POST /sessions`.
//! The middleware here resolves `Authorization: Bearer <token>` to the live
//! session and hands it to the handler as a request extension.

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use mind_chat::SessionHandle;

use crate::error::ApiError;
use crate::state::AppState;

/// The session a request was authenticated against.
#[derive(Clone)]
pub struct CurrentSession {
    pub token: String,
    pub handle: SessionHandle,
}

/// Middleware that resolves the bearer token to a live session.
///
/// Returns 401 if the header is missing, malformed, or names a session that
/// does not exist (never created, or already logged out).
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(&req) {
        Ok(token) => token,
        Err(err) => return err.into_response(),
    };

    match state.sessions.get(&token) {
        Some(handle) => {
            req.extensions_mut().insert(CurrentSession { token, handle });
            next.run(req).await
        }
        None => ApiError::Unauthorized("Unknown or expired session".to_string()).into_response(),
    }
}

fn bearer_token(req: &Request) -> Result<String, ApiError> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;
    let value = value.to_str().map_err(|_| {
        ApiError::Unauthorized("Invalid Authorization header encoding".to_string())
    })?;
    value
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Invalid bearer token".to_string()))
}
