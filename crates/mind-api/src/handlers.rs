//! Route handler functions for all API endpoints.
//!
//! Each handler resolves the current session (via the auth middleware),
//! runs one user action against the gate or the turn pipeline, and answers
//! with the re-rendered session view.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use mind_chat::{GateDecision, TurnInput, TurnOutcome};
use mind_core::Mode;
use mind_voice::RecordedAudio;

use crate::auth::CurrentSession;
use crate::error::ApiError;
use crate::state::AppState;
use crate::view::{ModeView, Notice, SessionView};

/// Shown whenever a recording or an empty passphrase yields nothing usable.
pub const NOT_UNDERSTOOD: &str = "No pude entender. Intenta de nuevo.";

/// Content type assumed for audio bodies sent without one.
const DEFAULT_AUDIO_TYPE: &str = "audio/wav";

// =============================================================================
// Request types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub passphrase: String,
}

#[derive(Debug, Deserialize)]
pub struct ModeRequest {
    pub mode: String,
}

#[derive(Debug, Deserialize)]
pub struct TurnRequest {
    pub text: String,
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub active_sessions: usize,
    pub voice_providers: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedSession {
    pub token: String,
    pub view: SessionView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// "granted" or "no_attempt".
    pub outcome: String,
    pub view: SessionView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TurnResponse {
    /// "replied", "inaudible" or "generation_failed".
    pub outcome: String,
    /// Provider that voiced the reply, when one did.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub voice: Option<String>,
    pub view: SessionView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub success: bool,
    pub message: String,
}

// =============================================================================
// Public endpoints
// =============================================================================

/// GET /health - liveness and a few runtime counters.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        active_sessions: state.sessions.len(),
        voice_providers: state.pipeline.synthesis().provider_names(),
    })
}

/// GET /modes - the selectable conversation modes.
pub async fn list_modes() -> impl IntoResponse {
    let modes: Vec<ModeView> = Mode::ALL.iter().copied().map(ModeView::from).collect();
    Json(modes)
}

/// POST /sessions - open a signed-out session.
pub async fn create_session(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let (token, handle) = state.sessions.create()?;
    let view = SessionView::render(&*handle.lock().await, None);
    Ok((StatusCode::CREATED, Json(CreatedSession { token, view })))
}

// =============================================================================
// Session endpoints
// =============================================================================

/// GET /session - current view model.
pub async fn get_session(Extension(current): Extension<CurrentSession>) -> impl IntoResponse {
    let session = current.handle.lock().await;
    Json(SessionView::render(&session, None))
}

/// POST /login - typed passphrase.
pub async fn login(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let mut session = current.handle.lock().await;
    let decision = state.gate.login_typed(&mut session, &body.passphrase);
    login_response(decision, &session)
}

/// POST /login/voice - spoken passphrase as a raw audio body.
pub async fn login_voice(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<LoginResponse>, ApiError> {
    let audio = recorded_audio(&headers, body);
    let mut session = current.handle.lock().await;
    let decision = state.gate.login_spoken(&mut session, &audio).await;
    login_response(decision, &session)
}

/// PUT /mode - switch the instruction used by later turns.
pub async fn set_mode(
    Extension(current): Extension<CurrentSession>,
    Json(body): Json<ModeRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let mut session = current.handle.lock().await;
    if !session.is_signed_in() {
        return Err(ApiError::LoginRequired);
    }
    let mode: Mode = body
        .mode
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Unknown mode: {}", body.mode)))?;
    session.mode = mode;
    tracing::debug!(mode = mode.as_str(), "Mode changed");
    Ok(Json(SessionView::render(&session, None)))
}

/// POST /turns - typed turn.
pub async fn submit_turn(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Json(body): Json<TurnRequest>,
) -> Result<Json<TurnResponse>, ApiError> {
    let mut session = current.handle.lock().await;
    let outcome = state
        .pipeline
        .run(&mut session, TurnInput::Typed(body.text))
        .await?;
    Ok(Json(turn_response(outcome, &session)))
}

/// POST /turns/voice - spoken turn as a raw audio body.
pub async fn submit_voice_turn(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<TurnResponse>, ApiError> {
    let audio = recorded_audio(&headers, body);
    let mut session = current.handle.lock().await;
    let outcome = state
        .pipeline
        .run(&mut session, TurnInput::Spoken(audio))
        .await?;
    Ok(Json(turn_response(outcome, &session)))
}

/// POST /logout - destroy the session; the token stops working.
pub async fn logout(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
) -> impl IntoResponse {
    let removed = state.sessions.remove(&current.token);
    tracing::info!(removed, "Session logged out");
    Json(LogoutResponse {
        success: removed,
        message: "Sesión cerrada".to_string(),
    })
}

// =============================================================================
// Helpers
// =============================================================================

fn recorded_audio(headers: &HeaderMap, body: Bytes) -> RecordedAudio {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_AUDIO_TYPE);
    RecordedAudio::new(body.to_vec(), content_type)
}

fn login_response(
    decision: GateDecision,
    session: &mind_core::Session,
) -> Result<Json<LoginResponse>, ApiError> {
    let (outcome, notice) = match decision {
        GateDecision::Granted { heard, .. } => (
            "granted",
            heard.map(|text| Notice::info(format!("Escuché: {}", text))),
        ),
        GateDecision::NoAttempt => ("no_attempt", Some(Notice::warning(NOT_UNDERSTOOD))),
        GateDecision::Denied { attempted } => {
            return Err(ApiError::InvalidCredential(format!(
                "Clave incorrecta: {}",
                attempted
            )));
        }
    };
    Ok(Json(LoginResponse {
        outcome: outcome.to_string(),
        view: SessionView::render(session, notice),
    }))
}

fn turn_response(outcome: TurnOutcome, session: &mind_core::Session) -> TurnResponse {
    let (label, voice, notice) = match outcome {
        TurnOutcome::Replied { voice, .. } => ("replied", voice, None),
        TurnOutcome::Inaudible => ("inaudible", None, Some(Notice::warning(NOT_UNDERSTOOD))),
        TurnOutcome::GenerationFailed { message } => (
            "generation_failed",
            None,
            Some(Notice::error(format!("Error: {}", message))),
        ),
    };
    TurnResponse {
        outcome: label.to_string(),
        voice,
        view: SessionView::render(session, notice),
    }
}
