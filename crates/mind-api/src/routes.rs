//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with CORS, tracing, per-route body limits,
//! and all endpoint handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use mind_chat::SessionStore;
use mind_core::config::MindConfig;
use mind_core::error::MindError;

use crate::handlers;
use crate::state::AppState;

/// Limit for JSON request bodies.
pub const JSON_BODY_LIMIT: usize = 64 * 1024;

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS: allow the server's own origin on both loopback spellings.
    let port = state.config.server.port;
    let origins: Vec<HeaderValue> = [
        format!("http://127.0.0.1:{}", port),
        format!("http://localhost:{}", port),
    ]
    .iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    // Routes that do NOT require a session.
    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/modes", get(handlers::list_modes))
        .route("/sessions", post(handlers::create_session));

    let json_routes = Router::new()
        .route("/session", get(handlers::get_session))
        .route("/login", post(handlers::login))
        .route("/mode", put(handlers::set_mode))
        .route("/turns", post(handlers::submit_turn))
        .route("/logout", post(handlers::logout))
        .layer(DefaultBodyLimit::max(JSON_BODY_LIMIT));

    let audio_routes = Router::new()
        .route("/login/voice", post(handlers::login_voice))
        .route("/turns/voice", post(handlers::submit_voice_turn))
        .layer(DefaultBodyLimit::max(state.config.server.max_audio_bytes));

    // Everything scoped to a session sits behind the bearer-token lookup.
    let session_routes = json_routes
        .merge(audio_routes)
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::auth::require_session,
        ));

    public_routes
        .merge(session_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on the configured address.
pub async fn start_server(config: &MindConfig, state: AppState) -> Result<(), MindError> {
    let addr = format!("{}:{}", config.server.host, config.server.port);

    spawn_session_sweeper(Arc::clone(&state.sessions));
    let router = create_router(state);

    tracing::info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| MindError::Api(format!("Failed to bind: {}", e)))?;

    axum::serve(listener, router)
        .await
        .map_err(|e| MindError::Api(format!("Server error: {}", e)))?;

    Ok(())
}

/// Periodically drop sessions whose clients went away without logging out.
fn spawn_session_sweeper(sessions: Arc<SessionStore>) {
    let period = (sessions.idle_timeout() / 4).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            sessions.evict_idle();
        }
    });
}
