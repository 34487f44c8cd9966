//! Quantum Mind API crate - axum HTTP server and route handlers.
//!
//! Exposes the access gate and the turn pipeline as one handler per user
//! action. Every handler answers with a JSON view model of the session.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod view;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
