//! Application state shared across all route handlers.
//!
//! AppState holds references to all services and shared resources.
//! It is passed to handlers via axum's State extractor.

use std::sync::Arc;
use std::time::{Duration, Instant};

use mind_chat::{AccessGate, CredentialTable, OpenAiGenerator, SessionStore, TurnPipeline};
use mind_core::config::MindConfig;
use mind_core::error::MindError;
use mind_voice::{OpenAiTranscriber, SynthesisChain};

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks. Session
/// state lives in the store, each session behind its own lock.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration (read-only after startup).
    pub config: Arc<MindConfig>,
    /// Passphrase gate for typed and spoken login.
    pub gate: Arc<AccessGate>,
    /// Turn pipeline (transcribe, generate, synthesize).
    pub pipeline: Arc<TurnPipeline>,
    /// Live sessions keyed by bearer token.
    pub sessions: Arc<SessionStore>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Create a new AppState with the given components.
    pub fn new(config: MindConfig, gate: AccessGate, pipeline: TurnPipeline) -> Self {
        let idle = Duration::from_secs(config.server.session_idle_secs);
        Self {
            config: Arc::new(config),
            gate: Arc::new(gate),
            pipeline: Arc::new(pipeline),
            sessions: Arc::new(SessionStore::with_idle_timeout(idle)),
            start_time: Instant::now(),
        }
    }

    /// Wire the production service clients from configuration.
    ///
    /// The gate and the pipeline share one transcriber.
    pub fn from_config(config: MindConfig) -> Result<Self, MindError> {
        let transcriber = Arc::new(OpenAiTranscriber::from_config(&config)?);
        let generator = Arc::new(OpenAiGenerator::from_config(&config)?);
        let synthesis = SynthesisChain::from_config(&config)?;
        tracing::info!(
            model = generator.model(),
            voices = ?synthesis.provider_names(),
            "Service clients ready"
        );

        let gate = AccessGate::new(CredentialTable::from_config(&config.access), transcriber.clone());
        let pipeline = TurnPipeline::new(transcriber, generator, synthesis);
        Ok(Self::new(config, gate, pipeline))
    }
}
