//! Conversational core of Quantum Mind.
//!
//! Provides the access gate, the per-mode instructions, the generation
//! client, the turn pipeline, and the in-memory session store.

pub mod error;
pub mod gate;
pub mod generation;
pub mod pipeline;
pub mod prompt;
pub mod store;

pub use error::ChatError;
pub use gate::{AccessGate, CredentialTable, GateDecision};
pub use generation::{ChatGenerator, MockGenerator, OpenAiGenerator};
pub use pipeline::{TurnInput, TurnOutcome, TurnPipeline};
pub use prompt::{build_prompt, instruction_for};
pub use store::{SessionHandle, SessionStore};
