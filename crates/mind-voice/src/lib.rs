//! Speech services for Quantum Mind.
//!
//! Wraps the external speech-to-text endpoint and the text-to-speech
//! providers behind two object-safe traits, plus the ordered fallback chain
//! the turn pipeline uses to render replies as audio.

pub mod chain;
pub mod error;
pub mod mock;
pub mod stt;
pub mod tts;

pub use chain::{SynthesisChain, SynthesizedAudio};
pub use error::{VoiceError, VoiceResult};
pub use mock::{MockSynthesizer, MockTranscriber};
pub use stt::{OpenAiTranscriber, RecordedAudio, SpeechToText};
pub use tts::{ElevenLabsSynthesizer, OpenAiSynthesizer, SpeechSynthesizer};
