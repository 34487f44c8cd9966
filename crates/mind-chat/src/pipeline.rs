//! Turn pipeline: resolve input, pick the instruction, generate, optionally
//! synthesize, append.

use std::sync::Arc;

use mind_core::{Session, Turn};
use mind_voice::{RecordedAudio, SpeechToText, SynthesisChain};

use crate::error::ChatError;
use crate::generation::ChatGenerator;
use crate::prompt::build_prompt;

/// Maximum typed message length in characters.
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// Raw user input for one turn.
#[derive(Debug, Clone)]
pub enum TurnInput {
    Typed(String),
    Spoken(RecordedAudio),
}

/// What a turn produced. Only `Replied` appends an assistant turn.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// Reply generated and appended. `voice` names the provider that
    /// rendered the audio, if any.
    Replied { reply: Turn, voice: Option<String> },
    /// The recording could not be understood; nothing was appended.
    Inaudible,
    /// The generation service failed; the user turn stays, no reply.
    GenerationFailed { message: String },
}

/// Runs one user turn against a signed-in session.
pub struct TurnPipeline {
    transcriber: Arc<dyn SpeechToText>,
    generator: Arc<dyn ChatGenerator>,
    synthesis: SynthesisChain,
}

impl TurnPipeline {
    pub fn new(
        transcriber: Arc<dyn SpeechToText>,
        generator: Arc<dyn ChatGenerator>,
        synthesis: SynthesisChain,
    ) -> Self {
        Self {
            transcriber,
            generator,
            synthesis,
        }
    }

    pub fn synthesis(&self) -> &SynthesisChain {
        &self.synthesis
    }

    /// Process one turn.
    ///
    /// Typed input never reaches a synthesis provider. Spoken input that
    /// transcribes successfully triggers exactly one generation call and at
    /// most one attempt per synthesis provider, in chain order.
    pub async fn run(
        &self,
        session: &mut Session,
        input: TurnInput,
    ) -> Result<TurnOutcome, ChatError> {
        if !session.is_signed_in() {
            return Err(ChatError::NotSignedIn);
        }

        let (text, spoken) = match input {
            TurnInput::Typed(raw) => (validate_typed(&raw)?, false),
            TurnInput::Spoken(audio) => match self.resolve_spoken(session, &audio).await {
                Some(text) => (text, true),
                None => return Ok(TurnOutcome::Inaudible),
            },
        };

        session.append(Turn::user(text.clone(), spoken))?;

        let prompt = build_prompt(session.mode, &text);
        let reply_text = match self.generator.generate(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(session = %session.id, error = %e, "Generation failed");
                return Ok(TurnOutcome::GenerationFailed {
                    message: e.to_string(),
                });
            }
        };

        let synthesized = if spoken {
            self.synthesis.synthesize(&reply_text).await
        } else {
            None
        };
        let voice = synthesized.as_ref().map(|a| a.provider.clone());
        let reply = Turn::assistant(reply_text, synthesized.map(|a| a.bytes));
        session.append(reply.clone())?;

        tracing::info!(
            session = %session.id,
            mode = session.mode.as_str(),
            spoken,
            voice = voice.as_deref().unwrap_or("none"),
            turns = session.transcript().len(),
            "Turn completed"
        );
        Ok(TurnOutcome::Replied { reply, voice })
    }

    async fn resolve_spoken(&self, session: &Session, audio: &RecordedAudio) -> Option<String> {
        match self.transcriber.transcribe(audio).await {
            Ok(Some(text)) => Some(text),
            Ok(None) => {
                tracing::info!(session = %session.id, "Recording not understood; turn dropped");
                None
            }
            Err(e) => {
                tracing::warn!(session = %session.id, error = %e, "Transcription failed; turn dropped");
                None
            }
        }
    }
}

fn validate_typed(raw: &str) -> Result<String, ChatError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(ChatError::EmptyMessage);
    }
    if text.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(ChatError::MessageTooLong(MAX_MESSAGE_LENGTH));
    }
    Ok(text.to_string())
}
