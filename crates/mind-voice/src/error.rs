//! Error types for the speech services.

use mind_core::error::MindError;

/// Errors from transcription and synthesis providers.
#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    #[error("voice configuration error: {0}")]
    Config(String),
    #[error("transcription failed: {0}")]
    Transcription(String),
    #[error("synthesis via {provider} failed: {message}")]
    Synthesis { provider: String, message: String },
    #[error("recording is empty")]
    EmptyAudio,
}

impl VoiceError {
    pub(crate) fn synthesis(provider: &str, message: impl Into<String>) -> Self {
        VoiceError::Synthesis {
            provider: provider.to_string(),
            message: message.into(),
        }
    }
}

impl From<VoiceError> for MindError {
    fn from(err: VoiceError) -> Self {
        match err {
            VoiceError::Config(msg) => MindError::Config(msg),
            VoiceError::Transcription(_) | VoiceError::EmptyAudio => {
                MindError::Transcription(err.to_string())
            }
            VoiceError::Synthesis { .. } => MindError::Synthesis(err.to_string()),
        }
    }
}

/// A specialized `Result` type for voice operations.
pub type VoiceResult<T> = std::result::Result<T, VoiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_error_display() {
        let err = VoiceError::Transcription("timeout".to_string());
        assert_eq!(err.to_string(), "transcription failed: timeout");

        let err = VoiceError::synthesis("elevenlabs", "401 Unauthorized");
        assert_eq!(
            err.to_string(),
            "synthesis via elevenlabs failed: 401 Unauthorized"
        );

        assert_eq!(VoiceError::EmptyAudio.to_string(), "recording is empty");
    }

    #[test]
    fn test_voice_error_into_mind_error() {
        let err: MindError = VoiceError::Config("no key".to_string()).into();
        assert!(matches!(err, MindError::Config(_)));

        let err: MindError = VoiceError::EmptyAudio.into();
        assert!(matches!(err, MindError::Transcription(_)));

        let err: MindError = VoiceError::synthesis("openai", "500").into();
        assert!(matches!(err, MindError::Synthesis(_)));
        assert!(err.to_string().contains("openai"));
    }
}
