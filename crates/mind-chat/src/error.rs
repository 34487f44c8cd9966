//! Error types for the conversational core.

use mind_core::error::MindError;

/// Errors from the gate, the pipeline and the session store.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("sign in before chatting")]
    NotSignedIn,
    #[error("generation error: {0}")]
    Generation(String),
    #[error("session error: {0}")]
    Session(String),
}

impl From<MindError> for ChatError {
    fn from(err: MindError) -> Self {
        ChatError::Session(err.to_string())
    }
}

impl From<ChatError> for MindError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Generation(msg) => MindError::Generation(msg),
            other => MindError::Session(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        assert_eq!(ChatError::EmptyMessage.to_string(), "message cannot be empty");
        assert_eq!(
            ChatError::MessageTooLong(2000).to_string(),
            "message exceeds maximum length of 2000 characters"
        );
        assert_eq!(ChatError::NotSignedIn.to_string(), "sign in before chatting");
        assert_eq!(
            ChatError::Generation("rate limited".to_string()).to_string(),
            "generation error: rate limited"
        );
    }

    #[test]
    fn test_conversions_with_mind_error() {
        let err: ChatError = MindError::Session("locked".to_string()).into();
        assert!(matches!(err, ChatError::Session(_)));

        let err: MindError = ChatError::Generation("503".to_string()).into();
        assert!(matches!(err, MindError::Generation(_)));

        let err: MindError = ChatError::NotSignedIn.into();
        assert!(matches!(err, MindError::Session(_)));
    }
}
