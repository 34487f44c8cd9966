use thiserror::Error;

/// Top-level error type for Quantum Mind.
///
/// Subsystem crates define their own error types and implement
/// `From<SubsystemError> for MindError` so that `?` works across crate
/// boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MindError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for MindError {
    fn from(err: toml::de::Error) -> Self {
        MindError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for MindError {
    fn from(err: toml::ser::Error) -> Self {
        MindError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for MindError {
    fn from(err: serde_json::Error) -> Self {
        MindError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Quantum Mind operations.
pub type Result<T> = std::result::Result<T, MindError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_all_variants() {
        let cases: Vec<(MindError, &str)> = vec![
            (
                MindError::Config("missing key".to_string()),
                "Configuration error: missing key",
            ),
            (
                MindError::Transcription("empty clip".to_string()),
                "Transcription error: empty clip",
            ),
            (
                MindError::Generation("503".to_string()),
                "Generation error: 503",
            ),
            (
                MindError::Synthesis("quota".to_string()),
                "Synthesis error: quota",
            ),
            (
                MindError::Session("expired".to_string()),
                "Session error: expired",
            ),
            (MindError::Api("bind".to_string()), "API error: bind"),
            (
                MindError::Serialization("invalid json".to_string()),
                "Serialization error: invalid json",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: MindError = io_err.into();
        assert!(matches!(err, MindError::Io(_)));
        assert!(err.to_string().starts_with("I/O error:"));
        assert!(err.to_string().contains("access denied"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let parsed: std::result::Result<toml::Value, _> = toml::from_str("invalid = [[[");
        let err: MindError = parsed.unwrap_err().into();
        assert!(matches!(err, MindError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let parsed: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope }");
        let err: MindError = parsed.unwrap_err().into();
        assert!(matches!(err, MindError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let value = io_result?;
            Ok(value.to_string())
        }

        assert_eq!(inner().unwrap(), "42");
    }
}
