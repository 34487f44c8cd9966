use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::MindError;

// =============================================================================
// Enums
// =============================================================================

/// Author of a transcript entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// Conversational stance selected by the signed-in user.
///
/// The stance decides which instruction accompanies every prompt sent to the
/// generation service.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Emotional validation only, no advice.
    #[default]
    EmpatheticListening,
    /// Concrete, brief next steps.
    PracticalAdvice,
}

impl Mode {
    /// All modes in display order.
    pub const ALL: [Mode; 2] = [Mode::EmpatheticListening, Mode::PracticalAdvice];

    /// Label shown in the mode selector.
    pub fn label(self) -> &'static str {
        match self {
            Mode::EmpatheticListening => "Escucha Empática",
            Mode::PracticalAdvice => "Consejo Práctico",
        }
    }

    /// One-line description shown under the selector.
    pub fn caption(self) -> &'static str {
        match self {
            Mode::EmpatheticListening => "Solo validación emocional.",
            Mode::PracticalAdvice => "Soluciones y pasos a seguir.",
        }
    }

    /// Stable identifier used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::EmpatheticListening => "empathetic_listening",
            Mode::PracticalAdvice => "practical_advice",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Mode {
    type Err = MindError;

    /// Accepts either the wire identifier or the display label (any casing).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Mode::ALL
            .into_iter()
            .find(|m| m.as_str() == wanted || m.label().to_lowercase() == wanted)
            .ok_or_else(|| MindError::Config(format!("unknown mode '{}'", s.trim())))
    }
}

// =============================================================================
// Transcript
// =============================================================================

/// One message in the visible transcript. Immutable once appended.
#[derive(Clone, Debug, PartialEq)]
pub struct Turn {
    pub id: Uuid,
    pub role: Role,
    pub text: String,
    /// Encoded audio (MP3) for assistant replies to spoken input.
    pub audio: Option<Vec<u8>>,
    /// Whether the user typed or spoke this input.
    pub spoken: bool,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    /// A user message, typed or transcribed from a recording.
    pub fn user(text: impl Into<String>, spoken: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::User,
            text: text.into(),
            audio: None,
            spoken,
            created_at: Utc::now(),
        }
    }

    /// An assistant reply, optionally carrying synthesized speech.
    pub fn assistant(text: impl Into<String>, audio: Option<Vec<u8>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            text: text.into(),
            audio,
            spoken: false,
            created_at: Utc::now(),
        }
    }
}

// =============================================================================
// Session
// =============================================================================

/// Ephemeral per-connection state.
///
/// A session starts signed out. Only after `sign_in` can turns be appended,
/// so a non-empty transcript always implies an active user.
#[derive(Clone, Debug)]
pub struct Session {
    pub id: String,
    active_user: Option<String>,
    pub mode: Mode,
    transcript: Vec<Turn>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            active_user: None,
            mode: Mode::default(),
            transcript: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn active_user(&self) -> Option<&str> {
        self.active_user.as_deref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.active_user.is_some()
    }

    /// Bind the session to a display name accepted by the access gate.
    pub fn sign_in(&mut self, user: impl Into<String>) {
        self.active_user = Some(user.into());
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    /// Append a turn. Fails while no user is signed in.
    pub fn append(&mut self, turn: Turn) -> Result<(), MindError> {
        if !self.is_signed_in() {
            return Err(MindError::Session(
                "cannot append a turn before sign-in".to_string(),
            ));
        }
        self.transcript.push(turn);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_default_is_empathetic() {
        assert_eq!(Mode::default(), Mode::EmpatheticListening);
    }

    #[test]
    fn test_mode_parses_identifier_and_label() {
        assert_eq!(
            "practical_advice".parse::<Mode>().unwrap(),
            Mode::PracticalAdvice
        );
        assert_eq!(
            "Consejo Práctico".parse::<Mode>().unwrap(),
            Mode::PracticalAdvice
        );
        assert_eq!(
            "  escucha empática ".parse::<Mode>().unwrap(),
            Mode::EmpatheticListening
        );
        assert!("tarot".parse::<Mode>().is_err());
    }

    #[test]
    fn test_mode_serde_uses_snake_case() {
        let json = serde_json::to_string(&Mode::PracticalAdvice).unwrap();
        assert_eq!(json, "\"practical_advice\"");
        let back: Mode = serde_json::from_str("\"empathetic_listening\"").unwrap();
        assert_eq!(back, Mode::EmpatheticListening);
    }

    #[test]
    fn test_mode_display_is_label() {
        assert_eq!(Mode::EmpatheticListening.to_string(), "Escucha Empática");
    }

    #[test]
    fn test_new_session_is_signed_out() {
        let session = Session::new("abc");
        assert!(!session.is_signed_in());
        assert!(session.active_user().is_none());
        assert!(session.transcript().is_empty());
        assert_eq!(session.mode, Mode::EmpatheticListening);
    }

    #[test]
    fn test_append_requires_sign_in() {
        let mut session = Session::new("abc");
        let err = session.append(Turn::user("hola", false)).unwrap_err();
        assert!(matches!(err, MindError::Session(_)));
        assert!(session.transcript().is_empty());

        session.sign_in("Usuario Demo");
        session.append(Turn::user("hola", false)).unwrap();
        session.append(Turn::assistant("te entiendo", None)).unwrap();
        assert_eq!(session.transcript().len(), 2);
        assert_eq!(session.transcript()[0].role, Role::User);
        assert_eq!(session.transcript()[1].role, Role::Assistant);
    }

    #[test]
    fn test_turn_constructors() {
        let user = Turn::user("tuve un mal día", true);
        assert!(user.spoken);
        assert!(user.audio.is_none());

        let reply = Turn::assistant("te entiendo", Some(vec![1, 2, 3]));
        assert_eq!(reply.role, Role::Assistant);
        assert!(!reply.spoken);
        assert_eq!(reply.audio.as_deref(), Some(&[1u8, 2, 3][..]));
    }
}
