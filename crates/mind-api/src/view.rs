//! View models rendered after every user action.

use base64::Engine;
use chrono::{DateTime, Utc};
use mind_core::{Mode, Role, Session, Turn};
use serde::{Deserialize, Serialize};

/// Prefix shown before user messages that were spoken.
pub const SPOKEN_PREFIX: &str = "🎤 ";

/// MIME type of synthesized replies.
pub const AUDIO_FORMAT: &str = "audio/mpeg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A one-off message shown above the input row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeView {
    pub id: String,
    pub label: String,
    pub caption: String,
}

impl From<Mode> for ModeView {
    fn from(mode: Mode) -> Self {
        Self {
            id: mode.as_str().to_string(),
            label: mode.label().to_string(),
            caption: mode.caption().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnView {
    pub role: Role,
    pub text: String,
    /// Text as rendered in the transcript (spoken input gets a mic prefix).
    pub display: String,
    pub spoken: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub audio_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub audio_format: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Turn> for TurnView {
    fn from(turn: &Turn) -> Self {
        let display = if turn.role == Role::User && turn.spoken {
            format!("{}{}", SPOKEN_PREFIX, turn.text)
        } else {
            turn.text.clone()
        };
        let audio_base64 = turn
            .audio
            .as_ref()
            .map(|bytes| base64::engine::general_purpose::STANDARD.encode(bytes));
        Self {
            role: turn.role,
            text: turn.text.clone(),
            display,
            spoken: turn.spoken,
            audio_format: audio_base64.as_ref().map(|_| AUDIO_FORMAT.to_string()),
            audio_base64,
            created_at: turn.created_at,
        }
    }
}

/// Everything a client needs to draw the current screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    /// Signed-in display name; `None` means the gate is showing.
    pub user: Option<String>,
    pub greeting: Option<String>,
    pub mode: ModeView,
    pub transcript: Vec<TurnView>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub notice: Option<Notice>,
}

impl SessionView {
    pub fn render(session: &Session, notice: Option<Notice>) -> Self {
        Self {
            user: session.active_user().map(str::to_string),
            greeting: session.active_user().map(|u| format!("Hola, {}", u)),
            mode: session.mode.into(),
            transcript: session.transcript().iter().map(TurnView::from).collect(),
            notice,
        }
    }
}
