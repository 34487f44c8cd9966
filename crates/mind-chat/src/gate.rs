//! Access gate: shared-passphrase check in front of the chat surface.
//!
//! Input is normalized (case, surrounding punctuation, dictation dots, known
//! mis-transcriptions) before lookup. There is no lockout and no attempt
//! counter; every submission is judged on its own.

use std::collections::HashMap;
use std::sync::Arc;

use mind_core::config::AccessConfig;
use mind_core::Session;
use mind_voice::{RecordedAudio, SpeechToText};

/// Result of one gate submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Passphrase accepted; the session is bound to `user`. `heard` holds
    /// the raw transcription when the passphrase was spoken.
    Granted { user: String, heard: Option<String> },
    /// Passphrase not in the table. `attempted` is the normalized input.
    Denied { attempted: String },
    /// Nothing usable was submitted (blank text or an unintelligible recording).
    NoAttempt,
}

impl GateDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, GateDecision::Granted { .. })
    }
}

/// Reduce a passphrase to its comparable form.
///
/// Lower-cases, trims, drops trailing punctuation (ASCII and the `…`
/// ellipsis) and leading `¡`/`¿`, and removes the periods dictation tends
/// to insert.
pub fn canonical(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let stripped = lowered
        .trim_start_matches(|c: char| c == '¡' || c == '¿' || c.is_whitespace())
        .trim_end_matches(|c: char| c.is_ascii_punctuation() || c == '…' || c.is_whitespace());
    stripped
        .chars()
        .filter(|c| *c != '.')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Read-only passphrase → display name table, plus alias corrections.
#[derive(Debug, Clone, Default)]
pub struct CredentialTable {
    entries: HashMap<String, String>,
    aliases: HashMap<String, String>,
}

impl CredentialTable {
    /// Build a table; keys and aliases are canonicalized once here.
    pub fn new<K, A>(keys: K, aliases: A) -> Self
    where
        K: IntoIterator<Item = (String, String)>,
        A: IntoIterator<Item = (String, String)>,
    {
        let entries = keys
            .into_iter()
            .map(|(k, name)| (canonical(&k), name))
            .filter(|(k, _)| !k.is_empty())
            .collect();
        let aliases = aliases
            .into_iter()
            .map(|(from, to)| (canonical(&from), canonical(&to)))
            .filter(|(from, _)| !from.is_empty())
            .collect();
        Self { entries, aliases }
    }

    pub fn from_config(access: &AccessConfig) -> Self {
        Self::new(access.keys.clone(), access.aliases.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Canonical form of `raw` with alias corrections applied.
    pub fn normalize(&self, raw: &str) -> String {
        let key = canonical(raw);
        match self.aliases.get(&key) {
            Some(target) => target.clone(),
            None => key,
        }
    }

    /// Display name for an already-normalized passphrase.
    pub fn lookup(&self, normalized: &str) -> Option<&str> {
        self.entries.get(normalized).map(String::as_str)
    }
}

/// Validates credentials and binds sessions to identities.
pub struct AccessGate {
    table: CredentialTable,
    transcriber: Arc<dyn SpeechToText>,
}

impl AccessGate {
    pub fn new(table: CredentialTable, transcriber: Arc<dyn SpeechToText>) -> Self {
        Self { table, transcriber }
    }

    pub fn table(&self) -> &CredentialTable {
        &self.table
    }

    /// Judge a raw passphrase without touching any session.
    pub fn check(&self, raw: &str) -> GateDecision {
        let normalized = self.table.normalize(raw);
        if normalized.is_empty() {
            return GateDecision::NoAttempt;
        }
        match self.table.lookup(&normalized) {
            Some(user) => GateDecision::Granted {
                user: user.to_string(),
                heard: None,
            },
            None => GateDecision::Denied {
                attempted: normalized,
            },
        }
    }

    /// Typed login. Binds the session on success.
    pub fn login_typed(&self, session: &mut Session, passphrase: &str) -> GateDecision {
        let decision = self.check(passphrase);
        self.apply(session, &decision, false);
        decision
    }

    /// Spoken login: transcribe, then judge the transcription.
    ///
    /// A failed or empty transcription is `NoAttempt`, never a denial.
    pub async fn login_spoken(&self, session: &mut Session, audio: &RecordedAudio) -> GateDecision {
        let heard = match self.transcriber.transcribe(audio).await {
            Ok(Some(text)) => text,
            Ok(None) => {
                tracing::info!(session = %session.id, "Spoken login not understood");
                return GateDecision::NoAttempt;
            }
            Err(e) => {
                tracing::warn!(session = %session.id, error = %e, "Spoken login transcription failed");
                return GateDecision::NoAttempt;
            }
        };
        let decision = match self.check(&heard) {
            GateDecision::Granted { user, .. } => GateDecision::Granted {
                user,
                heard: Some(heard),
            },
            other => other,
        };
        self.apply(session, &decision, true);
        decision
    }

    fn apply(&self, session: &mut Session, decision: &GateDecision, spoken: bool) {
        match decision {
            GateDecision::Granted { user, .. } => {
                session.sign_in(user.clone());
                tracing::info!(session = %session.id, user = %user, spoken, "Access granted");
            }
            GateDecision::Denied { .. } => {
                tracing::info!(session = %session.id, spoken, "Access denied");
            }
            GateDecision::NoAttempt => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mind_voice::MockTranscriber;

    fn table() -> CredentialTable {
        CredentialTable::from_config(&AccessConfig::default())
    }

    fn gate_hearing(stt: MockTranscriber) -> AccessGate {
        AccessGate::new(table(), Arc::new(stt))
    }

    fn gate() -> AccessGate {
        gate_hearing(MockTranscriber::silent())
    }

    fn clip() -> RecordedAudio {
        RecordedAudio::new(vec![0u8; 32], "audio/wav")
    }

    #[test]
    fn test_canonical() {
        assert_eq!(canonical("  DEMO. "), "demo");
        assert_eq!(canonical("Demo!!"), "demo");
        assert_eq!(canonical("¿demo?"), "demo");
        assert_eq!(canonical("De.mo"), "demo");
        assert_eq!(canonical("..."), "");
        assert_eq!(canonical("Sol y Luna"), "sol y luna");
        assert_eq!(canonical("Demo…"), "demo");
        assert_eq!(canonical("demo… "), "demo");
    }

    #[test]
    fn test_any_casing_and_trailing_period_granted() {
        let gate = gate();
        for input in ["demo", "DEMO", "Demo", "dEmO.", "DEMO.", " demo "] {
            assert_eq!(
                gate.check(input),
                GateDecision::Granted {
                    user: "Usuario Demo".to_string(),
                    heard: None,
                },
                "input {:?}",
                input
            );
        }
    }

    #[test]
    fn test_plural_alias_collapses() {
        let gate = gate();
        assert!(gate.check("demos").is_granted());
        assert!(gate.check("Demos.").is_granted());
    }

    #[test]
    fn test_unknown_passphrase_denied() {
        let gate = gate();
        assert_eq!(
            gate.check("Sol"),
            GateDecision::Denied {
                attempted: "sol".to_string()
            }
        );
    }

    #[test]
    fn test_blank_is_no_attempt() {
        let gate = gate();
        assert_eq!(gate.check(""), GateDecision::NoAttempt);
        assert_eq!(gate.check("  . "), GateDecision::NoAttempt);
    }

    #[test]
    fn test_configured_keys_are_case_insensitive() {
        let table = CredentialTable::new(
            [("Luna".to_string(), "Luna Pérez".to_string())],
            std::iter::empty(),
        );
        let gate = AccessGate::new(table, Arc::new(MockTranscriber::silent()));
        assert_eq!(
            gate.check("LUNA."),
            GateDecision::Granted {
                user: "Luna Pérez".to_string(),
                heard: None,
            }
        );
        assert!(!gate.check("demo").is_granted());
    }

    #[test]
    fn test_login_typed_binds_session() {
        let gate = gate();
        let mut session = Session::new("s1");
        assert!(gate.login_typed(&mut session, "DEMO").is_granted());
        assert_eq!(session.active_user(), Some("Usuario Demo"));
    }

    #[test]
    fn test_repeated_denials_are_independent() {
        let gate = gate();
        let mut session = Session::new("s1");
        let first = gate.login_typed(&mut session, "sol");
        let second = gate.login_typed(&mut session, "sol");
        assert_eq!(first, second);
        assert!(!session.is_signed_in());

        // No lockout: a correct key still works afterwards.
        assert!(gate.login_typed(&mut session, "demo").is_granted());
    }

    #[tokio::test]
    async fn test_login_spoken_grants_on_transcription() {
        let gate = gate_hearing(MockTranscriber::hearing("Demos."));
        let mut session = Session::new("s1");
        let decision = gate.login_spoken(&mut session, &clip()).await;
        assert_eq!(
            decision,
            GateDecision::Granted {
                user: "Usuario Demo".to_string(),
                heard: Some("Demos.".to_string()),
            }
        );
        assert_eq!(session.active_user(), Some("Usuario Demo"));
    }

    #[tokio::test]
    async fn test_login_spoken_dictated_ellipsis_granted() {
        let gate = gate_hearing(MockTranscriber::hearing("Demo…"));
        let mut session = Session::new("s1");
        assert!(gate.login_spoken(&mut session, &clip()).await.is_granted());
        assert_eq!(session.active_user(), Some("Usuario Demo"));
    }

    #[tokio::test]
    async fn test_login_spoken_unintelligible_is_no_attempt() {
        let gate = gate_hearing(MockTranscriber::silent());
        let mut session = Session::new("s1");
        assert_eq!(
            gate.login_spoken(&mut session, &clip()).await,
            GateDecision::NoAttempt
        );
        assert!(!session.is_signed_in());
    }

    #[tokio::test]
    async fn test_login_spoken_transcription_error_is_no_attempt() {
        let gate = gate_hearing(MockTranscriber::hearing("demo"));
        let mut session = Session::new("s1");
        let empty = RecordedAudio::new(Vec::new(), "audio/wav");
        assert_eq!(
            gate.login_spoken(&mut session, &empty).await,
            GateDecision::NoAttempt
        );
    }

    #[tokio::test]
    async fn test_login_spoken_wrong_word_denied() {
        let gate = gate_hearing(MockTranscriber::hearing("Hola."));
        let mut session = Session::new("s1");
        assert_eq!(
            gate.login_spoken(&mut session, &clip()).await,
            GateDecision::Denied {
                attempted: "hola".to_string()
            }
        );
        assert!(!session.is_signed_in());
    }
}
