//! In-memory session store keyed by bearer token.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use mind_core::Session;
use rand::Rng;

use crate::error::ChatError;

/// A session behind its own async lock.
///
/// Requests on the same connection queue on this lock, so a session never
/// has two turns in flight. Different sessions never contend.
pub type SessionHandle = Arc<tokio::sync::Mutex<Session>>;

/// Generate a random 32-character hex token.
pub fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    hex::encode(bytes)
}

/// Idle time after which an untouched session is dropped.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

struct Entry {
    handle: SessionHandle,
    last_seen: Instant,
}

/// All live sessions of the process. Nothing survives a restart.
///
/// Clients that walk away without logging out are reclaimed once they have
/// been idle longer than the configured timeout.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Entry>>,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_idle_timeout(DEFAULT_IDLE_TIMEOUT)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_timeout,
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Open a new signed-out session and return its token and handle.
    ///
    /// Idle sessions are swept first so the map cannot grow with abandoned
    /// entries.
    pub fn create(&self) -> Result<(String, SessionHandle), ChatError> {
        let now = Instant::now();
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|e| ChatError::Session(format!("session lock poisoned: {}", e)))?;
        sweep(&mut sessions, now, self.idle_timeout);

        let mut token = generate_token();
        while sessions.contains_key(&token) {
            token = generate_token();
        }
        let handle = Arc::new(tokio::sync::Mutex::new(Session::new(token.clone())));
        sessions.insert(
            token.clone(),
            Entry {
                handle: Arc::clone(&handle),
                last_seen: now,
            },
        );
        tracing::debug!(active = sessions.len(), "Session created");
        Ok((token, handle))
    }

    /// Look up a live session and mark it as seen.
    pub fn get(&self, token: &str) -> Option<SessionHandle> {
        self.get_at(token, Instant::now())
    }

    fn get_at(&self, token: &str, now: Instant) -> Option<SessionHandle> {
        let mut sessions = self.sessions.lock().ok()?;
        let expired = sessions
            .get(token)
            .map(|entry| is_idle(entry, now, self.idle_timeout))?;
        if expired {
            sessions.remove(token);
            tracing::debug!("Idle session expired on access");
            return None;
        }
        let entry = sessions.get_mut(token)?;
        entry.last_seen = now;
        Some(Arc::clone(&entry.handle))
    }

    /// Drop a session. Returns false when the token was unknown.
    pub fn remove(&self, token: &str) -> bool {
        let removed = self
            .sessions
            .lock()
            .map(|mut sessions| sessions.remove(token).is_some())
            .unwrap_or(false);
        if removed {
            tracing::debug!("Session removed");
        }
        removed
    }

    /// Drop every session idle longer than the timeout. Returns how many
    /// were dropped.
    pub fn evict_idle(&self) -> usize {
        self.evict_idle_at(Instant::now())
    }

    fn evict_idle_at(&self, now: Instant) -> usize {
        let evicted = self
            .sessions
            .lock()
            .map(|mut sessions| sweep(&mut sessions, now, self.idle_timeout))
            .unwrap_or(0);
        if evicted > 0 {
            tracing::info!(evicted, "Idle sessions evicted");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn is_idle(entry: &Entry, now: Instant, idle_timeout: Duration) -> bool {
    now.saturating_duration_since(entry.last_seen) > idle_timeout
}

fn sweep(sessions: &mut HashMap<String, Entry>, now: Instant, idle_timeout: Duration) -> usize {
    let before = sessions.len();
    sessions.retain(|_, entry| !is_idle(entry, now, idle_timeout));
    before - sessions.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_shape() {
        let token = generate_token();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_token());
    }

    #[tokio::test]
    async fn test_create_get_remove() {
        let store = SessionStore::new();
        assert!(store.is_empty());

        let (token, handle) = store.create().unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(handle.lock().await.id, token);

        let again = store.get(&token).unwrap();
        assert!(Arc::ptr_eq(&handle, &again));

        assert!(store.remove(&token));
        assert!(!store.remove(&token));
        assert!(store.get(&token).is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = SessionStore::new();
        let (a, handle_a) = store.create().unwrap();
        let (b, handle_b) = store.create().unwrap();
        assert_ne!(a, b);

        handle_a.lock().await.sign_in("Usuario Demo");
        assert!(handle_a.lock().await.is_signed_in());
        assert!(!handle_b.lock().await.is_signed_in());
    }

    #[test]
    fn test_idle_session_is_evicted() {
        let store = SessionStore::with_idle_timeout(Duration::from_secs(60));
        let (idle, _) = store.create().unwrap();
        let (active, _) = store.create().unwrap();

        let later = Instant::now() + Duration::from_secs(45);
        assert!(store.get_at(&active, later).is_some());

        let much_later = later + Duration::from_secs(30);
        assert_eq!(store.evict_idle_at(much_later), 1);
        assert_eq!(store.len(), 1);
        assert!(store.get_at(&idle, much_later).is_none());
        assert!(store.get_at(&active, much_later).is_some());
    }

    #[test]
    fn test_expired_session_rejected_on_access() {
        let store = SessionStore::with_idle_timeout(Duration::from_secs(10));
        let (token, _) = store.create().unwrap();
        let later = Instant::now() + Duration::from_secs(11);
        assert!(store.get_at(&token, later).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_abandoned_sessions_do_not_accumulate() {
        let store = SessionStore::with_idle_timeout(Duration::ZERO);
        for _ in 0..50 {
            store.create().unwrap();
            std::thread::sleep(Duration::from_millis(2));
        }
        // Each create sweeps everything older than the zero timeout.
        assert!(store.len() <= 2);
        assert_eq!(store.idle_timeout(), Duration::ZERO);
    }

    #[test]
    fn test_unknown_token() {
        let store = SessionStore::new();
        assert!(store.get("nope").is_none());
    }
}
