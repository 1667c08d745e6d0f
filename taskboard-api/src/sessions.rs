/// Session registry
///
/// Each client context gets its own `SessionStore`, addressed by an opaque
/// bearer token issued when the authentication widget reports a user.
/// Anonymous sessions are never stored.
///
/// # Expiry
///
/// A session that has not been resolved for `idle_timeout` is gone: `resolve`
/// rejects it, and every `open` sweeps all idle entries out of the map.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use serde_json::Value as JsonValue;
use taskboard_shared::auth::{Session, SessionStore, SessionUser};
use tokio::time::Instant;
use uuid::Uuid;

/// Default idle lifetime of a session (1 hour)
pub const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(3600);

/// Authenticated caller, inserted into request extensions by the session layer
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub token: Uuid,
    pub user: SessionUser,
}

#[derive(Debug)]
struct SessionEntry {
    store: Arc<SessionStore>,
    last_seen: Instant,
}

/// Token to session store map
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
    idle_timeout: Duration,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_IDLE)
    }
}

impl SessionRegistry {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Uuid, SessionEntry>> {
        self.sessions.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, SessionEntry>> {
        self.sessions.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_idle(&self, entry: &SessionEntry, now: Instant) -> bool {
        now.duration_since(entry.last_seen) >= self.idle_timeout
    }

    /// Opens a session from a widget payload
    ///
    /// Returns the issued token (only for authenticated sessions) and the
    /// resulting session.
    pub fn open(&self, payload: &JsonValue) -> (Option<Uuid>, Session) {
        let store = Arc::new(SessionStore::new());
        let session = store.set_user(payload);

        if !session.is_authenticated() {
            return (None, session);
        }

        let now = Instant::now();
        let token = Uuid::new_v4();
        let mut sessions = self.write();

        let before = sessions.len();
        sessions.retain(|_, entry| !self.is_idle(entry, now));
        let expired = before - sessions.len();
        if expired > 0 {
            tracing::debug!(expired = expired, "Swept idle sessions");
        }

        sessions.insert(
            token,
            SessionEntry {
                store,
                last_seen: now,
            },
        );
        tracing::debug!(token = %token, "Session opened");
        (Some(token), session)
    }

    /// Authenticated user behind `token`, if any
    ///
    /// Refreshes the session's idle clock; an idle session is dropped instead.
    pub fn resolve(&self, token: &Uuid) -> Option<CurrentSession> {
        let now = Instant::now();
        let mut sessions = self.write();
        let entry = sessions.get_mut(token)?;

        if self.is_idle(entry, now) {
            sessions.remove(token);
            tracing::debug!(token = %token, "Session expired");
            return None;
        }

        entry.last_seen = now;
        match entry.store.snapshot() {
            Session::Authenticated(user) => Some(CurrentSession { token: *token, user }),
            Session::Anonymous => None,
        }
    }

    /// Clears and forgets the session; returns false if the token was unknown
    pub fn close(&self, token: &Uuid) -> bool {
        match self.write().remove(token) {
            Some(entry) => {
                entry.store.clear_user();
                tracing::debug!(token = %token, "Session closed");
                true
            }
            None => false,
        }
    }

    /// Number of stored sessions, idle ones included until swept
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_open_resolve_close() {
        let registry = SessionRegistry::default();
        let (token, session) = registry.open(&json!({ "Id": 1, "name": "Ada" }));
        let token = token.unwrap();

        assert!(session.is_authenticated());
        assert_eq!(registry.resolve(&token).unwrap().user.name, "Ada");

        assert!(registry.close(&token));
        assert!(registry.resolve(&token).is_none());
        assert!(!registry.close(&token));
    }

    #[tokio::test]
    async fn test_anonymous_is_not_stored() {
        let registry = SessionRegistry::default();
        let (token, session) = registry.open(&JsonValue::Null);

        assert!(token.is_none());
        assert!(!session.is_authenticated());
        assert!(registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_session_expires() {
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let (token, _) = registry.open(&json!({ "Id": 1 }));
        let token = token.unwrap();

        tokio::time::advance(Duration::from_secs(45)).await;
        assert!(registry.resolve(&token).is_some());

        // resolving refreshed the idle clock
        tokio::time::advance(Duration::from_secs(45)).await;
        assert!(registry.resolve(&token).is_some());

        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(registry.resolve(&token).is_none());
        assert!(registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_sweeps_idle_sessions() {
        let registry = SessionRegistry::new(Duration::from_secs(60));
        for _ in 0..10 {
            registry.open(&json!({}));
        }
        assert_eq!(registry.len(), 10);

        tokio::time::advance(Duration::from_secs(61)).await;
        let (token, _) = registry.open(&json!({ "Id": 2 }));

        assert_eq!(registry.len(), 1);
        assert!(registry.resolve(&token.unwrap()).is_some());
    }
}
