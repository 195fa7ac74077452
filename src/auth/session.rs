// src/auth/session.rs
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use uuid::Uuid;

use super::identity::Identity;

pub const SESSION_COOKIE: &str = "kube_gate_session";

/// What a session remembers: who authenticated, through which context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub identity: Identity,
    pub context: String,
    pub created_at: DateTime<Utc>,
}

/// In-memory session table keyed by random session ids.
///
/// The cookie only ever carries the id; identities stay server side.
pub struct SessionStore {
    ttl: Duration,
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl SessionStore {
    pub fn new(ttl: std::time::Duration) -> Self {
        Self {
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::days(365)),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn create(&self, identity: Identity, context: impl Into<String>) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let session = Session {
            identity,
            context: context.into(),
            created_at: now,
        };

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.retain(|_, s| !self.is_expired(s, now));
        sessions.insert(id, session);
        id
    }

    /// Looks up the session behind a cookie value.
    ///
    /// Malformed, unknown and expired ids all come back as `None`.
    pub fn identity(&self, token: &str) -> Option<Session> {
        let id = Uuid::parse_str(token).ok()?;
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        sessions
            .get(&id)
            .filter(|s| !self.is_expired(s, Utc::now()))
            .cloned()
    }

    pub fn remove(&self, token: &str) -> bool {
        let Ok(id) = Uuid::parse_str(token) else {
            return false;
        };
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_expired(&self, session: &Session, now: DateTime<Utc>) -> bool {
        now - session.created_at >= self.ttl
    }
}
