use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use rand::Rng;
use tracing::warn;

use crate::models::UserId;

/// Maps opaque cookie tokens to logged-in users.
pub trait SessionStore: Send + Sync {
    fn get(&self, token: &str) -> Option<UserId>;

    fn set(&self, token: String, user_id: UserId);

    fn remove(&self, token: &str);

    /// Drop expired sessions, returning how many were removed
    fn cleanup_expired(&self) -> usize;
}

/// Session entry with TTL
#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub user_id: UserId,
    pub created_at: Instant,
    pub ttl: Duration,
}

impl SessionEntry {
    pub fn new(user_id: UserId, ttl: Duration) -> Self {
        Self {
            user_id,
            created_at: Instant::now(),
            ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }
}

/// In-process session table. Sessions do not survive a restart.
#[derive(Debug)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    ttl: Duration,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(7 * 24 * 60 * 60))
    }
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Entries are inserted whole, so a poisoned table is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, SessionEntry>> {
        self.sessions.read().unwrap_or_else(|poisoned| {
            warn!("Session table lock was poisoned, recovering");
            PoisonError::into_inner(poisoned)
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, SessionEntry>> {
        self.sessions.write().unwrap_or_else(|poisoned| {
            warn!("Session table lock was poisoned, recovering");
            PoisonError::into_inner(poisoned)
        })
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, token: &str) -> Option<UserId> {
        let sessions = self.read();
        let entry = sessions.get(token)?;

        if entry.is_expired() {
            return None;
        }

        Some(entry.user_id)
    }

    fn set(&self, token: String, user_id: UserId) {
        self.write().insert(token, SessionEntry::new(user_id, self.ttl));
    }

    fn remove(&self, token: &str) {
        self.write().remove(token);
    }

    fn cleanup_expired(&self) -> usize {
        let mut sessions = self.write();
        let before = sessions.len();
        sessions.retain(|_, entry| !entry.is_expired());
        before - sessions.len()
    }
}

/// 32 random bytes, hex encoded
pub fn new_session_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}
