//! In-memory chat sessions

use chrono::{DateTime, Local, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use uuid::Uuid;

/// Timestamp format shown under each message
pub const TIMESTAMP_FORMAT: &str = "%I:%M %p";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One rendered message in a session's history
#[derive(Debug, Clone, Serialize)]
pub struct ChatEntry {
    pub role: ChatRole,
    /// HTML fragment, already escaped
    pub content: String,
    pub timestamp: String,
}

impl ChatEntry {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

/// State of one browser session
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub session_start: DateTime<Utc>,
    pub history: Vec<ChatEntry>,
}

impl Session {
    fn new() -> Self {
        Self {
            user_id: Uuid::new_v4(),
            session_start: Utc::now(),
            history: Vec::new(),
        }
    }
}

struct Slot {
    session: Session,
    last_active: Instant,
}

impl Slot {
    fn new() -> Self {
        Self {
            session: Session::new(),
            last_active: Instant::now(),
        }
    }
}

/// Sessions keyed by the id stored in the session cookie.
///
/// Sessions idle for longer than the TTL are dropped by `purge_expired`;
/// when the store is full the least recently active session is evicted.
pub struct SessionStore {
    sessions: DashMap<Uuid, Slot>,
    ttl: Duration,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    /// Return `id` if it names a live session, otherwise start a new one
    pub fn resolve(&self, id: Option<Uuid>) -> Uuid {
        if let Some(id) = id {
            if let Some(mut slot) = self.sessions.get_mut(&id) {
                slot.last_active = Instant::now();
                return id;
            }
        }

        self.make_room();
        let id = Uuid::new_v4();
        self.sessions.insert(id, Slot::new());
        id
    }

    pub fn get(&self, id: &Uuid) -> Option<Session> {
        self.sessions.get(id).map(|slot| slot.session.clone())
    }

    pub fn push(&self, id: &Uuid, entry: ChatEntry) {
        if !self.sessions.contains_key(id) {
            self.make_room();
        }
        let mut slot = self.sessions.entry(*id).or_insert_with(Slot::new);
        slot.last_active = Instant::now();
        slot.session.history.push(entry);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop sessions idle for longer than the TTL; returns how many went
    pub fn purge_expired(&self) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, slot| slot.last_active.elapsed() <= self.ttl);
        let purged = before.saturating_sub(self.sessions.len());
        if purged > 0 {
            debug!("Purged {} idle sessions", purged);
        }
        purged
    }

    fn make_room(&self) {
        if self.sessions.len() < self.max_sessions {
            return;
        }
        self.purge_expired();

        while self.sessions.len() >= self.max_sessions {
            let oldest = self
                .sessions
                .iter()
                .min_by_key(|entry| entry.value().last_active)
                .map(|entry| *entry.key());
            match oldest {
                Some(id) => {
                    self.sessions.remove(&id);
                }
                None => break,
            }
        }
    }

    /// Start a background task that drops idle sessions
    pub fn start_cleanup_task(self: &Arc<Self>, every: Duration) {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let purged = store.purge_expired();
                if purged > 0 {
                    info!("Expired {} chat sessions (TTL {}s)", purged, store.ttl.as_secs());
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SessionStore {
        SessionStore::new(Duration::from_secs(3600), 100)
    }

    #[test]
    fn test_resolve_reuses_known_sessions() {
        let store = store();
        let id = store.resolve(None);
        assert_eq!(store.resolve(Some(id)), id);
        assert_eq!(store.len(), 1);

        let other = store.resolve(Some(Uuid::new_v4()));
        assert_ne!(other, id);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_history_is_kept_in_order() {
        let store = store();
        let id = store.resolve(None);
        store.push(&id, ChatEntry::new(ChatRole::User, "hello"));
        store.push(&id, ChatEntry::new(ChatRole::Assistant, "hi"));

        let session = store.get(&id).unwrap();
        assert_eq!(session.history.len(), 2);
        assert_eq!(session.history[0].role, ChatRole::User);
        assert_eq!(session.history[1].content, "hi");
        assert!(session.history[0].timestamp.ends_with("AM") || session.history[0].timestamp.ends_with("PM"));
    }

    #[test]
    fn test_store_never_exceeds_capacity() {
        let store = SessionStore::new(Duration::from_secs(3600), 3);
        let first = store.resolve(None);
        std::thread::sleep(Duration::from_millis(2));
        for _ in 0..50 {
            store.resolve(None);
        }
        let latest = store.resolve(None);

        assert_eq!(store.len(), 3);
        assert!(store.get(&latest).is_some());
        assert!(store.get(&first).is_none());
    }

    #[test]
    fn test_active_session_survives_eviction() {
        let store = SessionStore::new(Duration::from_secs(3600), 2);
        let kept = store.resolve(None);
        std::thread::sleep(Duration::from_millis(2));
        let idle = store.resolve(None);
        std::thread::sleep(Duration::from_millis(2));
        store.push(&kept, ChatEntry::new(ChatRole::User, "still here"));
        std::thread::sleep(Duration::from_millis(2));

        store.resolve(None);
        assert!(store.get(&kept).is_some());
        assert!(store.get(&idle).is_none());
    }

    #[test]
    fn test_idle_sessions_expire() {
        let store = SessionStore::new(Duration::from_millis(20), 100);
        let id = store.resolve(None);
        assert_eq!(store.purge_expired(), 0);

        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(store.purge_expired(), 1);
        assert!(store.is_empty());
        assert_ne!(store.resolve(Some(id)), id);
    }
}
