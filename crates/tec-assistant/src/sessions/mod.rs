//! Conversation history keyed by session id
//!
//! The store is injected into the server state. Entries expire after a
//! period of inactivity, the number of live sessions is capped (the least
//! recently active session is evicted first) and each history keeps only its
//! newest messages.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use crate::config::SessionConfig;
use crate::types::ChatMessage;

/// Storage for per-session transcripts
pub trait SessionStore: Send + Sync {
    /// Stored history for `id`; empty when unknown or expired
    fn history(&self, id: &str) -> Vec<ChatMessage>;

    /// Append messages to a session, creating it when needed
    fn append(&self, id: &str, messages: Vec<ChatMessage>);

    /// Drop a session; `false` when it did not exist
    fn remove(&self, id: &str) -> bool;

    /// Number of stored sessions, expired ones included until purged
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every expired session and return how many were removed
    fn purge_expired(&self) -> usize;
}

#[derive(Debug, Clone)]
struct SessionEntry {
    messages: Vec<ChatMessage>,
    last_active: DateTime<Utc>,
}

/// In-process session store backed by a sharded map
pub struct InMemorySessionStore {
    sessions: DashMap<String, SessionEntry>,
    ttl: Duration,
    max_sessions: usize,
    max_messages: usize,
}

impl InMemorySessionStore {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl: Duration::seconds(config.ttl_secs.min(u64::from(u32::MAX)) as i64),
            max_sessions: config.max_sessions.max(1),
            max_messages: config.max_messages.max(1),
        }
    }

    fn is_expired(&self, entry: &SessionEntry, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(entry.last_active) > self.ttl
    }

    /// Evict the least recently active session
    fn evict_oldest(&self) {
        let oldest = self
            .sessions
            .iter()
            .min_by_key(|entry| entry.value().last_active)
            .map(|entry| entry.key().clone());

        if let Some(id) = oldest {
            tracing::debug!("Session store full, evicting {}", id);
            self.sessions.remove(&id);
        }
    }

    #[cfg(test)]
    fn backdate(&self, id: &str, by: Duration) {
        if let Some(mut entry) = self.sessions.get_mut(id) {
            entry.last_active = entry.last_active - by;
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(&SessionConfig::default())
    }
}

impl SessionStore for InMemorySessionStore {
    fn history(&self, id: &str) -> Vec<ChatMessage> {
        let now = Utc::now();
        let expired = match self.sessions.get(id) {
            Some(entry) if !self.is_expired(&entry, now) => return entry.messages.clone(),
            Some(_) => true,
            None => false,
        };

        if expired {
            tracing::debug!("Session {} expired", id);
            self.sessions.remove(id);
        }
        Vec::new()
    }

    fn append(&self, id: &str, messages: Vec<ChatMessage>) {
        let now = Utc::now();

        // an expired session starts over
        self.sessions
            .remove_if(id, |_, entry| self.is_expired(entry, now));

        if !self.sessions.contains_key(id) && self.sessions.len() >= self.max_sessions {
            self.purge_expired();
            if self.sessions.len() >= self.max_sessions {
                self.evict_oldest();
            }
        }

        let mut entry = self.sessions.entry(id.to_string()).or_insert_with(|| SessionEntry {
            messages: Vec::new(),
            last_active: now,
        });
        entry.messages.extend(messages);
        let overflow = entry.messages.len().saturating_sub(self.max_messages);
        if overflow > 0 {
            entry.messages.drain(..overflow);
        }
        entry.last_active = now;
    }

    fn remove(&self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }

    fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, entry| !self.is_expired(entry, now));
        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            tracing::info!("Purged {} expired sessions", removed);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(max_sessions: usize, max_messages: usize) -> InMemorySessionStore {
        InMemorySessionStore::new(&SessionConfig {
            ttl_secs: 60,
            max_sessions,
            max_messages,
            purge_interval_secs: 30,
        })
    }

    fn turn(text: &str) -> Vec<ChatMessage> {
        vec![ChatMessage::user(text), ChatMessage::assistant(format!("re: {}", text))]
    }

    #[test]
    fn test_append_and_history() {
        let store = store(10, 10);
        assert!(store.history("a").is_empty());

        store.append("a", turn("hello"));
        store.append("a", turn("fees?"));

        let history = store.history("a");
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].text(), Some("hello"));
        assert_eq!(history[3].text(), Some("re: fees?"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_history_cap_drops_oldest() {
        let store = store(10, 3);
        store.append("a", turn("one"));
        store.append("a", turn("two"));

        let history = store.history("a");
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].text(), Some("re: one"));
        assert_eq!(history[2].text(), Some("re: two"));
    }

    #[test]
    fn test_expired_session_is_absent() {
        let store = store(10, 10);
        store.append("a", turn("hello"));
        store.backdate("a", Duration::seconds(120));

        assert!(store.history("a").is_empty());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_append_to_expired_session_starts_over() {
        let store = store(10, 10);
        store.append("a", turn("old"));
        store.backdate("a", Duration::seconds(120));
        store.append("a", turn("new"));

        let history = store.history("a");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].text(), Some("new"));
    }

    #[test]
    fn test_capacity_evicts_least_recently_active() {
        let store = store(2, 10);
        store.append("a", turn("first"));
        store.append("b", turn("second"));
        store.backdate("a", Duration::seconds(10));
        store.backdate("b", Duration::seconds(20));

        store.append("c", turn("third"));

        assert_eq!(store.len(), 2);
        assert!(store.history("b").is_empty());
        assert!(!store.history("a").is_empty());
        assert!(!store.history("c").is_empty());
    }

    #[test]
    fn test_purge_expired() {
        let store = store(10, 10);
        store.append("a", turn("one"));
        store.append("b", turn("two"));
        store.backdate("a", Duration::seconds(61));

        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.purge_expired(), 0);
    }

    #[test]
    fn test_remove() {
        let store = store(10, 10);
        store.append("a", turn("one"));
        assert!(store.remove("a"));
        assert!(!store.remove("a"));
        assert!(store.is_empty());
    }
}
