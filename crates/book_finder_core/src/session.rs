//! crates/book_finder_core/src/session.rs
//!
//! Per-user pending search state. A `/search` command stores the query here and
//! the following format choice takes it out again.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Identifies one user within one chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub chat_id: i64,
    pub user_id: i64,
}

/// A query waiting for its format choice.
#[derive(Debug, Clone)]
pub struct PendingSearch {
    pub query: String,
    pub created_at: DateTime<Utc>,
}

/// In-memory store of pending searches with a fixed time-to-live.
pub struct SessionStore {
    ttl: Duration,
    pending: Mutex<HashMap<SessionKey, PendingSearch>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Records `query` for `key`, replacing any earlier pending search.
    pub async fn start(&self, key: SessionKey, query: String) {
        self.start_at(key, query, Utc::now()).await;
    }

    pub async fn start_at(&self, key: SessionKey, query: String, now: DateTime<Utc>) {
        let mut pending = self.pending.lock().await;
        pending.retain(|_, search| !self.is_expired(search, now));
        pending.insert(
            key,
            PendingSearch {
                query,
                created_at: now,
            },
        );
    }

    /// Returns the live pending search for `key`, if any, without removing it.
    pub async fn peek(&self, key: SessionKey) -> Option<PendingSearch> {
        self.peek_at(key, Utc::now()).await
    }

    pub async fn peek_at(&self, key: SessionKey, now: DateTime<Utc>) -> Option<PendingSearch> {
        let mut pending = self.pending.lock().await;
        let search = pending.get(&key)?.clone();
        if self.is_expired(&search, now) {
            pending.remove(&key);
            return None;
        }
        Some(search)
    }

    /// Removes and returns the live pending search for `key`.
    pub async fn take(&self, key: SessionKey) -> Option<PendingSearch> {
        self.take_at(key, Utc::now()).await
    }

    pub async fn take_at(&self, key: SessionKey, now: DateTime<Utc>) -> Option<PendingSearch> {
        self.pending
            .lock()
            .await
            .remove(&key)
            .filter(|search| !self.is_expired(search, now))
    }

    /// Number of stored entries, expired or not.
    pub async fn len(&self) -> usize {
        self.pending.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn is_expired(&self, search: &PendingSearch, now: DateTime<Utc>) -> bool {
        now - search.created_at > self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: SessionKey = SessionKey {
        chat_id: 1,
        user_id: 10,
    };
    const BOB: SessionKey = SessionKey {
        chat_id: 1,
        user_id: 20,
    };

    #[tokio::test]
    async fn users_do_not_overwrite_each_other() {
        let store = SessionStore::new(Duration::minutes(10));
        store.start(ALICE, "war and peace".to_string()).await;
        store.start(BOB, "1984 orwell".to_string()).await;

        assert_eq!(store.take(ALICE).await.unwrap().query, "war and peace");
        assert_eq!(store.take(BOB).await.unwrap().query, "1984 orwell");
        assert!(store.take(ALICE).await.is_none());
    }

    #[tokio::test]
    async fn expired_searches_are_gone() {
        let store = SessionStore::new(Duration::minutes(10));
        let start = Utc::now();
        store.start_at(ALICE, "dune".to_string(), start).await;

        let later = start + Duration::minutes(11);
        assert!(store.peek_at(ALICE, later).await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn starting_a_search_purges_expired_entries() {
        let store = SessionStore::new(Duration::seconds(30));
        let start = Utc::now();
        store.start_at(ALICE, "dune".to_string(), start).await;
        store
            .start_at(BOB, "solaris".to_string(), start + Duration::minutes(1))
            .await;

        assert_eq!(store.len().await, 1);
        assert!(store
            .take_at(BOB, start + Duration::minutes(1))
            .await
            .is_some());
    }

    #[tokio::test]
    async fn peek_keeps_the_entry() {
        let store = SessionStore::new(Duration::minutes(10));
        store.start(ALICE, "dune".to_string()).await;
        assert!(store.peek(ALICE).await.is_some());
        assert!(store.take(ALICE).await.is_some());
    }
}
