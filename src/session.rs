//! Per-user dialogue sessions.
//!
//! Sessions live in a keyed in-memory store with TTL pruning instead of a
//! process-global map. Each session sits behind its own mutex so rapid
//! duplicate events from one user are serialized, not raced.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use crate::flow::FlowState;
use crate::model::{IataCode, RankedResultSet};

/// One user's dialogue state.
#[derive(Debug, Clone)]
pub struct UserSession {
    pub state: FlowState,
    pub origin: Option<IataCode>,
    pub destination: Option<IataCode>,
    pub depart_date: Option<chrono::NaiveDate>,
    pub return_date: Option<chrono::NaiveDate>,
    pub results: RankedResultSet,
    /// Zero-based page over the tier-visible range.
    pub page: usize,
    pub selected_offer: Option<usize>,
    pub is_paid_tier: bool,
    /// Bumped on every new search and every reset. In-flight searches
    /// compare against it before applying late results.
    pub search_generation: u64,
    pub last_active: DateTime<Utc>,
}

impl Default for UserSession {
    fn default() -> Self {
        Self {
            state: FlowState::default(),
            origin: None,
            destination: None,
            depart_date: None,
            return_date: None,
            results: RankedResultSet::default(),
            page: 0,
            selected_offer: None,
            is_paid_tier: false,
            search_generation: 0,
            last_active: Utc::now(),
        }
    }
}

impl UserSession {
    /// Discard all dialogue fields, invalidating any in-flight search.
    pub fn reset(&mut self) {
        let generation = self.search_generation + 1;
        *self = Self::default();
        self.search_generation = generation;
    }

    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }
}

/// Keyed session repository with TTL-based eviction.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<UserSession>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Get the session for a user, creating it on first interaction.
    pub async fn get_or_create(&self, user_id: &str) -> Arc<Mutex<UserSession>> {
        if let Some(session) = self.sessions.read().await.get(user_id) {
            return Arc::clone(session);
        }
        let mut sessions = self.sessions.write().await;
        Arc::clone(
            sessions
                .entry(user_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(UserSession::default()))),
        )
    }

    /// Drop sessions idle longer than `ttl`. Sessions currently locked by a
    /// handler are kept. Returns the number pruned.
    pub async fn prune_idle(&self, ttl: Duration) -> usize {
        let Some(cutoff) = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|d| Utc::now().checked_sub_signed(d))
        else {
            return 0;
        };

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| match session.try_lock() {
            Ok(guard) => guard.last_active >= cutoff,
            Err(_) => true,
        });
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_or_create_returns_same_session() {
        let store = SessionStore::new();
        let a = store.get_or_create("42").await;
        let b = store.get_or_create("42").await;
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn reset_discards_fields_and_bumps_generation() {
        let store = SessionStore::new();
        let session = store.get_or_create("42").await;
        {
            let mut s = session.lock().await;
            s.origin = Some(IataCode::parse("TAS").unwrap());
            s.page = 2;
            s.search_generation = 5;
            s.reset();
            assert!(s.origin.is_none());
            assert_eq!(s.page, 0);
            assert_eq!(s.state, FlowState::Idle);
            assert_eq!(s.search_generation, 6);
        }
    }

    #[tokio::test]
    async fn prune_drops_only_idle_sessions() {
        let store = SessionStore::new();
        let stale = store.get_or_create("stale").await;
        store.get_or_create("fresh").await;
        {
            let mut s = stale.lock().await;
            s.last_active = Utc::now() - chrono::Duration::hours(2);
        }

        let pruned = store.prune_idle(Duration::from_secs(3600)).await;
        assert_eq!(pruned, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn prune_skips_locked_sessions() {
        let store = SessionStore::new();
        let session = store.get_or_create("busy").await;
        {
            let mut s = session.lock().await;
            s.last_active = Utc::now() - chrono::Duration::hours(2);
        }
        let _guard = session.lock().await;

        let pruned = store.prune_idle(Duration::from_secs(3600)).await;
        assert_eq!(pruned, 0);
        assert_eq!(store.len().await, 1);
    }
}
