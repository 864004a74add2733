//! Live sessions with exclusive per-session updates.
//!
//! Finalization is claimed by removing the entry: exactly one caller gets the
//! session back, so only that caller runs the end-of-session side effects.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::session::Session;

/// Concurrent table of live sessions keyed by identifier.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Registers a live session, replacing any entry with the same id.
    pub fn insert(&self, session: Session) {
        self.sessions.insert(session.id.clone(), session);
    }

    /// Runs `f` with exclusive access to one session.
    ///
    /// Returns `None` if the session is unknown or no longer live.
    pub fn update<R>(&self, id: &str, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        let mut entry = self.sessions.get_mut(id)?;
        if !entry.active {
            return None;
        }
        Some(f(&mut entry))
    }

    /// Cloned snapshot of one session.
    pub fn get(&self, id: &str) -> Option<Session> {
        self.sessions.get(id).map(|r| r.clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    /// Claims a live session for finalization, removing it from the table.
    pub fn claim(&self, id: &str) -> Option<Session> {
        self.sessions
            .remove_if(id, |_, session| session.active)
            .map(|(_, session)| session)
    }

    /// Claims a session only if it is still idle at `now`.
    ///
    /// A heartbeat landing between the scan and the claim keeps the session.
    pub fn claim_if_idle(&self, id: &str, now: DateTime<Utc>, timeout: Duration) -> Option<Session> {
        self.sessions
            .remove_if(id, |_, session| session.is_idle(now, timeout))
            .map(|(_, session)| session)
    }

    /// Identifiers of live sessions idle for longer than `timeout`.
    pub fn idle_ids(&self, now: DateTime<Utc>, timeout: Duration) -> Vec<String> {
        self.sessions
            .iter()
            .filter(|r| r.is_idle(now, timeout))
            .map(|r| r.key().clone())
            .collect()
    }

    /// Point-in-time copy of every live session, ordered by id.
    pub fn snapshot(&self) -> BTreeMap<String, Session> {
        self.sessions
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect()
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Origin;

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn registry_with(ids: &[&str]) -> SessionRegistry {
        let registry = SessionRegistry::new();
        for id in ids {
            registry.insert(Session::new(*id, Origin::default(), t(0)));
        }
        registry
    }

    #[test]
    fn test_update_unknown_session_returns_none() {
        let registry = SessionRegistry::new();
        assert!(registry.update("missing", |s| s.record_scroll(10.0)).is_none());
    }

    #[test]
    fn test_claim_is_exclusive() {
        let registry = registry_with(&["a"]);
        assert!(registry.claim("a").is_some());
        assert!(registry.claim("a").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_concurrent_claims_yield_one_winner() {
        let registry = std::sync::Arc::new(registry_with(&["a"]));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || registry.claim("a").is_some())
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }

    #[test]
    fn test_idle_ids_respect_threshold() {
        let registry = registry_with(&["old", "fresh"]);
        registry.update("fresh", |s| s.touch(t(2)));

        let timeout = Duration::from_secs(30);
        assert_eq!(registry.idle_ids(t(31), timeout), vec!["old".to_string()]);
        assert!(registry.idle_ids(t(29), timeout).is_empty());
    }

    #[test]
    fn test_claim_if_idle_skips_refreshed_session() {
        let registry = registry_with(&["a"]);
        let timeout = Duration::from_secs(30);
        registry.update("a", |s| s.touch(t(20)));
        assert!(registry.claim_if_idle("a", t(31), timeout).is_none());
        assert!(registry.claim_if_idle("a", t(51), timeout).is_some());
    }

    #[test]
    fn test_snapshot_is_ordered_copy() {
        let registry = registry_with(&["b", "a"]);
        let snapshot = registry.snapshot();
        let keys: Vec<_> = snapshot.keys().cloned().collect();
        assert_eq!(keys, vec!["a", "b"]);
    }
}
