// src/store.rs

//! Persistence boundary.
//! The engine reads relationship, open loops, threads and promises through
//! [`PersistenceStore`] and never talks to a database directly.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{EngineError, Result};
use crate::open_loops::OpenLoop;
use crate::promises::Promise;
use crate::relationship::RelationshipMetrics;
use crate::threads::OngoingThread;

/// Trait for any persistence backend holding per-user persona state.
#[async_trait]
pub trait PersistenceStore: Send + Sync {
    /// `Ok(None)` when the user has no relationship record yet.
    async fn get_relationship(&self, user_id: &str) -> Result<Option<RelationshipMetrics>>;

    async fn get_open_loops(&self, user_id: &str) -> Result<Vec<OpenLoop>>;

    async fn get_threads(&self, user_id: &str) -> Result<Vec<OngoingThread>>;

    async fn get_promises(&self, user_id: &str) -> Result<Vec<Promise>>;

    /// Insert or replace by id.
    async fn save_open_loop(&self, user_id: &str, open_loop: &OpenLoop) -> Result<()>;

    async fn save_thread(&self, user_id: &str, thread: &OngoingThread) -> Result<()>;

    async fn save_promise(&self, user_id: &str, promise: &Promise) -> Result<()>;
}

// ============================================================================
// Snapshot fetch
// ============================================================================

/// Everything composition needs from the store for one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSnapshot {
    pub relationship: RelationshipMetrics,
    pub open_loops: Vec<OpenLoop>,
    pub threads: Vec<OngoingThread>,
    pub promises: Vec<Promise>,
    /// At least one input fell back to its default
    pub degraded: bool,
}

impl StateSnapshot {
    /// Stranger relationship, nothing pending
    pub fn empty() -> Self {
        Self {
            relationship: RelationshipMetrics::stranger(),
            open_loops: Vec::new(),
            threads: Vec::new(),
            promises: Vec::new(),
            degraded: false,
        }
    }
}

/// Run one store call under `limit`, mapping expiry to [`EngineError::Timeout`].
pub(crate) async fn with_timeout<T, F>(input: &'static str, limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(EngineError::Timeout(input)),
    }
}

async fn fetch_or_default<T, F>(
    input: &'static str,
    user_id: &str,
    limit: Duration,
    fut: F,
    degraded: &mut bool,
) -> T
where
    T: Default,
    F: Future<Output = Result<T>>,
{
    match with_timeout(input, limit, fut).await {
        Ok(value) => value,
        Err(e) => {
            warn!(input, user_id, error = %e, "State fetch failed, using default");
            *degraded = true;
            T::default()
        }
    }
}

/// Fetch all four inputs concurrently, each under `limit`.
///
/// If the parallel batch fails, every input is fetched again one at a time
/// and any input that still fails is replaced by its default (stranger
/// relationship, empty lists). Never fails.
pub async fn fetch_snapshot(store: &dyn PersistenceStore, user_id: &str, limit: Duration) -> StateSnapshot {
    let batch = async {
        tokio::try_join!(
            with_timeout("relationship", limit, store.get_relationship(user_id)),
            with_timeout("open_loops", limit, store.get_open_loops(user_id)),
            with_timeout("threads", limit, store.get_threads(user_id)),
            with_timeout("promises", limit, store.get_promises(user_id)),
        )
    };

    match batch.await {
        Ok((relationship, open_loops, threads, promises)) => {
            debug!(user_id, "State fetched in parallel");
            StateSnapshot {
                relationship: relationship.unwrap_or_else(RelationshipMetrics::stranger),
                open_loops,
                threads,
                promises,
                degraded: false,
            }
        }
        Err(e) => {
            warn!(user_id, error = %e, "Parallel state fetch failed, falling back to sequential");
            let mut degraded = false;
            let relationship: Option<RelationshipMetrics> =
                fetch_or_default("relationship", user_id, limit, store.get_relationship(user_id), &mut degraded)
                    .await;
            let open_loops =
                fetch_or_default("open_loops", user_id, limit, store.get_open_loops(user_id), &mut degraded).await;
            let threads = fetch_or_default("threads", user_id, limit, store.get_threads(user_id), &mut degraded).await;
            let promises =
                fetch_or_default("promises", user_id, limit, store.get_promises(user_id), &mut degraded).await;

            StateSnapshot {
                relationship: relationship.unwrap_or_else(RelationshipMetrics::stranger),
                open_loops,
                threads,
                promises,
                degraded,
            }
        }
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Stored state for one user; also the JSON fixture format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserState {
    pub relationship: Option<RelationshipMetrics>,
    pub open_loops: Vec<OpenLoop>,
    pub threads: Vec<OngoingThread>,
    pub promises: Vec<Promise>,
}

/// Reference store backed by a map. Used by tests and the preview binary.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<String, UserState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: HashMap<String, UserState>) -> Self {
        Self {
            users: RwLock::new(users),
        }
    }

    /// Load a `{ "user_id": UserState, ... }` JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let users: HashMap<String, UserState> = serde_json::from_str(json)?;
        Ok(Self::with_users(users))
    }

    pub fn insert_user(&self, user_id: impl Into<String>, state: UserState) {
        self.users.write().insert(user_id.into(), state);
    }

    pub fn user(&self, user_id: &str) -> Option<UserState> {
        self.users.read().get(user_id).cloned()
    }

    fn upsert<T, K>(items: &mut Vec<T>, item: &T, key: K)
    where
        T: Clone,
        K: Fn(&T) -> &str,
    {
        match items.iter_mut().find(|existing| key(existing) == key(item)) {
            Some(existing) => *existing = item.clone(),
            None => items.push(item.clone()),
        }
    }
}

#[async_trait]
impl PersistenceStore for InMemoryStore {
    async fn get_relationship(&self, user_id: &str) -> Result<Option<RelationshipMetrics>> {
        Ok(self.users.read().get(user_id).and_then(|u| u.relationship.clone()))
    }

    async fn get_open_loops(&self, user_id: &str) -> Result<Vec<OpenLoop>> {
        Ok(self.users.read().get(user_id).map(|u| u.open_loops.clone()).unwrap_or_default())
    }

    async fn get_threads(&self, user_id: &str) -> Result<Vec<OngoingThread>> {
        Ok(self.users.read().get(user_id).map(|u| u.threads.clone()).unwrap_or_default())
    }

    async fn get_promises(&self, user_id: &str) -> Result<Vec<Promise>> {
        Ok(self.users.read().get(user_id).map(|u| u.promises.clone()).unwrap_or_default())
    }

    async fn save_open_loop(&self, user_id: &str, open_loop: &OpenLoop) -> Result<()> {
        let mut users = self.users.write();
        let user = users.entry(user_id.to_string()).or_default();
        Self::upsert(&mut user.open_loops, open_loop, |l| l.id.as_str());
        Ok(())
    }

    async fn save_thread(&self, user_id: &str, thread: &OngoingThread) -> Result<()> {
        let mut users = self.users.write();
        let user = users.entry(user_id.to_string()).or_default();
        Self::upsert(&mut user.threads, thread, |t| t.id.as_str());
        Ok(())
    }

    async fn save_promise(&self, user_id: &str, promise: &Promise) -> Result<()> {
        let mut users = self.users.write();
        let user = users.entry(user_id.to_string()).or_default();
        Self::upsert(&mut user.promises, promise, |p| p.id.as_str());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OpenLoopConfig;
    use crate::open_loops::LoopType;
    use chrono::{TimeZone, Utc};

    /// Wraps an in-memory store and breaks selected fetches
    struct FlakyStore {
        inner: InMemoryStore,
        fail_threads: bool,
        slow_promises: bool,
    }

    #[async_trait]
    impl PersistenceStore for FlakyStore {
        async fn get_relationship(&self, user_id: &str) -> Result<Option<RelationshipMetrics>> {
            self.inner.get_relationship(user_id).await
        }
        async fn get_open_loops(&self, user_id: &str) -> Result<Vec<OpenLoop>> {
            self.inner.get_open_loops(user_id).await
        }
        async fn get_threads(&self, user_id: &str) -> Result<Vec<OngoingThread>> {
            if self.fail_threads {
                return Err(EngineError::Store("threads table locked".into()));
            }
            self.inner.get_threads(user_id).await
        }
        async fn get_promises(&self, user_id: &str) -> Result<Vec<Promise>> {
            if self.slow_promises {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            self.inner.get_promises(user_id).await
        }
        async fn save_open_loop(&self, user_id: &str, open_loop: &OpenLoop) -> Result<()> {
            self.inner.save_open_loop(user_id, open_loop).await
        }
        async fn save_thread(&self, user_id: &str, thread: &OngoingThread) -> Result<()> {
            self.inner.save_thread(user_id, thread).await
        }
        async fn save_promise(&self, user_id: &str, promise: &Promise) -> Result<()> {
            self.inner.save_promise(user_id, promise).await
        }
    }

    fn seeded() -> InMemoryStore {
        let now = Utc.with_ymd_and_hms(2025, 2, 1, 10, 0, 0).unwrap();
        let store = InMemoryStore::new();
        store.insert_user(
            "ana",
            UserState {
                relationship: Some(RelationshipMetrics::from_scores(20.0, 0.5, 0.5, 0.5, 0.5, 12)),
                open_loops: vec![OpenLoop::new(
                    "job interview",
                    LoopType::PendingEvent,
                    0.7,
                    now,
                    &OpenLoopConfig::default(),
                )],
                threads: Vec::new(),
                promises: vec![Promise::new("follow_up", "ask about the interview", now)],
            },
        );
        store
    }

    #[tokio::test]
    async fn test_unknown_user_gets_stranger_defaults() {
        let store = InMemoryStore::new();
        let snapshot = fetch_snapshot(&store, "nobody", Duration::from_millis(200)).await;
        assert_eq!(snapshot, StateSnapshot::empty());
    }

    #[tokio::test]
    async fn test_parallel_fetch() {
        let store = seeded();
        let snapshot = fetch_snapshot(&store, "ana", Duration::from_millis(200)).await;
        assert!(!snapshot.degraded);
        assert_eq!(snapshot.relationship.tier, crate::relationship::RelationshipTier::Friend);
        assert_eq!(snapshot.open_loops.len(), 1);
        assert_eq!(snapshot.promises.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_input_defaults_individually() {
        let store = FlakyStore {
            inner: seeded(),
            fail_threads: true,
            slow_promises: false,
        };
        let snapshot = fetch_snapshot(&store, "ana", Duration::from_millis(200)).await;
        assert!(snapshot.degraded);
        assert!(snapshot.threads.is_empty());
        assert_eq!(snapshot.open_loops.len(), 1);
        assert_eq!(snapshot.promises.len(), 1);
        assert_eq!(snapshot.relationship.total_interactions, 12);
    }

    #[tokio::test]
    async fn test_slow_input_times_out_to_default() {
        let store = FlakyStore {
            inner: seeded(),
            fail_threads: false,
            slow_promises: true,
        };
        let snapshot = fetch_snapshot(&store, "ana", Duration::from_millis(50)).await;
        assert!(snapshot.degraded);
        assert!(snapshot.promises.is_empty());
        assert_eq!(snapshot.open_loops.len(), 1);
    }

    #[tokio::test]
    async fn test_save_upserts_by_id() {
        let store = seeded();
        let mut open_loop = store.get_open_loops("ana").await.unwrap().remove(0);
        open_loop.surface_count = 1;
        store.save_open_loop("ana", &open_loop).await.unwrap();

        let loops = store.get_open_loops("ana").await.unwrap();
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].surface_count, 1);
    }

    #[test]
    fn test_from_json_fixture() {
        let json = r#"{
            "ana": {
                "relationship": {
                    "warmth_score": 0.6, "trust_score": 0.5, "playfulness_score": 0.7,
                    "stability_score": 0.5, "tier": "close_friend", "familiarity_stage": "established"
                }
            }
        }"#;
        let store = InMemoryStore::from_json(json).unwrap();
        let user = store.user("ana").unwrap();
        assert_eq!(
            user.relationship.unwrap().tier,
            crate::relationship::RelationshipTier::CloseFriend
        );
        assert!(user.open_loops.is_empty());
        assert!(InMemoryStore::from_json("not json").is_err());
    }

    #[test]
    fn test_from_json_tolerates_loose_tier_labels() {
        let json = r#"{
            "ana": { "relationship": {
                "warmth_score": 0.1, "trust_score": 0.1, "playfulness_score": 0.1,
                "stability_score": 0.1, "tier": "stranger", "familiarity_stage": "early"
            } },
            "bo": { "relationship": {
                "warmth_score": 0.6, "trust_score": 0.6, "playfulness_score": 0.6,
                "stability_score": 0.6, "tier": "Friend", "familiarity_stage": "developing"
            } }
        }"#;
        let store = InMemoryStore::from_json(json).unwrap();
        let tier = |user: &str| store.user(user).unwrap().relationship.unwrap().tier;
        assert_eq!(tier("ana"), crate::relationship::RelationshipTier::Acquaintance);
        assert_eq!(tier("bo"), crate::relationship::RelationshipTier::Friend);
    }
}
