// src/promises.rs
// Promises the persona made to the user - pending until fulfilled, never reopened

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Promise {
    pub id: String,
    /// e.g. "follow_up", "share_something", "remind"
    pub promise_type: String,
    pub description: String,
    /// What the promise is waiting on ("after their interview")
    #[serde(default)]
    pub trigger_event: Option<String>,
    pub estimated_timing: DateTime<Utc>,
    #[serde(default)]
    pub fulfilled: bool,
    #[serde(default)]
    pub fulfilled_at: Option<DateTime<Utc>>,
}

impl Promise {
    pub fn new(
        promise_type: impl Into<String>,
        description: impl Into<String>,
        estimated_timing: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            promise_type: promise_type.into(),
            description: description.into(),
            trigger_event: None,
            estimated_timing,
            fulfilled: false,
            fulfilled_at: None,
        }
    }

    pub fn with_trigger(mut self, trigger_event: impl Into<String>) -> Self {
        self.trigger_event = Some(trigger_event.into());
        self
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.fulfilled && self.estimated_timing <= now
    }
}

/// Unfulfilled promises whose time has come, oldest first.
pub fn due_promises(promises: &[Promise], now: DateTime<Utc>) -> Vec<&Promise> {
    let mut due: Vec<&Promise> = promises.iter().filter(|p| p.is_due(now)).collect();
    due.sort_by_key(|p| p.estimated_timing);
    due
}

#[derive(Debug, Clone, Default)]
pub struct PromiseTracker {
    promises: Vec<Promise>,
}

impl PromiseTracker {
    pub fn new(promises: Vec<Promise>) -> Self {
        Self { promises }
    }

    pub fn promises(&self) -> &[Promise] {
        &self.promises
    }

    pub fn get(&self, id: &str) -> Option<&Promise> {
        self.promises.iter().find(|p| p.id == id)
    }

    pub fn due(&self, now: DateTime<Utc>) -> Vec<&Promise> {
        due_promises(&self.promises, now)
    }

    /// Mark a promise kept. Returns false if it is unknown or already kept.
    pub fn fulfill(&mut self, id: &str, now: DateTime<Utc>) -> bool {
        let Some(promise) = self.promises.iter_mut().find(|p| p.id == id) else {
            debug!(promise_id = id, "fulfill: no such promise");
            return false;
        };
        if promise.fulfilled {
            debug!(promise_id = id, "fulfill: already fulfilled");
            return false;
        }
        promise.fulfilled = true;
        promise.fulfilled_at = Some(now);
        true
    }
}
