// src/open_loops.rs
//! Open loops: things the persona means to circle back to.
//!
//! A loop surfaces when it is active, due, not expired and has not hit its
//! surfacing budget. Loops that use up the budget stay active but dormant
//! until resolved or expired. Resolution is exact string match on the topic.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::OpenLoopConfig;
use crate::utils::{clamp_or, window_days};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopType {
    /// Something is scheduled to happen ("my interview is Thursday")
    PendingEvent,
    /// They were going through something; ask how it went
    EmotionalFollowup,
    /// They said they'd do something
    CommitmentCheck,
    /// The persona wants to know more
    CuriosityThread,
}

impl LoopType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoopType::PendingEvent => "pending_event",
            LoopType::EmotionalFollowup => "emotional_followup",
            LoopType::CommitmentCheck => "commitment_check",
            LoopType::CuriosityThread => "curiosity_thread",
        }
    }

    /// How the follow-up should be phrased to the model
    pub fn prompt_hint(&self) -> &'static str {
        match self {
            LoopType::PendingEvent => "Ask how it went, or whether it's happened yet.",
            LoopType::EmotionalFollowup => "Check in gently on how they're feeling about it now.",
            LoopType::CommitmentCheck => "Casually ask whether they got around to it. No nagging.",
            LoopType::CuriosityThread => "You genuinely want to hear more about this.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopStatus {
    Active,
    Resolved,
    Dismissed,
    Expired,
}

/// How a loop is being closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionType {
    Resolved,
    Dismissed,
}

impl From<ResolutionType> for LoopStatus {
    fn from(resolution: ResolutionType) -> Self {
        match resolution {
            ResolutionType::Resolved => LoopStatus::Resolved,
            ResolutionType::Dismissed => LoopStatus::Dismissed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenLoop {
    pub id: String,
    pub topic: String,
    pub loop_type: LoopType,
    /// 0.0 ..= 1.0
    pub salience: f64,
    pub status: LoopStatus,
    #[serde(default)]
    pub surface_count: u32,
    pub max_surfaces: u32,
    pub should_surface_after: DateTime<Utc>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_surfaced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub resolution_reason: Option<String>,
}

impl OpenLoop {
    /// New active loop, due immediately, expiring after the configured window
    pub fn new(
        topic: impl Into<String>,
        loop_type: LoopType,
        salience: f64,
        now: DateTime<Utc>,
        config: &OpenLoopConfig,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            topic: topic.into(),
            loop_type,
            salience: clamp_or("salience", salience, 0.0, 1.0, 0.0),
            status: LoopStatus::Active,
            surface_count: 0,
            max_surfaces: config.default_max_surfaces,
            should_surface_after: now,
            expires_at: now.checked_add_signed(window_days(config.default_expiry_days)),
            last_surfaced_at: None,
            created_at: now,
            resolution_reason: None,
        }
    }

    pub fn with_surface_after(mut self, at: DateTime<Utc>) -> Self {
        self.should_surface_after = at;
        self
    }

    pub fn with_expiry(mut self, at: Option<DateTime<Utc>>) -> Self {
        self.expires_at = at;
        self
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// Active but out of surfacing budget
    pub fn is_dormant(&self) -> bool {
        self.status == LoopStatus::Active && self.surface_count >= self.max_surfaces
    }

    pub fn is_surfaceable(&self, now: DateTime<Utc>) -> bool {
        self.status == LoopStatus::Active
            && self.should_surface_after <= now
            && self.surface_count < self.max_surfaces
            && !self.is_expired_at(now)
    }
}

/// Ranking used for surfacing: higher salience first, then older first.
fn surfacing_order(a: &OpenLoop, b: &OpenLoop) -> Ordering {
    a.salience
        .total_cmp(&b.salience)
        .then_with(|| b.created_at.cmp(&a.created_at))
}

/// Highest-salience loop ready to surface, ties to the earliest created.
pub fn top_loop_to_surface(loops: &[OpenLoop], now: DateTime<Utc>) -> Option<&OpenLoop> {
    loops
        .iter()
        .filter(|l| l.is_surfaceable(now))
        .max_by(|a, b| surfacing_order(a, b))
}

/// Owns one user's loops for the duration of a mutation.
#[derive(Debug, Clone, Default)]
pub struct OpenLoopTracker {
    loops: Vec<OpenLoop>,
}

impl OpenLoopTracker {
    pub fn new(loops: Vec<OpenLoop>) -> Self {
        Self { loops }
    }

    pub fn loops(&self) -> &[OpenLoop] {
        &self.loops
    }

    pub fn get(&self, id: &str) -> Option<&OpenLoop> {
        self.loops.iter().find(|l| l.id == id)
    }

    pub fn top_loop_to_surface(&self, now: DateTime<Utc>) -> Option<&OpenLoop> {
        top_loop_to_surface(&self.loops, now)
    }

    /// Record that a loop was brought up. Only surfaceable loops count.
    pub fn mark_surfaced(&mut self, id: &str, now: DateTime<Utc>) -> bool {
        let Some(open_loop) = self.loops.iter_mut().find(|l| l.id == id) else {
            debug!(loop_id = id, "mark_surfaced: no such loop");
            return false;
        };
        if !open_loop.is_surfaceable(now) {
            debug!(loop_id = id, status = ?open_loop.status, "mark_surfaced: loop not surfaceable");
            return false;
        }

        open_loop.surface_count += 1;
        open_loop.last_surfaced_at = Some(now);
        if open_loop.is_dormant() {
            info!(loop_id = id, topic = %open_loop.topic, "Open loop reached its surfacing limit");
        }
        true
    }

    /// Close every active loop whose topic is exactly `topic`.
    ///
    /// Returns the ids that changed. No trimming, no case folding.
    pub fn resolve(&mut self, topic: &str, resolution: ResolutionType, reason: Option<&str>) -> Vec<String> {
        let mut changed = Vec::new();
        for open_loop in self
            .loops
            .iter_mut()
            .filter(|l| l.status == LoopStatus::Active && l.topic == topic)
        {
            open_loop.status = resolution.into();
            open_loop.resolution_reason = reason.map(str::to_string);
            changed.push(open_loop.id.clone());
        }

        if changed.is_empty() {
            debug!(topic, "resolve: no active loop with this exact topic");
        } else {
            info!(topic, ?resolution, count = changed.len(), "Resolved open loop");
        }
        changed
    }

    /// Move active loops past their expiry to `Expired`. Returns the ids that changed.
    pub fn expire_stale(&mut self, now: DateTime<Utc>) -> Vec<String> {
        let mut changed = Vec::new();
        for open_loop in self
            .loops
            .iter_mut()
            .filter(|l| l.status == LoopStatus::Active && l.is_expired_at(now))
        {
            open_loop.status = LoopStatus::Expired;
            changed.push(open_loop.id.clone());
        }
        if !changed.is_empty() {
            debug!(count = changed.len(), "Expired stale open loops");
        }
        changed
    }
}
