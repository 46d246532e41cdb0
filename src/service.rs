// src/service.rs
// Orchestrator-facing entry points: compose per turn, record what happened after

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::mood::{InteractionSignal, Mood, calculate_mood};
use crate::open_loops::{OpenLoop, OpenLoopTracker, ResolutionType, top_loop_to_surface};
use crate::persona::PersonaOverlay;
use crate::promises::{PromiseTracker, due_promises};
use crate::prompt::{CompositionInput, CompositionMode, ToolHint, compose_for_mode};
use crate::relationship::{RelationshipTier, profile};
use crate::session::Session;
use crate::spontaneity::{SpontaneityContext, SpontaneousKind, TurnSituation, build_spontaneity_context};
use crate::store::{PersistenceStore, fetch_snapshot, with_timeout};
use crate::threads::{background_threads, mark_thread_mentioned, select_proactive_thread};

/// What the orchestrator asks for on one turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionRequest {
    pub mode: CompositionMode,
    #[serde(default)]
    pub situation: TurnSituation,
    #[serde(default)]
    pub tools: Vec<ToolHint>,
    /// When the previous session ended, for the greeting
    #[serde(default)]
    pub last_interaction_at: Option<DateTime<Utc>>,
}

impl CompositionRequest {
    pub fn new(mode: CompositionMode) -> Self {
        Self {
            mode,
            situation: TurnSituation::default(),
            tools: Vec::new(),
            last_interaction_at: None,
        }
    }

    pub fn first_contact() -> Self {
        Self::new(CompositionMode::FirstContact)
    }

    pub fn mid_conversation() -> Self {
        Self::new(CompositionMode::MidConversation)
    }

    pub fn with_situation(mut self, situation: TurnSituation) -> Self {
        self.situation = situation;
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolHint>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_last_interaction(mut self, at: DateTime<Utc>) -> Self {
        self.last_interaction_at = Some(at);
        self
    }
}

/// The composed text plus the derived state that went into it
#[derive(Debug, Clone, PartialEq)]
pub struct TurnPreview {
    pub text: String,
    pub tier: RelationshipTier,
    pub mood: Mood,
    pub spontaneity: SpontaneityContext,
    /// Some store input fell back to its default
    pub degraded: bool,
}

/// Main persona service - composes instruction text and applies turn outcomes
pub struct PersonaService {
    store: Arc<dyn PersistenceStore>,
    clock: Arc<dyn Clock>,
    config: Arc<EngineConfig>,
    overlay: PersonaOverlay,
}

impl PersonaService {
    pub fn new(store: Arc<dyn PersistenceStore>, clock: Arc<dyn Clock>, config: Arc<EngineConfig>) -> Self {
        info!(persona = %config.persona.name, "Initializing PersonaService");
        Self {
            store,
            clock,
            config,
            overlay: PersonaOverlay::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fresh session handle for a user who just arrived
    pub fn start_session(&self, user_id: &str) -> Session {
        let now = self.clock.now();
        debug!(user_id, "Starting session");
        Session::new(user_id, now, self.config.persona.utc_offset_minutes)
    }

    // ========================================================================
    // Composition
    // ========================================================================

    /// Compose the instruction text for this turn. Never fails; missing or
    /// slow state degrades to defaults.
    pub async fn compose_instruction_text(&self, session: &Session, request: &CompositionRequest) -> String {
        self.preview_turn(session, request).await.text
    }

    /// Same as [`Self::compose_instruction_text`], also returning the derived state.
    pub async fn preview_turn(&self, session: &Session, request: &CompositionRequest) -> TurnPreview {
        let now = self.clock.now();
        let config = self.config.as_ref();
        let snapshot = fetch_snapshot(self.store.as_ref(), &session.user_id, config.fetch.timeout()).await;

        let tier = snapshot.relationship.tier;
        let mood = calculate_mood(&session.mood_state, &session.momentum, &config.mood)
            .with_relationship(profile(tier));

        let thread = select_proactive_thread(&snapshot.threads, now, &config.threads);
        let spontaneity = build_spontaneity_context(
            tier,
            &mood,
            &request.situation,
            &session.conversation,
            now,
            config,
        );

        let input = CompositionInput {
            overlay: self.overlay,
            config,
            now,
            relationship: &snapshot.relationship,
            mood,
            open_loop: top_loop_to_surface(&snapshot.open_loops, now),
            due_promises: due_promises(&snapshot.promises, now),
            thread,
            background_threads: background_threads(
                &snapshot.threads,
                thread.map(|t| t.id.as_str()),
                now,
                &config.threads,
            ),
            spontaneity: &spontaneity,
            situation: &request.situation,
            tools: &request.tools,
            last_interaction_at: request.last_interaction_at,
        };
        let text = compose_for_mode(request.mode, &input);

        info!(
            user_id = %session.user_id,
            mode = request.mode.as_str(),
            tier = tier.as_str(),
            mood = mood.label.as_str(),
            degraded = snapshot.degraded,
            chars = text.len(),
            "Composed instruction text"
        );

        TurnPreview {
            text,
            tier,
            mood,
            spontaneity,
            degraded: snapshot.degraded,
        }
    }

    // ========================================================================
    // Session mutations
    // ========================================================================

    /// Fold one user interaction into the session
    pub fn record_interaction_signal(&self, session: &mut Session, signal: InteractionSignal) {
        let now = self.clock.now();
        session
            .momentum
            .record(signal.tone, signal.genuine_moment, &self.config.mood);
        session.mood_state.drain_social(&self.config.mood);
        session.conversation.track_message(&signal.topics);
        if signal.laughter {
            session.conversation.track_laughter(now);
        }
        debug!(
            user_id = %session.user_id,
            tone = signal.tone,
            positive_streak = session.momentum.positive_streak,
            negative_streak = session.momentum.negative_streak,
            "Recorded interaction signal"
        );
    }

    /// Note that the persona just did something unprompted
    pub fn record_spontaneous_action(&self, session: &mut Session, kind: &str) {
        let kind = SpontaneousKind::parse(kind);
        debug!(user_id = %session.user_id, kind = %kind, "Recorded spontaneous action");
        session.conversation.record_spontaneous_action(kind, self.clock.now());
    }

    // ========================================================================
    // Store mutations - bounded by the fetch timeout; failures are logged, never propagated
    // ========================================================================

    async fn load_open_loops(&self, user_id: &str) -> Option<OpenLoopTracker> {
        let limit = self.config.fetch.timeout();
        match with_timeout("open_loops", limit, self.store.get_open_loops(user_id)).await {
            Ok(loops) => Some(OpenLoopTracker::new(loops)),
            Err(e) => {
                warn!(user_id, error = %e, "Failed to load open loops");
                None
            }
        }
    }

    /// Run one store write under the fetch timeout. Failures are logged.
    async fn persist<F>(&self, record: &'static str, user_id: &str, record_id: &str, write: F) -> bool
    where
        F: Future<Output = Result<()>>,
    {
        match with_timeout(record, self.config.fetch.timeout(), write).await {
            Ok(()) => true,
            Err(e) => {
                warn!(user_id, record, record_id, error = %e, "Failed to save");
                false
            }
        }
    }

    async fn save_loops(&self, user_id: &str, tracker: &OpenLoopTracker, ids: &[String]) -> bool {
        let mut all_saved = true;
        for open_loop in tracker.loops().iter().filter(|l| ids.contains(&l.id)) {
            let write = self.store.save_open_loop(user_id, open_loop);
            if !self.persist("open_loop", user_id, &open_loop.id, write).await {
                all_saved = false;
            }
        }
        all_saved
    }

    /// Close the active loop(s) whose topic is exactly `topic`.
    pub async fn resolve_open_loop(
        &self,
        user_id: &str,
        topic: &str,
        resolution: ResolutionType,
        reason: Option<&str>,
    ) -> bool {
        let Some(mut tracker) = self.load_open_loops(user_id).await else {
            return false;
        };
        let changed = tracker.resolve(topic, resolution, reason);
        !changed.is_empty() && self.save_loops(user_id, &tracker, &changed).await
    }

    /// Record that the given loop was brought up this turn
    pub async fn mark_loop_surfaced(&self, user_id: &str, loop_id: &str) -> bool {
        let Some(mut tracker) = self.load_open_loops(user_id).await else {
            return false;
        };
        if !tracker.mark_surfaced(loop_id, self.clock.now()) {
            return false;
        }
        self.save_loops(user_id, &tracker, &[loop_id.to_string()]).await
    }

    /// Expire active loops past their deadline. Returns how many changed.
    pub async fn expire_stale_loops(&self, user_id: &str) -> usize {
        let Some(mut tracker) = self.load_open_loops(user_id).await else {
            return 0;
        };
        let changed = tracker.expire_stale(self.clock.now());
        if changed.is_empty() || !self.save_loops(user_id, &tracker, &changed).await {
            return 0;
        }
        changed.len()
    }

    /// Add a new open loop for later follow-up
    pub async fn add_open_loop(&self, user_id: &str, open_loop: &OpenLoop) -> bool {
        let write = self.store.save_open_loop(user_id, open_loop);
        self.persist("open_loop", user_id, &open_loop.id, write).await
    }

    pub async fn mark_thread_mentioned(&self, user_id: &str, thread_id: &str) -> bool {
        let limit = self.config.fetch.timeout();
        let mut threads = match with_timeout("threads", limit, self.store.get_threads(user_id)).await {
            Ok(threads) => threads,
            Err(e) => {
                warn!(user_id, error = %e, "Failed to load threads");
                return false;
            }
        };
        if !mark_thread_mentioned(&mut threads, thread_id, self.clock.now()) {
            return false;
        }

        let Some(thread) = threads.iter().find(|t| t.id == thread_id) else {
            return false;
        };
        let write = self.store.save_thread(user_id, thread);
        self.persist("thread", user_id, thread_id, write).await
    }

    pub async fn fulfill_promise(&self, user_id: &str, promise_id: &str) -> bool {
        let limit = self.config.fetch.timeout();
        let mut tracker = match with_timeout("promises", limit, self.store.get_promises(user_id)).await {
            Ok(promises) => PromiseTracker::new(promises),
            Err(e) => {
                warn!(user_id, error = %e, "Failed to load promises");
                return false;
            }
        };
        if !tracker.fulfill(promise_id, self.clock.now()) {
            return false;
        }

        let Some(promise) = tracker.get(promise_id) else {
            return false;
        };
        let write = self.store.save_promise(user_id, promise);
        let saved = self.persist("promise", user_id, promise_id, write).await;
        if saved {
            info!(user_id, promise_id, "Promise fulfilled");
        }
        saved
    }
}
