// src/session.rs
// Per-user session handle - owned by the orchestrator, passed into every call

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::mood::{EmotionalMomentum, MoodState};
use crate::spontaneity::ConversationState;
use crate::utils::local_hour;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub conversation: ConversationState,
    pub momentum: EmotionalMomentum,
    pub mood_state: MoodState,
    /// Persona's local offset, fixed for the lifetime of the session
    pub utc_offset_minutes: i32,
}

impl Session {
    pub fn new(user_id: impl Into<String>, now: DateTime<Utc>, utc_offset_minutes: i32) -> Self {
        Self {
            user_id: user_id.into(),
            conversation: ConversationState::new(now),
            momentum: EmotionalMomentum::default(),
            mood_state: MoodState::for_hour(local_hour(now, utc_offset_minutes)),
            utc_offset_minutes,
        }
    }

    /// Start over as if the user just arrived
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.conversation.reset(now);
        self.momentum = EmotionalMomentum::default();
        self.mood_state = MoodState::for_hour(local_hour(now, self.utc_offset_minutes));
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.conversation.session_started_at
    }
}
