// src/spontaneity/state.rs
// Session-scoped conversation state feeding the spontaneity engine

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::utils::push_bounded;

pub const TOPICS_CAP: usize = 20;
pub const RECENT_KINDS_CAP: usize = 10;
/// Laughter counts as "recent" for this long
pub const LAUGHTER_WINDOW_MINUTES: i64 = 5;

/// Kinds of unprompted behavior the persona can initiate
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SpontaneousKind {
    AssociativeLeap,
    SpontaneousHumor,
    SuddenCuriosity,
    TopicShift,
    SpontaneousShare,
    CheckIn,
    Selfie,
    Other(String),
}

impl SpontaneousKind {
    pub fn as_str(&self) -> &str {
        match self {
            SpontaneousKind::AssociativeLeap => "associative_leap",
            SpontaneousKind::SpontaneousHumor => "spontaneous_humor",
            SpontaneousKind::SuddenCuriosity => "sudden_curiosity",
            SpontaneousKind::TopicShift => "topic_shift",
            SpontaneousKind::SpontaneousShare => "spontaneous_share",
            SpontaneousKind::CheckIn => "check_in",
            SpontaneousKind::Selfie => "spontaneous_selfie",
            SpontaneousKind::Other(s) => s.as_str(),
        }
    }

    /// Parse a kind name. Unknown names are kept verbatim as `Other`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "associative_leap" => SpontaneousKind::AssociativeLeap,
            "spontaneous_humor" | "humor" => SpontaneousKind::SpontaneousHumor,
            "sudden_curiosity" | "curiosity" => SpontaneousKind::SuddenCuriosity,
            "topic_shift" => SpontaneousKind::TopicShift,
            "spontaneous_share" | "share" => SpontaneousKind::SpontaneousShare,
            "check_in" | "checkin" => SpontaneousKind::CheckIn,
            "spontaneous_selfie" | "selfie" => SpontaneousKind::Selfie,
            _ => {
                debug!(kind = s, "Unrecognized spontaneous kind, keeping as-is");
                SpontaneousKind::Other(s.trim().to_string())
            }
        }
    }

    /// One-line nudge describing what this kind of moment looks like
    pub fn prompt_hint(&self) -> &str {
        match self {
            SpontaneousKind::AssociativeLeap => "connect two things you've talked about in a way they wouldn't expect",
            SpontaneousKind::SpontaneousHumor => "crack a joke or riff on something funny",
            SpontaneousKind::SuddenCuriosity => "ask about something that just made you curious",
            SpontaneousKind::TopicShift => "steer somewhere new if the current topic has run dry",
            SpontaneousKind::SpontaneousShare => "share something from your own day without being asked",
            SpontaneousKind::CheckIn => "check in on how they're actually doing",
            SpontaneousKind::Selfie => "send a selfie of what you're up to",
            SpontaneousKind::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for SpontaneousKind {
    fn from(s: String) -> Self {
        SpontaneousKind::parse(&s)
    }
}

impl From<SpontaneousKind> for String {
    fn from(kind: SpontaneousKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for SpontaneousKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-session conversation state. Reset at session start, never shared
/// between sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub messages_count: u32,
    /// Insertion-ordered, most recent at the back, no duplicates
    pub topics_discussed: VecDeque<String>,
    pub last_laughter_at: Option<DateTime<Utc>>,
    pub last_spontaneous_moment: Option<DateTime<Utc>>,
    pub recent_spontaneous_types: VecDeque<SpontaneousKind>,
    pub last_spontaneous_selfie: Option<DateTime<Utc>>,
    pub session_started_at: DateTime<Utc>,
}

impl ConversationState {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            messages_count: 0,
            topics_discussed: VecDeque::with_capacity(TOPICS_CAP),
            last_laughter_at: None,
            last_spontaneous_moment: None,
            recent_spontaneous_types: VecDeque::with_capacity(RECENT_KINDS_CAP),
            last_spontaneous_selfie: None,
            session_started_at: now,
        }
    }

    pub fn reset(&mut self, now: DateTime<Utc>) {
        *self = Self::new(now);
    }

    /// Count one user message and note its topics.
    ///
    /// Re-mentioning a topic moves it to the most-recent end; past the cap the
    /// oldest topics are dropped.
    pub fn track_message<S: AsRef<str>>(&mut self, topics: &[S]) {
        self.messages_count = self.messages_count.saturating_add(1);
        for topic in topics {
            let topic = topic.as_ref().trim();
            if topic.is_empty() {
                continue;
            }
            if let Some(pos) = self.topics_discussed.iter().position(|t| t == topic) {
                self.topics_discussed.remove(pos);
            }
            push_bounded(&mut self.topics_discussed, topic.to_string(), TOPICS_CAP);
        }
    }

    pub fn track_laughter(&mut self, now: DateTime<Utc>) {
        self.last_laughter_at = Some(now);
    }

    pub fn has_recent_laughter(&self, now: DateTime<Utc>) -> bool {
        self.last_laughter_at.is_some_and(|at| {
            let since = now - at;
            since >= Duration::zero() && since <= Duration::minutes(LAUGHTER_WINDOW_MINUTES)
        })
    }

    pub fn record_spontaneous_action(&mut self, kind: SpontaneousKind, now: DateTime<Utc>) {
        if kind == SpontaneousKind::Selfie {
            self.last_spontaneous_selfie = Some(now);
        }
        self.last_spontaneous_moment = Some(now);
        push_bounded(&mut self.recent_spontaneous_types, kind, RECENT_KINDS_CAP);
    }

    /// Whether `kind` is among the last `lookback` recorded moments
    pub fn used_recently(&self, kind: &SpontaneousKind, lookback: usize) -> bool {
        self.recent_spontaneous_types.iter().rev().take(lookback).any(|k| k == kind)
    }

    pub fn minutes_since_last_moment(&self, now: DateTime<Utc>) -> Option<i64> {
        self.last_spontaneous_moment.map(|at| (now - at).num_minutes().max(0))
    }
}
