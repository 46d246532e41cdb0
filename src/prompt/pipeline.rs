// src/prompt/pipeline.rs
// Section ordering per composition mode, and the inputs every builder reads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::compose::compose;
use super::sections;
use crate::config::EngineConfig;
use crate::mood::Mood;
use crate::open_loops::OpenLoop;
use crate::persona::PersonaOverlay;
use crate::promises::Promise;
use crate::relationship::RelationshipMetrics;
use crate::spontaneity::{SpontaneityContext, TurnSituation};
use crate::threads::OngoingThread;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositionMode {
    /// First turn of a session: greet, no spontaneity section
    FirstContact,
    MidConversation,
}

impl CompositionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompositionMode::FirstContact => "first_contact",
            CompositionMode::MidConversation => "mid_conversation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "first_contact" | "first" => Some(CompositionMode::FirstContact),
            "mid_conversation" | "mid" => Some(CompositionMode::MidConversation),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Identity,
    Presence,
    Greeting,
    OpenLoop,
    Promises,
    Thread,
    Relationship,
    MoodStyle,
    Spontaneity,
    Tools,
    OutputFormat,
}

// Identity first, then the current situation, then relationship/mood guidance,
// then capabilities. Output format is always last.
const FIRST_CONTACT_PLAN: &[SectionKind] = &[
    SectionKind::Identity,
    SectionKind::Presence,
    SectionKind::Greeting,
    SectionKind::OpenLoop,
    SectionKind::Promises,
    SectionKind::Thread,
    SectionKind::Relationship,
    SectionKind::MoodStyle,
    SectionKind::Tools,
    SectionKind::OutputFormat,
];

const MID_CONVERSATION_PLAN: &[SectionKind] = &[
    SectionKind::Identity,
    SectionKind::Presence,
    SectionKind::OpenLoop,
    SectionKind::Promises,
    SectionKind::Thread,
    SectionKind::Relationship,
    SectionKind::MoodStyle,
    SectionKind::Spontaneity,
    SectionKind::Tools,
    SectionKind::OutputFormat,
];

pub fn section_plan(mode: CompositionMode) -> &'static [SectionKind] {
    match mode {
        CompositionMode::FirstContact => FIRST_CONTACT_PLAN,
        CompositionMode::MidConversation => MID_CONVERSATION_PLAN,
    }
}

/// A capability the model can use this turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolHint {
    pub name: String,
    pub description: String,
}

/// Everything the section builders read. Built once per turn; never mutated
/// during composition.
#[derive(Debug, Clone)]
pub struct CompositionInput<'a> {
    pub overlay: PersonaOverlay,
    pub config: &'a EngineConfig,
    pub now: DateTime<Utc>,
    pub relationship: &'a RelationshipMetrics,
    pub mood: Mood,
    pub open_loop: Option<&'a OpenLoop>,
    pub due_promises: Vec<&'a Promise>,
    pub thread: Option<&'a OngoingThread>,
    pub background_threads: Vec<&'a OngoingThread>,
    pub spontaneity: &'a SpontaneityContext,
    pub situation: &'a TurnSituation,
    pub tools: &'a [ToolHint],
    /// End of the previous session, if known
    pub last_interaction_at: Option<DateTime<Utc>>,
}

impl SectionKind {
    pub fn render(&self, input: &CompositionInput<'_>) -> String {
        match self {
            SectionKind::Identity => sections::identity(input),
            SectionKind::Presence => sections::presence(input),
            SectionKind::Greeting => sections::greeting(input),
            SectionKind::OpenLoop => sections::open_loop(input),
            SectionKind::Promises => sections::promises(input),
            SectionKind::Thread => sections::thread(input),
            SectionKind::Relationship => sections::relationship(input),
            SectionKind::MoodStyle => sections::mood_style(input),
            SectionKind::Spontaneity => sections::spontaneity(input),
            SectionKind::Tools => sections::tools(input),
            SectionKind::OutputFormat => sections::output_format(input),
        }
    }
}

/// Run the plan for `mode` over `input`.
pub fn compose_for_mode(mode: CompositionMode, input: &CompositionInput<'_>) -> String {
    let plan = section_plan(mode);
    debug!(mode = mode.as_str(), sections = plan.len(), "Composing instruction text");
    compose(plan.iter().map(|kind| move || kind.render(input)))
}
