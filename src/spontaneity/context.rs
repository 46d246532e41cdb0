// src/spontaneity/context.rs
// Read-only snapshot of everything the spontaneity section needs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::probability::{
    SelfieInputs, calculate_selfie_probability, calculate_spontaneity_probability, is_away,
};
use super::state::{ConversationState, SpontaneousKind};
use crate::config::EngineConfig;
use crate::mood::Mood;
use crate::relationship::RelationshipTier;
use crate::utils::roll;

/// Kinds used in this many of the most recent moments are not suggested again
pub const SUGGESTION_LOOKBACK: usize = 3;

/// Per-turn facts about the user's situation, supplied by the orchestrator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnSituation {
    #[serde(default)]
    pub user_had_bad_day: bool,
    /// Where the persona currently is ("home", "coffee shop", ...)
    #[serde(default)]
    pub location: Option<String>,
    /// What the persona is currently doing
    #[serde(default)]
    pub activity: Option<String>,
    /// Last selfie known outside this session
    #[serde(default)]
    pub last_selfie_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpontaneityContext {
    pub spontaneity_probability: f64,
    pub selfie_probability: f64,
    pub messages_count: u32,
    pub topics: Vec<String>,
    pub recent_laughter: bool,
    pub recent_kinds: Vec<SpontaneousKind>,
    pub minutes_since_last_moment: Option<i64>,
    pub suggested_kinds: Vec<SpontaneousKind>,
    /// Reasons a selfie would land right now; empty when selfies are off
    pub selfie_hints: Vec<String>,
}

impl SpontaneityContext {
    /// Snapshot with nothing going on, used before any state is known
    pub fn quiet() -> Self {
        Self {
            spontaneity_probability: 0.0,
            selfie_probability: 0.0,
            messages_count: 0,
            topics: Vec::new(),
            recent_laughter: false,
            recent_kinds: Vec::new(),
            minutes_since_last_moment: None,
            suggested_kinds: Vec::new(),
            selfie_hints: Vec::new(),
        }
    }

    /// Decide whether to act spontaneously this turn
    pub fn roll_spontaneous(&self) -> bool {
        roll(self.spontaneity_probability)
    }

    pub fn roll_selfie(&self) -> bool {
        roll(self.selfie_probability)
    }
}

fn suggest_kinds(
    tier: RelationshipTier,
    mood: &Mood,
    recent_laughter: bool,
    state: &ConversationState,
) -> Vec<SpontaneousKind> {
    let mut candidates = Vec::new();
    if recent_laughter || mood.label.is_energetic() {
        candidates.push(SpontaneousKind::SpontaneousHumor);
    }
    if state.topics_discussed.len() >= 2 {
        candidates.push(SpontaneousKind::AssociativeLeap);
    }
    candidates.push(SpontaneousKind::SuddenCuriosity);
    if mood.energy > 0.0 {
        candidates.push(SpontaneousKind::SpontaneousShare);
    }
    if tier.is_friendly() {
        candidates.push(SpontaneousKind::CheckIn);
    }

    candidates
        .into_iter()
        .filter(|kind| !state.used_recently(kind, SUGGESTION_LOOKBACK))
        .collect()
}

fn selfie_hints(situation: &TurnSituation, mood: &Mood, config: &EngineConfig) -> Vec<String> {
    let mut hints = Vec::new();
    if situation.user_had_bad_day {
        hints.push("they've had a rough day and could use a smile".to_string());
    }
    if let Some(location) = situation.location.as_deref().filter(|loc| is_away(Some(*loc), config)) {
        hints.push(format!("you're out at {}", location.trim()));
    }
    if mood.label.is_energetic() {
        hints.push(format!("you're feeling {}", mood.label));
    }
    hints
}

/// Aggregate probabilities and session facts into one snapshot. Reads only.
pub fn build_spontaneity_context(
    tier: RelationshipTier,
    mood: &Mood,
    situation: &TurnSituation,
    state: &ConversationState,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> SpontaneityContext {
    let spontaneity_probability = calculate_spontaneity_probability(
        tier,
        mood.energy,
        state.messages_count,
        state,
        now,
        &config.spontaneity,
    );

    let selfie_inputs = SelfieInputs {
        tier,
        energy: mood.energy,
        mood: mood.label,
        user_had_bad_day: situation.user_had_bad_day,
        last_selfie_at: situation.last_selfie_at,
        location: situation.location.as_deref(),
    };
    let selfie_probability = calculate_selfie_probability(&selfie_inputs, state, now, config);

    let recent_laughter = state.has_recent_laughter(now);

    SpontaneityContext {
        spontaneity_probability,
        selfie_probability,
        messages_count: state.messages_count,
        topics: state.topics_discussed.iter().cloned().collect(),
        recent_laughter,
        recent_kinds: state.recent_spontaneous_types.iter().cloned().collect(),
        minutes_since_last_moment: state.minutes_since_last_moment(now),
        suggested_kinds: suggest_kinds(tier, mood, recent_laughter, state),
        selfie_hints: if selfie_probability > 0.0 {
            selfie_hints(situation, mood, config)
        } else {
            Vec::new()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mood::MoodLabel;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 1, 19, 0, 0).unwrap()
    }

    fn mood(energy: f64, label: MoodLabel) -> Mood {
        Mood {
            energy,
            warmth: 0.6,
            label,
            genuine_moment: false,
        }
    }

    #[test]
    fn test_context_does_not_mutate_state() {
        let config = EngineConfig::default();
        let mut state = ConversationState::new(now() - Duration::minutes(20));
        state.track_message(&["hiking", "new job"]);
        state.track_laughter(now() - Duration::minutes(1));
        let before = state.clone();

        let ctx = build_spontaneity_context(
            RelationshipTier::Friend,
            &mood(0.4, MoodLabel::Playful),
            &TurnSituation::default(),
            &state,
            now(),
            &config,
        );
        assert_eq!(state, before);
        assert_eq!(ctx.messages_count, 1);
        assert_eq!(ctx.topics, vec!["hiking".to_string(), "new job".to_string()]);
        assert!(ctx.recent_laughter);
        assert!(ctx.spontaneity_probability > 0.0);
    }

    #[test]
    fn test_suggestions_follow_state() {
        let config = EngineConfig::default();
        let mut state = ConversationState::new(now());
        state.track_message(&["music", "travel"]);

        let ctx = build_spontaneity_context(
            RelationshipTier::CloseFriend,
            &mood(0.5, MoodLabel::Excited),
            &TurnSituation::default(),
            &state,
            now(),
            &config,
        );
        assert_eq!(
            ctx.suggested_kinds,
            vec![
                SpontaneousKind::SpontaneousHumor,
                SpontaneousKind::AssociativeLeap,
                SpontaneousKind::SuddenCuriosity,
                SpontaneousKind::SpontaneousShare,
                SpontaneousKind::CheckIn,
            ]
        );

        let ctx = build_spontaneity_context(
            RelationshipTier::Acquaintance,
            &mood(-0.2, MoodLabel::Calm),
            &TurnSituation::default(),
            &ConversationState::new(now()),
            now(),
            &config,
        );
        assert_eq!(ctx.suggested_kinds, vec![SpontaneousKind::SuddenCuriosity]);
    }

    #[test]
    fn test_recent_kinds_are_not_suggested() {
        let config = EngineConfig::default();
        let mut state = ConversationState::new(now() - Duration::hours(2));
        state.record_spontaneous_action(SpontaneousKind::SuddenCuriosity, now() - Duration::hours(1));
        state.record_spontaneous_action(SpontaneousKind::CheckIn, now() - Duration::minutes(50));

        let ctx = build_spontaneity_context(
            RelationshipTier::Friend,
            &mood(0.2, MoodLabel::Focused),
            &TurnSituation::default(),
            &state,
            now(),
            &config,
        );
        assert_eq!(ctx.suggested_kinds, vec![SpontaneousKind::SpontaneousShare]);
        assert_eq!(ctx.minutes_since_last_moment, Some(50));
    }

    #[test]
    fn test_selfie_hints_only_when_selfies_possible() {
        let config = EngineConfig::default();
        let state = ConversationState::new(now());
        let situation = TurnSituation {
            user_had_bad_day: true,
            location: Some("the farmers market".to_string()),
            ..TurnSituation::default()
        };

        let friend = build_spontaneity_context(
            RelationshipTier::Friend,
            &mood(0.3, MoodLabel::Calm),
            &situation,
            &state,
            now(),
            &config,
        );
        assert_eq!(friend.selfie_hints.len(), 2);
        assert!(friend.selfie_hints[1].contains("farmers market"));

        let acquaintance = build_spontaneity_context(
            RelationshipTier::Acquaintance,
            &mood(0.3, MoodLabel::Calm),
            &situation,
            &state,
            now(),
            &config,
        );
        assert_eq!(acquaintance.selfie_probability, 0.0);
        assert!(acquaintance.selfie_hints.is_empty());
    }
}
