// src/spontaneity/probability.rs
// Spontaneity and selfie probability calculus - pure, time passed in

use chrono::{DateTime, Utc};

use super::state::ConversationState;
use crate::config::{EngineConfig, SpontaneityConfig};
use crate::mood::MoodLabel;
use crate::relationship::{RelationshipTier, profile, spontaneity_bonus_for_label};
use crate::utils::{clamp_or, clamp_probability, cooldown_factor, most_recent, window_hours, window_minutes};

fn raw_spontaneity(tier_bonus: f64, energy: f64, message_count: u32, config: &SpontaneityConfig) -> f64 {
    let energy = clamp_or("energy", energy, -1.0, 1.0, 0.0);
    let messages = f64::from(message_count);
    let message_term = config.message_weight * messages / (messages + config.message_half_point);
    config.base_probability + tier_bonus + config.energy_weight * energy + message_term
}

fn gated_spontaneity(
    tier_bonus: f64,
    energy: f64,
    message_count: u32,
    state: &ConversationState,
    now: DateTime<Utc>,
    config: &SpontaneityConfig,
) -> f64 {
    let raw = clamp_probability(
        raw_spontaneity(tier_bonus, energy, message_count, config),
        config.max_probability,
    );
    let factor = cooldown_factor(
        state.last_spontaneous_moment,
        now,
        window_minutes(config.cooldown_minutes),
    );
    clamp_probability(raw * factor, config.max_probability)
}

/// Chance the persona does something unprompted this turn.
///
/// `base + tier bonus + energy term + message term`, clamped to
/// `[0, max_probability]`, then scaled down linearly while the last
/// spontaneous moment is within the cooldown window.
pub fn calculate_spontaneity_probability(
    tier: RelationshipTier,
    energy: f64,
    message_count: u32,
    state: &ConversationState,
    now: DateTime<Utc>,
    config: &SpontaneityConfig,
) -> f64 {
    gated_spontaneity(profile(tier).spontaneity_bonus, energy, message_count, state, now, config)
}

/// Same as [`calculate_spontaneity_probability`] for a tier given as a raw
/// string. Unknown tiers get no bonus.
pub fn calculate_spontaneity_probability_for_label(
    tier: &str,
    energy: f64,
    message_count: u32,
    state: &ConversationState,
    now: DateTime<Utc>,
    config: &SpontaneityConfig,
) -> f64 {
    gated_spontaneity(spontaneity_bonus_for_label(tier), energy, message_count, state, now, config)
}

/// Inputs to the selfie calculation that come from outside the session
#[derive(Debug, Clone, PartialEq)]
pub struct SelfieInputs<'a> {
    pub tier: RelationshipTier,
    pub energy: f64,
    pub mood: MoodLabel,
    pub user_had_bad_day: bool,
    /// Last selfie known to the caller, possibly from an earlier session
    pub last_selfie_at: Option<DateTime<Utc>>,
    pub location: Option<&'a str>,
}

/// Chance the persona sends a selfie unprompted this turn. Zero below
/// friend tier.
pub fn calculate_selfie_probability(
    inputs: &SelfieInputs<'_>,
    state: &ConversationState,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> f64 {
    let Some(tier_bonus) = profile(inputs.tier).selfie_bonus else {
        return 0.0;
    };
    let selfie = &config.selfie;

    let mut raw = selfie.base_probability + tier_bonus;
    if inputs.mood.is_energetic() {
        raw += selfie.energetic_mood_bonus;
    }
    if inputs.user_had_bad_day {
        raw += selfie.bad_day_bonus;
    }
    if is_away(inputs.location, config) {
        raw += selfie.away_from_home_bonus;
    }
    if inputs.energy > selfie.high_energy_threshold {
        raw += selfie.high_energy_bonus;
    }

    let last_selfie = most_recent(state.last_spontaneous_selfie, inputs.last_selfie_at);
    let factor = cooldown_factor(last_selfie, now, window_hours(selfie.cooldown_hours));
    clamp_probability(clamp_probability(raw, selfie.max_probability) * factor, selfie.max_probability)
}

/// Out somewhere that isn't home or the bedroom. Unknown location is not away.
pub(crate) fn is_away(location: Option<&str>, config: &EngineConfig) -> bool {
    location
        .map(str::trim)
        .is_some_and(|loc| !loc.is_empty() && !config.is_home_location(loc))
}
