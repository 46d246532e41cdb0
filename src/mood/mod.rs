// src/mood/mod.rs
//! Mood engine.
//!
//! Mood is two numbers, energy in [-1, 1] and warmth in [0, 1], recomputed
//! every turn from the slow-moving [`MoodState`] and the streak counters in
//! [`EmotionalMomentum`]. It is never stored as primary truth.

pub mod momentum;

use serde::{Deserialize, Serialize};

use crate::config::MoodConfig;
use crate::relationship::TierProfile;
use crate::utils::clamp_or;

pub use momentum::{EmotionalMomentum, InteractionSignal};

/// Discrete label derived from (energy, warmth)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoodLabel {
    Excited,
    Playful,
    Focused,
    Calm,
    Tired,
    Withdrawn,
    Guarded,
}

impl MoodLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            MoodLabel::Excited => "excited",
            MoodLabel::Playful => "playful",
            MoodLabel::Focused => "focused",
            MoodLabel::Calm => "calm",
            MoodLabel::Tired => "tired",
            MoodLabel::Withdrawn => "withdrawn",
            MoodLabel::Guarded => "guarded",
        }
    }

    /// Playful and excited moods make spontaneous gestures more likely
    pub fn is_energetic(&self) -> bool {
        matches!(self, MoodLabel::Excited | MoodLabel::Playful)
    }

    pub fn classify(energy: f64, warmth: f64) -> Self {
        if energy >= 0.5 && warmth >= 0.5 {
            MoodLabel::Excited
        } else if energy >= 0.15 && warmth >= 0.55 {
            MoodLabel::Playful
        } else if energy <= -0.4 && warmth < 0.4 {
            MoodLabel::Withdrawn
        } else if energy <= -0.4 {
            MoodLabel::Tired
        } else if warmth < 0.3 {
            MoodLabel::Guarded
        } else if energy >= 0.15 {
            MoodLabel::Focused
        } else {
            MoodLabel::Calm
        }
    }
}

impl std::fmt::Display for MoodLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Slow-moving inputs to the mood calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodState {
    /// 0.0 (exhausted) ..= 1.0 (wired)
    pub daily_energy: f64,
    /// Drains as the conversation goes on
    pub social_battery: f64,
    /// Chewing on something internally; a bit less outwardly warm
    #[serde(default)]
    pub internal_processing: bool,
}

impl Default for MoodState {
    fn default() -> Self {
        Self {
            daily_energy: 0.7,
            social_battery: 1.0,
            internal_processing: false,
        }
    }
}

impl MoodState {
    /// Fresh state for a session starting at the given local hour
    pub fn for_hour(hour: u32) -> Self {
        let daily_energy = match hour {
            6..=9 => 0.6,
            10..=16 => 0.75,
            17..=21 => 0.65,
            _ => 0.4,
        };
        Self {
            daily_energy,
            ..Self::default()
        }
    }

    /// Spend some social battery on one interaction
    pub fn drain_social(&mut self, config: &MoodConfig) {
        self.social_battery =
            (self.social_battery - config.social_drain_per_message).max(config.social_battery_floor);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mood {
    pub energy: f64,
    pub warmth: f64,
    pub label: MoodLabel,
    pub genuine_moment: bool,
}

impl Mood {
    /// Neutral mood used when nothing is known
    pub fn neutral() -> Self {
        Self {
            energy: 0.0,
            warmth: 0.5,
            label: MoodLabel::Calm,
            genuine_moment: false,
        }
    }

    /// Tint warmth with how the persona feels about this person.
    pub fn with_relationship(self, profile: &TierProfile) -> Self {
        let warmth = (self.warmth + profile.warmth_bias).clamp(0.0, 1.0);
        Self {
            warmth,
            label: MoodLabel::classify(self.energy, warmth),
            ..self
        }
    }
}

/// Saturating streak effect in [0, 1]. Zero until the streak reaches
/// `min_streak`, so an isolated interaction leaves energy alone.
fn streak_effect(streak: u32, min_streak: u32, saturation: u32) -> f64 {
    if streak < min_streak {
        return 0.0;
    }
    let saturation = saturation.max(1);
    f64::from(streak.min(saturation)) / f64::from(saturation)
}

/// Derive mood from state and momentum. Pure: same inputs, same output.
///
/// Energy rises with the positive streak and falls with the negative streak
/// once either reaches `min_streak`, both saturating at `streak_saturation`.
pub fn calculate_mood(state: &MoodState, momentum: &EmotionalMomentum, config: &MoodConfig) -> Mood {
    let daily = clamp_or("daily_energy", state.daily_energy, 0.0, 1.0, 0.5);
    let social = clamp_or("social_battery", state.social_battery, 0.0, 1.0, 0.5);
    let weight = clamp_or("streak_weight", config.streak_weight, 0.0, 1.0, 0.35);

    let positive = streak_effect(momentum.positive_streak, config.min_streak, config.streak_saturation);
    let negative = streak_effect(momentum.negative_streak, config.min_streak, config.streak_saturation);
    let streak = positive - negative;

    let baseline = (0.6 * daily + 0.4 * social) * 2.0 - 1.0;
    let energy = (baseline * (1.0 - weight) + weight * streak).clamp(-1.0, 1.0);

    let mood_level = clamp_or("mood_level", momentum.current_mood_level, -1.0, 1.0, 0.0);
    let mut warmth = 0.5 + 0.25 * mood_level + 0.2 * streak + 0.1 * (social - 0.5);
    if state.internal_processing {
        warmth -= 0.1;
    }
    let warmth = warmth.clamp(0.0, 1.0);

    Mood {
        energy,
        warmth,
        label: MoodLabel::classify(energy, warmth),
        genuine_moment: momentum.genuine_moment_detected,
    }
}
