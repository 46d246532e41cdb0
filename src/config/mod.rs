// src/config/mod.rs
// Central configuration for the persona engine - every value has a default

pub mod env;
pub mod file;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Process-wide configuration loaded from `.env` / environment on first use.
///
/// Services take an explicit `EngineConfig` so tests never depend on this.
pub static CONFIG: Lazy<EngineConfig> = Lazy::new(EngineConfig::from_env);

/// Main configuration structure - composes all domain configs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub persona: PersonaConfig,
    pub mood: MoodConfig,
    pub spontaneity: SpontaneityConfig,
    pub selfie: SelfieConfig,
    pub threads: ThreadConfig,
    pub open_loops: OpenLoopConfig,
    pub fetch: FetchConfig,
}

// ── Persona

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaConfig {
    /// Name the persona answers to
    pub name: String,
    /// Persona's local time offset from UTC, used for time-of-day framing
    pub utc_offset_minutes: i32,
    /// Locations that count as "at home" for selfie bonuses
    pub home_locations: Vec<String>,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            name: "Mira".to_string(),
            utc_offset_minutes: 0,
            home_locations: vec!["home".to_string(), "bedroom".to_string()],
        }
    }
}

// ── Mood

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoodConfig {
    /// Streak length at which the streak effect saturates
    pub streak_saturation: u32,
    /// Share of energy driven by streaks rather than the daily baseline
    pub streak_weight: f64,
    /// Streak length before `current_mood_level` starts to move
    pub min_streak: u32,
    /// Mood level shift per interaction once a streak is established
    pub shift_per_step: f64,
    /// Mood level shift per interaction without an established streak
    pub drift_per_step: f64,
    /// Tone at or above which an interaction counts as positive
    pub positive_tone_threshold: f64,
    /// Tone at or below which an interaction counts as negative
    pub negative_tone_threshold: f64,
    /// Social battery spent per recorded interaction
    pub social_drain_per_message: f64,
    pub social_battery_floor: f64,
}

impl Default for MoodConfig {
    fn default() -> Self {
        Self {
            streak_saturation: 6,
            streak_weight: 0.35,
            min_streak: 3,
            shift_per_step: 0.15,
            drift_per_step: 0.02,
            positive_tone_threshold: 0.3,
            negative_tone_threshold: -0.3,
            social_drain_per_message: 0.02,
            social_battery_floor: 0.1,
        }
    }
}

// ── Spontaneity

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpontaneityConfig {
    pub base_probability: f64,
    pub max_probability: f64,
    /// Probability added per unit of energy (energy is in [-1, 1])
    pub energy_weight: f64,
    /// Ceiling of the message-count term
    pub message_weight: f64,
    /// Message count at which the message term reaches half its ceiling
    pub message_half_point: f64,
    pub cooldown_minutes: i64,
    /// Below this the spontaneity section is left out entirely
    pub section_floor: f64,
}

impl Default for SpontaneityConfig {
    fn default() -> Self {
        Self {
            base_probability: 0.10,
            max_probability: 0.40,
            energy_weight: 0.10,
            message_weight: 0.10,
            message_half_point: 20.0,
            cooldown_minutes: 30,
            section_floor: 0.05,
        }
    }
}

// ── Selfies

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelfieConfig {
    pub base_probability: f64,
    pub max_probability: f64,
    pub cooldown_hours: i64,
    pub energetic_mood_bonus: f64,
    pub bad_day_bonus: f64,
    pub away_from_home_bonus: f64,
    pub high_energy_bonus: f64,
    pub high_energy_threshold: f64,
}

impl Default for SelfieConfig {
    fn default() -> Self {
        Self {
            base_probability: 0.02,
            max_probability: 0.20,
            cooldown_hours: 24,
            energetic_mood_bonus: 0.03,
            bad_day_bonus: 0.05,
            away_from_home_bonus: 0.03,
            high_energy_bonus: 0.02,
            high_energy_threshold: 0.6,
        }
    }
}

// ── Ongoing threads

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreadConfig {
    pub min_age_hours: i64,
    pub intensity_floor: f64,
    pub mention_cooldown_hours: i64,
    pub user_related_bonus: f64,
    pub decay_half_life_hours: f64,
    /// Effective intensity needed to be listed as a background thought
    pub background_floor: f64,
    pub background_limit: usize,
}

impl Default for ThreadConfig {
    fn default() -> Self {
        Self {
            min_age_hours: 4,
            intensity_floor: 0.6,
            mention_cooldown_hours: 24,
            user_related_bonus: 0.1,
            decay_half_life_hours: 72.0,
            background_floor: 0.3,
            background_limit: 3,
        }
    }
}

// ── Open loops

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenLoopConfig {
    pub default_max_surfaces: u32,
    pub default_expiry_days: i64,
}

impl Default for OpenLoopConfig {
    fn default() -> Self {
        Self {
            default_max_surfaces: 2,
            default_expiry_days: 7,
        }
    }
}

// ── Persistence fetches

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-input timeout for persistence fetches
    pub timeout_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout_ms: 1500 }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }
}

/// One year, in each unit a window can be configured in
const MAX_WINDOW_MINUTES: i64 = 525_600;
const MAX_WINDOW_HOURS: i64 = 8_760;
/// Open loops may linger for up to ten years
const MAX_WINDOW_DAYS: i64 = 3_650;
const MAX_FETCH_TIMEOUT_MS: u64 = 600_000;

impl EngineConfig {
    /// Validate config on startup
    pub fn validate(&self) -> Result<()> {
        let probability_caps = [
            ("spontaneity.max_probability", self.spontaneity.max_probability),
            ("selfie.max_probability", self.selfie.max_probability),
        ];
        for (name, value) in probability_caps {
            if !(value > 0.0 && value <= 1.0) {
                return Err(EngineError::Config(format!("{name} must be in (0, 1], got {value}")));
            }
        }

        // Windows feed chrono durations; keep them within a sane range
        let windows = [
            ("spontaneity.cooldown_minutes", self.spontaneity.cooldown_minutes, 1, MAX_WINDOW_MINUTES),
            ("selfie.cooldown_hours", self.selfie.cooldown_hours, 1, MAX_WINDOW_HOURS),
            ("threads.min_age_hours", self.threads.min_age_hours, 0, MAX_WINDOW_HOURS),
            ("threads.mention_cooldown_hours", self.threads.mention_cooldown_hours, 0, MAX_WINDOW_HOURS),
            ("open_loops.default_expiry_days", self.open_loops.default_expiry_days, 1, MAX_WINDOW_DAYS),
        ];
        for (name, value, min, max) in windows {
            if !(min..=max).contains(&value) {
                return Err(EngineError::Config(format!("{name} must be in {min}..={max}, got {value}")));
            }
        }
        if self.spontaneity.message_half_point <= 0.0 {
            return Err(EngineError::Config("spontaneity.message_half_point must be positive".into()));
        }
        if self.mood.streak_saturation == 0 {
            return Err(EngineError::Config("mood.streak_saturation must be at least 1".into()));
        }
        if self.threads.decay_half_life_hours <= 0.0 {
            return Err(EngineError::Config("threads.decay_half_life_hours must be positive".into()));
        }
        if self.fetch.timeout_ms == 0 || self.fetch.timeout_ms > MAX_FETCH_TIMEOUT_MS {
            return Err(EngineError::Config(format!(
                "fetch.timeout_ms must be in 1..={MAX_FETCH_TIMEOUT_MS}, got {}",
                self.fetch.timeout_ms
            )));
        }

        Ok(())
    }

    /// Home/bedroom style locations never earn the away-from-home bonus.
    ///
    /// The location must equal a configured label once case, punctuation and
    /// leading fillers ("at", "in my", ...) are dropped, so "at home" is home
    /// but "Home Depot" is not.
    pub fn is_home_location(&self, location: &str) -> bool {
        let location = location_words(location);
        let mut rest = location.as_slice();
        while let [first, tail @ ..] = rest {
            if !LOCATION_FILLERS.contains(&first.as_str()) {
                break;
            }
            rest = tail;
        }
        !rest.is_empty()
            && self
                .persona
                .home_locations
                .iter()
                .any(|home| location_words(home).as_slice() == rest)
    }
}

const LOCATION_FILLERS: &[&str] = &["at", "in", "my", "the", "our", "their", "her", "his"];

fn location_words(label: &str) -> Vec<String> {
    label
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.spontaneity.max_probability, 0.40);
        assert_eq!(config.spontaneity.cooldown_minutes, 30);
        assert_eq!(config.selfie.cooldown_hours, 24);
        assert_eq!(config.threads.min_age_hours, 4);
        assert_eq!(config.threads.intensity_floor, 0.6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig::default();
        config.spontaneity.max_probability = 0.0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.selfie.cooldown_hours = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.fetch.timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_rejects_huge_windows() {
        let mut config = EngineConfig::default();
        config.spontaneity.cooldown_minutes = 9_000_000_000_000_000;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.threads.mention_cooldown_hours = i64::MAX;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.threads.min_age_hours = -1;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.open_loops.default_expiry_days = 1_000_000_000_000;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.fetch.timeout_ms = u64::MAX;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.selfie.cooldown_hours = 8_760;
        config.open_loops.default_expiry_days = 3_650;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_home_location_matching() {
        let config = EngineConfig::default();
        assert!(config.is_home_location("Home"));
        assert!(config.is_home_location("my bedroom"));
        assert!(config.is_home_location("  at home. "));
        assert!(!config.is_home_location("coffee shop"));
        assert!(!config.is_home_location("Home Depot"));
        assert!(!config.is_home_location("homeless shelter"));
        assert!(!config.is_home_location("my"));
    }
}
