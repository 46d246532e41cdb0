// src/mood/momentum.rs
// Emotional momentum - streak counters that keep mood from whiplashing

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::config::MoodConfig;
use crate::utils::{clamp_or, push_bounded};

/// Number of recent interaction tones kept
pub const RECENT_TONES_CAP: usize = 10;

/// Tone of one user interaction as judged by the orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionSignal {
    /// -1.0 (hostile) ..= 1.0 (warm)
    pub tone: f64,
    /// Something real and vulnerable was shared
    #[serde(default)]
    pub genuine_moment: bool,
    /// Topics touched by the message
    #[serde(default)]
    pub topics: Vec<String>,
    /// The user laughed / found something funny
    #[serde(default)]
    pub laughter: bool,
}

impl InteractionSignal {
    pub fn with_tone(tone: f64) -> Self {
        Self {
            tone,
            genuine_moment: false,
            topics: Vec::new(),
            laughter: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionalMomentum {
    /// Slow-moving mood level in [-1, 1]
    pub current_mood_level: f64,
    pub positive_streak: u32,
    pub negative_streak: u32,
    pub recent_tones: VecDeque<f64>,
    pub genuine_moment_detected: bool,
}

impl Default for EmotionalMomentum {
    fn default() -> Self {
        Self {
            current_mood_level: 0.0,
            positive_streak: 0,
            negative_streak: 0,
            recent_tones: VecDeque::with_capacity(RECENT_TONES_CAP),
            genuine_moment_detected: false,
        }
    }
}

impl EmotionalMomentum {
    /// Fold one interaction into the streak counters.
    ///
    /// The mood level only moves materially once a same-signed streak of
    /// `min_streak` interactions exists; isolated interactions drift it.
    pub fn record(&mut self, tone: f64, genuine_moment: bool, config: &MoodConfig) {
        let tone = clamp_or("tone", tone, -1.0, 1.0, 0.0);
        push_bounded(&mut self.recent_tones, tone, RECENT_TONES_CAP);

        let established = if tone >= config.positive_tone_threshold {
            self.positive_streak = self.positive_streak.saturating_add(1);
            self.negative_streak = 0;
            self.positive_streak >= config.min_streak
        } else if tone <= config.negative_tone_threshold {
            self.negative_streak = self.negative_streak.saturating_add(1);
            self.positive_streak = 0;
            self.negative_streak >= config.min_streak
        } else {
            false
        };

        let step = if established {
            config.shift_per_step
        } else {
            config.drift_per_step
        };
        self.current_mood_level = (self.current_mood_level + step * tone).clamp(-1.0, 1.0);

        if genuine_moment {
            self.genuine_moment_detected = true;
        }
    }
}
