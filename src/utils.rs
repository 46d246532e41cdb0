// src/utils.rs
// Shared time, cooldown and collection helpers

use std::collections::VecDeque;

use chrono::{DateTime, Duration, FixedOffset, Offset, Timelike, Utc};
use tracing::{debug, warn};

// ============================================================================
// Cooldown utilities
// ============================================================================

/// Multiplier applied to a cooldown-gated probability.
///
/// `0.0` right at the gating event, rising linearly to exactly `1.0` once
/// `window` has elapsed. No event yields `1.0`; an event later than `now`
/// yields `0.0`.
pub fn cooldown_factor(last_event: Option<DateTime<Utc>>, now: DateTime<Utc>, window: Duration) -> f64 {
    let Some(last) = last_event else {
        return 1.0;
    };

    let window_ms = window.num_milliseconds();
    if window_ms <= 0 {
        return 1.0;
    }

    let elapsed_ms = (now - last).num_milliseconds();
    if elapsed_ms <= 0 {
        return 0.0;
    }
    if elapsed_ms >= window_ms {
        return 1.0;
    }

    elapsed_ms as f64 / window_ms as f64
}

/// Config-driven window lengths. Out-of-range counts saturate instead of
/// panicking.
pub fn window_minutes(minutes: i64) -> Duration {
    Duration::try_minutes(minutes).unwrap_or(if minutes < 0 { Duration::MIN } else { Duration::MAX })
}

pub fn window_hours(hours: i64) -> Duration {
    Duration::try_hours(hours).unwrap_or(if hours < 0 { Duration::MIN } else { Duration::MAX })
}

pub fn window_days(days: i64) -> Duration {
    Duration::try_days(days).unwrap_or(if days < 0 { Duration::MIN } else { Duration::MAX })
}

/// Pick whichever of two optional timestamps is more recent.
pub fn most_recent(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (Some(a), None) => Some(a),
        (None, b) => b,
    }
}

/// Clamp a probability into `[0, max]`. NaN collapses to 0.
pub fn clamp_probability(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, max.max(0.0))
}

/// Clamp `field` to `[lo, hi]`, mapping NaN to `fallback`. Any change to
/// the raw value is logged.
pub fn clamp_or(field: &'static str, value: f64, lo: f64, hi: f64, fallback: f64) -> f64 {
    if value.is_nan() {
        warn!(field, fallback, "NaN input replaced with fallback");
        return fallback;
    }
    let clamped = value.clamp(lo, hi);
    if clamped != value {
        debug!(field, raw = value, clamped, "Input clamped into range");
    }
    clamped
}

/// Turn a probability into a yes/no decision.
pub fn roll(probability: f64) -> bool {
    if probability <= 0.0 {
        return false;
    }
    rand::random::<f64>() < probability
}

// ============================================================================
// Bounded collections
// ============================================================================

/// Push onto the back, evicting from the front until `len <= cap`.
pub fn push_bounded<T>(items: &mut VecDeque<T>, item: T, cap: usize) {
    items.push_back(item);
    while items.len() > cap {
        items.pop_front();
    }
}

// ============================================================================
// Formatting
// ============================================================================

/// `now` shifted into the persona's local time. Out-of-range offsets fall back to UTC.
pub fn local_time(now: DateTime<Utc>, utc_offset_minutes: i32) -> DateTime<FixedOffset> {
    let offset = utc_offset_minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix());
    now.with_timezone(&offset)
}

pub fn local_hour(now: DateTime<Utc>, utc_offset_minutes: i32) -> u32 {
    local_time(now, utc_offset_minutes).hour()
}

/// Short relative time, e.g. "12m ago", "3h ago", "2d ago"
pub fn format_elapsed(elapsed: Duration) -> String {
    if elapsed.num_minutes() < 1 {
        "just now".to_string()
    } else if elapsed.num_minutes() < 60 {
        format!("{}m ago", elapsed.num_minutes())
    } else if elapsed.num_hours() < 24 {
        format!("{}h ago", elapsed.num_hours())
    } else {
        format!("{}d ago", elapsed.num_days())
    }
}
