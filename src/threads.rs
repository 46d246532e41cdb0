// src/threads.rs
// Ongoing threads - things on the persona's mind that she may bring up unprompted

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ThreadConfig;
use crate::utils::window_hours;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OngoingThread {
    pub id: String,
    pub theme: String,
    pub current_state: String,
    pub intensity: f64,
    #[serde(default)]
    pub last_mentioned: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_related: bool,
    pub created_at: DateTime<Utc>,
}

impl OngoingThread {
    /// Stored intensity halved every `decay_half_life_hours` since the thread
    /// was last touched (mentioned, or created).
    pub fn effective_intensity(&self, now: DateTime<Utc>, config: &ThreadConfig) -> f64 {
        let since = self.last_mentioned.unwrap_or(self.created_at);
        let hours = (now - since).num_minutes().max(0) as f64 / 60.0;
        let half_life = config.decay_half_life_hours.max(f64::EPSILON);
        let intensity = if self.intensity.is_nan() { 0.0 } else { self.intensity };
        intensity * 0.5f64.powf(hours / half_life)
    }

    fn is_eligible(&self, now: DateTime<Utc>, config: &ThreadConfig) -> bool {
        let old_enough = now - self.created_at >= window_hours(config.min_age_hours);
        let intense_enough = self.intensity > config.intensity_floor;
        let rested = self
            .last_mentioned
            .is_none_or(|at| now - at > window_hours(config.mention_cooldown_hours));
        old_enough && intense_enough && rested
    }

    fn proactive_score(&self, config: &ThreadConfig) -> f64 {
        self.intensity + if self.user_related { config.user_related_bonus } else { 0.0 }
    }
}

/// Pick the thread most worth bringing up unprompted.
///
/// Eligible threads are at least `min_age_hours` old, above the intensity
/// floor and not mentioned within `mention_cooldown_hours`. Score is intensity
/// plus a bonus for user-related threads; the first of equal scores wins.
pub fn select_proactive_thread<'a>(
    threads: &'a [OngoingThread],
    now: DateTime<Utc>,
    config: &ThreadConfig,
) -> Option<&'a OngoingThread> {
    let mut best: Option<(&OngoingThread, f64)> = None;
    for thread in threads.iter().filter(|t| t.is_eligible(now, config)) {
        let score = thread.proactive_score(config);
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((thread, score));
        }
    }
    best.map(|(thread, _)| thread)
}

/// Threads still noticeably on the persona's mind, strongest first.
pub fn background_threads<'a>(
    threads: &'a [OngoingThread],
    exclude_id: Option<&str>,
    now: DateTime<Utc>,
    config: &ThreadConfig,
) -> Vec<&'a OngoingThread> {
    let mut ranked: Vec<(&OngoingThread, f64)> = threads
        .iter()
        .filter(|t| Some(t.id.as_str()) != exclude_id)
        .map(|t| (t, t.effective_intensity(now, config)))
        .filter(|(_, intensity)| *intensity >= config.background_floor)
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
        .into_iter()
        .take(config.background_limit)
        .map(|(t, _)| t)
        .collect()
}

/// Set `last_mentioned = now` on the thread with this id.
pub fn mark_thread_mentioned(threads: &mut [OngoingThread], id: &str, now: DateTime<Utc>) -> bool {
    match threads.iter_mut().find(|t| t.id == id) {
        Some(thread) => {
            thread.last_mentioned = Some(now);
            true
        }
        None => {
            debug!(thread_id = id, "mark_thread_mentioned: no such thread");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 4, 20, 0, 0).unwrap()
    }

    fn thread(id: &str, intensity: f64, age_hours: i64) -> OngoingThread {
        OngoingThread {
            id: id.to_string(),
            theme: format!("theme {id}"),
            current_state: "thinking about it".to_string(),
            intensity,
            last_mentioned: None,
            user_related: false,
            created_at: now() - Duration::hours(age_hours),
        }
    }

    #[test]
    fn test_selects_highest_intensity() {
        let config = ThreadConfig::default();
        let threads = vec![thread("a", 0.7, 10), thread("b", 0.9, 10)];
        assert_eq!(select_proactive_thread(&threads, now(), &config).unwrap().id, "b");
    }

    #[test]
    fn test_user_related_bonus_can_win() {
        let config = ThreadConfig::default();
        let mut user = thread("user", 0.75, 10);
        user.user_related = true;
        let threads = vec![thread("self", 0.8, 10), user];
        assert_eq!(select_proactive_thread(&threads, now(), &config).unwrap().id, "user");
    }

    #[test]
    fn test_young_threads_are_skipped() {
        let config = ThreadConfig::default();
        let threads = vec![thread("fresh", 0.95, 3), thread("settled", 0.65, 5)];
        assert_eq!(select_proactive_thread(&threads, now(), &config).unwrap().id, "settled");

        let only_fresh = vec![thread("fresh", 0.95, 3)];
        assert!(select_proactive_thread(&only_fresh, now(), &config).is_none());
    }

    #[test]
    fn test_intensity_floor_is_exclusive() {
        let config = ThreadConfig::default();
        let threads = vec![thread("flat", 0.6, 10)];
        assert!(select_proactive_thread(&threads, now(), &config).is_none());
    }

    #[test]
    fn test_recently_mentioned_threads_are_skipped() {
        let config = ThreadConfig::default();
        let mut recent = thread("recent", 0.95, 48);
        recent.last_mentioned = Some(now() - Duration::hours(23));
        let mut rested = thread("rested", 0.7, 48);
        rested.last_mentioned = Some(now() - Duration::hours(25));

        let threads = vec![recent, rested];
        assert_eq!(select_proactive_thread(&threads, now(), &config).unwrap().id, "rested");
    }

    #[test]
    fn test_never_returns_ineligible_thread() {
        let config = ThreadConfig::default();
        let mut threads = Vec::new();
        for i in 0..40 {
            let mut t = thread(&format!("t{i}"), 0.5 + (i % 5) as f64 * 0.1, (i % 9) as i64);
            if i % 3 == 0 {
                t.last_mentioned = Some(now() - Duration::hours((i % 30) as i64));
            }
            threads.push(t);
        }
        if let Some(selected) = select_proactive_thread(&threads, now(), &config) {
            assert!(now() - selected.created_at >= Duration::hours(config.min_age_hours));
            if let Some(at) = selected.last_mentioned {
                assert!(now() - at > Duration::hours(24));
            }
        }
    }

    #[test]
    fn test_unvalidated_huge_windows_do_not_panic() {
        let config = ThreadConfig {
            min_age_hours: 0,
            mention_cooldown_hours: i64::MAX,
            ..ThreadConfig::default()
        };
        let mut mentioned = thread("mentioned", 0.9, 48);
        mentioned.last_mentioned = Some(now() - Duration::days(365));
        let threads = vec![mentioned, thread("quiet", 0.7, 1)];
        assert_eq!(select_proactive_thread(&threads, now(), &config).unwrap().id, "quiet");
    }

    #[test]
    fn test_mark_thread_mentioned() {
        let mut threads = vec![thread("a", 0.9, 10)];
        assert!(mark_thread_mentioned(&mut threads, "a", now()));
        assert_eq!(threads[0].last_mentioned, Some(now()));
        assert!(!mark_thread_mentioned(&mut threads, "missing", now()));
        assert!(select_proactive_thread(&threads, now(), &ThreadConfig::default()).is_none());
    }

    #[test]
    fn test_effective_intensity_halves_per_half_life() {
        let config = ThreadConfig::default();
        let t = thread("a", 0.8, 72);
        assert!((t.effective_intensity(now(), &config) - 0.4).abs() < 1e-9);
        let brand_new = thread("b", 0.8, 0);
        assert!((brand_new.effective_intensity(now(), &config) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_background_threads_excludes_selected_and_faded() {
        let config = ThreadConfig::default();
        let threads = vec![
            thread("selected", 0.9, 10),
            thread("strong", 0.8, 10),
            thread("faded", 0.9, 400),
            thread("weak", 0.2, 1),
        ];
        let background = background_threads(&threads, Some("selected"), now(), &config);
        let ids: Vec<&str> = background.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["strong"]);
    }
}
