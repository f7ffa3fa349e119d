use std::time::Duration;

use crate::application::service::StateStore;
use crate::domain::model::AccountState;
use crate::domain::repository::StateRepository;
use crate::infrastructure::config::BreakerConfig;

/// Current wall-clock time as unix seconds
pub fn unix_now() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

/// Turns timeout/success signals into persisted per-account cooldowns.
///
/// Only timeouts count toward tripping. Each counted timeout is one whole
/// account outcome (which already includes the in-process retry).
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    max_timeout_fail: u32,
    skip_duration: Duration,
}

impl CircuitBreaker {
    pub fn new(max_timeout_fail: u32, skip_duration: Duration) -> Self {
        Self {
            max_timeout_fail: max_timeout_fail.max(1),
            skip_duration,
        }
    }

    pub fn from_config(config: &BreakerConfig) -> Self {
        Self::new(config.max_timeout_fail, config.skip_duration())
    }

    pub fn should_skip<R: StateRepository>(&self, store: &StateStore<R>, username: &str) -> bool {
        self.should_skip_at(store, username, unix_now())
    }

    pub fn should_skip_at<R: StateRepository>(
        &self,
        store: &StateStore<R>,
        username: &str,
        now: f64,
    ) -> bool {
        store
            .get(username)
            .is_some_and(|record| record.is_cooling_down(now))
    }

    /// Time left in the cooldown window, if one is open
    pub fn cooldown_remaining_at<R: StateRepository>(
        &self,
        store: &StateStore<R>,
        username: &str,
        now: f64,
    ) -> Option<Duration> {
        let until = store.get(username)?.skip_until?;
        if until <= now {
            return None;
        }
        // Stored values are not trusted to fit in a Duration
        Duration::try_from_secs_f64(until - now).ok()
    }

    /// Count one timeout outcome. Returns true when this trips the breaker.
    pub fn record_timeout<R: StateRepository>(
        &self,
        store: &mut StateStore<R>,
        username: &str,
    ) -> bool {
        self.record_timeout_at(store, username, unix_now())
    }

    pub fn record_timeout_at<R: StateRepository>(
        &self,
        store: &mut StateStore<R>,
        username: &str,
        now: f64,
    ) -> bool {
        let mut record: AccountState = store.get(username).cloned().unwrap_or_default();
        let count = record.timeout_count.saturating_add(1);

        if count >= self.max_timeout_fail {
            record.skip_until = Some(now + self.skip_duration.as_secs_f64());
            record.timeout_count = 0;
            store.upsert(username, record);
            tracing::warn!(
                account = username,
                "Circuit tripped after {} timeout(s), skipping for {}",
                count,
                humantime::format_duration(self.skip_duration)
            );
            return true;
        }

        record.timeout_count = count;
        store.upsert(username, record);
        tracing::info!(
            account = username,
            "Timeout recorded ({}/{})",
            count,
            self.max_timeout_fail
        );
        false
    }

    /// A healthy run clears all history for the account
    pub fn record_success<R: StateRepository>(&self, store: &mut StateStore<R>, username: &str) {
        if store.remove(username) {
            tracing::debug!(account = username, "Cleared circuit-breaker history");
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::from_config(&BreakerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryStateRepository;

    const DAY: f64 = 24.0 * 3600.0;

    fn store() -> (MemoryStateRepository, StateStore<MemoryStateRepository>) {
        let repo = MemoryStateRepository::default();
        let store = StateStore::load(repo.clone());
        (repo, store)
    }

    #[test]
    fn test_unknown_account_is_not_skipped() {
        let (_, store) = store();
        assert!(!CircuitBreaker::default().should_skip_at(&store, "x", 1000.0));
    }

    #[test]
    fn test_first_timeout_only_counts() {
        let (repo, mut store) = store();
        let breaker = CircuitBreaker::default();

        assert!(!breaker.record_timeout_at(&mut store, "x", 1000.0));

        let stored = repo.stored();
        assert_eq!(stored["x"], AccountState { timeout_count: 1, skip_until: None });
        assert!(!breaker.should_skip_at(&store, "x", 1000.0));
    }

    #[test]
    fn test_second_timeout_trips() {
        let (repo, mut store) = store();
        let breaker = CircuitBreaker::default();

        breaker.record_timeout_at(&mut store, "x", 1000.0);
        assert!(breaker.record_timeout_at(&mut store, "x", 1000.0));

        let stored = repo.stored();
        assert_eq!(stored["x"].timeout_count, 0);
        assert_eq!(stored["x"].skip_until, Some(1000.0 + DAY));
        assert!(breaker.should_skip_at(&store, "x", 1000.0));
    }

    #[test]
    fn test_threshold_minus_one_never_trips() {
        let (_, mut store) = store();
        let breaker = CircuitBreaker::new(5, Duration::from_secs(3600));

        for _ in 0..4 {
            assert!(!breaker.record_timeout_at(&mut store, "x", 0.0));
        }
        assert_eq!(store.get("x").map(|s| s.timeout_count), Some(4));
        assert!(breaker.record_timeout_at(&mut store, "x", 0.0));
        assert_eq!(store.get("x").map(|s| s.timeout_count), Some(0));
    }

    #[test]
    fn test_trip_uses_wall_clock() {
        let (_, mut store) = store();
        let breaker = CircuitBreaker::default();

        let before = unix_now();
        breaker.record_timeout(&mut store, "x");
        assert!(breaker.record_timeout(&mut store, "x"));
        let after = unix_now();

        let until = store.get("x").and_then(|s| s.skip_until).unwrap();
        assert!(until >= before + DAY - 1.0);
        assert!(until <= after + DAY + 1.0);
        assert!(breaker.should_skip(&store, "x"));
    }

    #[test]
    fn test_skip_ends_exactly_when_window_elapses() {
        let (repo, mut store) = store();
        let breaker = CircuitBreaker::default();
        breaker.record_timeout_at(&mut store, "x", 0.0);
        breaker.record_timeout_at(&mut store, "x", 0.0);
        let saves = repo.save_count();

        assert!(breaker.should_skip_at(&store, "x", DAY - 0.001));
        assert!(!breaker.should_skip_at(&store, "x", DAY));
        assert!(!breaker.should_skip_at(&store, "x", DAY + 1.0));
        assert_eq!(repo.save_count(), saves);
    }

    #[test]
    fn test_success_clears_history() {
        let (repo, mut store) = store();
        let breaker = CircuitBreaker::default();

        breaker.record_timeout_at(&mut store, "x", 0.0);
        breaker.record_success(&mut store, "x");
        assert!(repo.stored().is_empty());

        // Counter starts fresh
        assert!(!breaker.record_timeout_at(&mut store, "x", 0.0));
        assert_eq!(store.get("x").map(|s| s.timeout_count), Some(1));
    }

    #[test]
    fn test_success_without_state_is_noop() {
        let (repo, mut store) = store();
        CircuitBreaker::default().record_success(&mut store, "x");
        CircuitBreaker::default().record_success(&mut store, "x");
        assert_eq!(repo.save_count(), 0);
    }

    #[test]
    fn test_success_lifts_cooldown() {
        let (_, mut store) = store();
        let breaker = CircuitBreaker::default();
        breaker.record_timeout_at(&mut store, "x", 0.0);
        breaker.record_timeout_at(&mut store, "x", 0.0);

        breaker.record_success(&mut store, "x");
        assert!(!breaker.should_skip_at(&store, "x", 1.0));
    }

    #[test]
    fn test_counting_after_expired_cooldown_keeps_old_timestamp() {
        let (_, mut store) = store();
        let breaker = CircuitBreaker::default();
        breaker.record_timeout_at(&mut store, "x", 0.0);
        breaker.record_timeout_at(&mut store, "x", 0.0);

        assert!(!breaker.record_timeout_at(&mut store, "x", 2.0 * DAY));
        let record = store.get("x").unwrap();
        assert_eq!(record.timeout_count, 1);
        assert_eq!(record.skip_until, Some(DAY));
        assert!(!breaker.should_skip_at(&store, "x", 2.0 * DAY));
    }

    #[test]
    fn test_cooldown_remaining() {
        let (_, mut store) = store();
        let breaker = CircuitBreaker::new(1, Duration::from_secs(3600));
        assert!(breaker.record_timeout_at(&mut store, "x", 100.0));

        assert_eq!(
            breaker.cooldown_remaining_at(&store, "x", 100.0),
            Some(Duration::from_secs(3600))
        );
        assert_eq!(breaker.cooldown_remaining_at(&store, "x", 3700.0), None);
        assert_eq!(breaker.cooldown_remaining_at(&store, "y", 100.0), None);
    }

    #[test]
    fn test_far_future_cooldown_still_skips() {
        let repo = MemoryStateRepository::with_state(
            [(
                "x".to_string(),
                AccountState {
                    timeout_count: 0,
                    skip_until: Some(1e20),
                },
            )]
            .into(),
        );
        let store = StateStore::load(repo);
        let breaker = CircuitBreaker::default();

        assert!(breaker.should_skip_at(&store, "x", 1000.0));
        assert_eq!(breaker.cooldown_remaining_at(&store, "x", 1000.0), None);
    }

    #[test]
    fn test_saturated_counter_trips() {
        let repo = MemoryStateRepository::with_state(
            [(
                "x".to_string(),
                AccountState {
                    timeout_count: u32::MAX,
                    skip_until: None,
                },
            )]
            .into(),
        );
        let mut store = StateStore::load(repo);
        let breaker = CircuitBreaker::default();

        assert!(breaker.record_timeout_at(&mut store, "x", 0.0));
        assert_eq!(store.get("x").map(|s| s.timeout_count), Some(0));
        assert_eq!(store.get("x").and_then(|s| s.skip_until), Some(DAY));
    }
}
