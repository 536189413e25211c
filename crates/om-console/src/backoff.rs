//! Retry pacing for startup discovery
//!
//! A [`RetrySchedule`] hands out the wait before each further discovery
//! attempt and says when the attempt budget is spent. Delays grow
//! geometrically up to a cap and get a random extra of up to `jitter` times
//! the base delay. Every step saturates, so no configuration can make it
//! panic.

use std::time::Duration;

use om_core::config::DiscoveryRetryConfig;

/// Wait times between discovery attempts, bounded by an attempt budget
#[derive(Debug, Clone)]
pub struct RetrySchedule {
    upcoming: Duration,
    cap: Duration,
    growth: f64,
    jitter: f64,
    attempts: u32,
    retries_left: u32,
}

impl RetrySchedule {
    /// Schedule for `config`; at least one attempt is always allowed
    pub fn new(config: &DiscoveryRetryConfig) -> Self {
        let backoff = &config.backoff;
        let attempts = config.max_attempts.max(1);
        Self {
            upcoming: backoff.initial.min(backoff.max),
            cap: backoff.max,
            // NaN.max(1.0) is 1.0; infinity saturates to the cap in `advance`
            growth: backoff.multiplier.max(1.0),
            jitter: if backoff.jitter.is_finite() {
                backoff.jitter.clamp(0.0, 1.0)
            } else {
                0.0
            },
            attempts,
            retries_left: attempts - 1,
        }
    }

    /// Total attempts this schedule allows
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Wait before the next attempt after a miss, or `None` once the budget is spent
    pub fn after_miss(&mut self) -> Option<Duration> {
        if self.retries_left == 0 {
            return None;
        }
        self.retries_left -= 1;

        let base = self.upcoming;
        self.advance();
        Some(base.saturating_add(self.spread(base)))
    }

    fn advance(&mut self) {
        let grown = Duration::try_from_secs_f64(self.upcoming.as_secs_f64() * self.growth)
            .unwrap_or(self.cap);
        self.upcoming = grown.min(self.cap);
    }

    fn spread(&self, base: Duration) -> Duration {
        if self.jitter == 0.0 {
            return Duration::ZERO;
        }
        let extra = base.as_secs_f64() * self.jitter * rand::random::<f64>();
        Duration::try_from_secs_f64(extra).unwrap_or(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use om_core::config::BackoffConfig;

    fn retry(
        max_attempts: u32,
        initial_ms: u64,
        max_ms: u64,
        multiplier: f64,
        jitter: f64,
    ) -> DiscoveryRetryConfig {
        DiscoveryRetryConfig {
            max_attempts,
            backoff: BackoffConfig {
                initial: Duration::from_millis(initial_ms),
                max: Duration::from_millis(max_ms),
                multiplier,
                jitter,
            },
        }
    }

    #[test]
    fn test_default_schedule_grows_to_cap() {
        let mut schedule = RetrySchedule::new(&retry(12, 1000, 4000, 1.5, 0.0));
        let waits: Vec<u64> = std::iter::from_fn(|| schedule.after_miss())
            .map(|d| d.as_millis() as u64)
            .collect();

        // 12 attempts leave 11 waits
        assert_eq!(waits.len(), 11);
        assert_eq!(&waits[..4], &[1000, 1500, 2250, 3375]);
        assert!(waits[4..].iter().all(|&w| w == 4000));
    }

    #[test]
    fn test_single_attempt_never_waits() {
        let mut schedule = RetrySchedule::new(&retry(0, 10, 10, 2.0, 0.0));
        assert_eq!(schedule.attempts(), 1);
        assert_eq!(schedule.after_miss(), None);
    }

    #[test]
    fn test_huge_multiplier_saturates_at_cap() {
        let mut schedule = RetrySchedule::new(&retry(4, 1000, 4000, 1e308, 0.0));
        assert_eq!(schedule.after_miss(), Some(Duration::from_secs(1)));
        assert_eq!(schedule.after_miss(), Some(Duration::from_secs(4)));
        assert_eq!(schedule.after_miss(), Some(Duration::from_secs(4)));
    }

    #[test]
    fn test_non_finite_factors_do_not_panic() {
        let mut schedule = RetrySchedule::new(&retry(5, 100, 400, f64::INFINITY, f64::NAN));
        assert_eq!(schedule.after_miss(), Some(Duration::from_millis(100)));
        assert_eq!(schedule.after_miss(), Some(Duration::from_millis(400)));

        let mut schedule = RetrySchedule::new(&retry(3, 100, 400, f64::NAN, 0.0));
        assert_eq!(schedule.after_miss(), Some(Duration::from_millis(100)));
        assert_eq!(schedule.after_miss(), Some(Duration::from_millis(100)));
    }

    #[test]
    fn test_jitter_adds_at_most_its_share() {
        let mut schedule = RetrySchedule::new(&retry(21, 200, 200, 1.0, 0.5));
        while let Some(wait) = schedule.after_miss() {
            assert!(wait >= Duration::from_millis(200));
            assert!(wait <= Duration::from_millis(300));
        }
    }
}
