use std::sync::Mutex;
use std::time::Duration;

/// Per-adapter rate limiting knobs, mirroring the `rate_limiting` struct
/// in the source adapter contract.
#[derive(Debug, Clone, Copy)]
pub struct RateLimiting {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub between_events_ms: u64,
    pub max_retries: u32,
    pub cooldown_on_429_ms: u64,
    pub cooldown_on_5xx_ms: u64,
}

impl Default for RateLimiting {
    fn default() -> Self {
        Self {
            min_delay_ms: 250,
            max_delay_ms: 60_000,
            between_events_ms: 1_000,
            max_retries: 4,
            cooldown_on_429_ms: 2_000,
            cooldown_on_5xx_ms: 5_000,
        }
    }
}

/// The retry ladder, in milliseconds, consulted after a transient network or
/// 5xx failure. The Nth retry sleeps `retry_ladder_ms[N]` (clamped to the last
/// entry once exhausted).
#[derive(Debug, Clone)]
pub struct RetryLadder(pub Vec<u64>);

impl Default for RetryLadder {
    fn default() -> Self {
        RetryLadder(vec![1_000, 2_000, 5_000, 10_000])
    }
}

impl RetryLadder {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let idx = (attempt as usize).min(self.0.len().saturating_sub(1));
        Duration::from_millis(self.0.get(idx).copied().unwrap_or(10_000))
    }
}

#[derive(Debug)]
struct RateState {
    backoff_ms: u64,
    consecutive_successes: u32,
    rate_limit_hits: u64,
}

/// Reactive backoff shared across every request in a single scraper run.
///
/// Before each HTTP call the caller sleeps the current backoff `B`
/// (initialized to `min_delay_ms`). A 429 doubles `B` (capped at
/// `max_delay_ms`); ten consecutive successes halve it back down (floored
/// at `min_delay_ms`). This mirrors the control loop in spec.md §4.2 --
/// deliberately simple integer arithmetic behind a mutex.
pub struct RateController {
    limits: RateLimiting,
    state: Mutex<RateState>,
}

impl RateController {
    pub fn new(limits: RateLimiting) -> Self {
        Self {
            state: Mutex::new(RateState {
                backoff_ms: limits.min_delay_ms,
                consecutive_successes: 0,
                rate_limit_hits: 0,
            }),
            limits,
        }
    }

    /// The delay to sleep before issuing the next request.
    pub fn current_backoff(&self) -> Duration {
        let state = self.state.lock().unwrap();
        Duration::from_millis(state.backoff_ms)
    }

    pub fn on_success(&self) {
        let mut state = self.state.lock().unwrap();
        state.consecutive_successes += 1;
        if state.consecutive_successes >= 10 {
            state.backoff_ms = (state.backoff_ms / 2).max(self.limits.min_delay_ms);
            state.consecutive_successes = 0;
        }
    }

    pub fn on_rate_limited(&self) -> Duration {
        let mut state = self.state.lock().unwrap();
        state.consecutive_successes = 0;
        state.rate_limit_hits += 1;
        state.backoff_ms = (state.backoff_ms * 2).min(self.limits.max_delay_ms);
        Duration::from_millis(self.limits.cooldown_on_429_ms)
    }

    pub fn on_server_error(&self) -> Duration {
        let mut state = self.state.lock().unwrap();
        state.consecutive_successes = 0;
        Duration::from_millis(self.limits.cooldown_on_5xx_ms)
    }

    pub fn rate_limit_hits(&self) -> u64 {
        self.state.lock().unwrap().rate_limit_hits
    }

    pub fn between_events_delay(&self) -> Duration {
        Duration::from_millis(self.limits.between_events_ms)
    }

    pub fn max_retries(&self) -> u32 {
        self.limits.max_retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> RateLimiting {
        RateLimiting {
            min_delay_ms: 100,
            max_delay_ms: 1_600,
            between_events_ms: 500,
            max_retries: 3,
            cooldown_on_429_ms: 1_000,
            cooldown_on_5xx_ms: 2_000,
        }
    }

    #[test]
    fn rate_limit_doubles_backoff_and_caps_at_max() {
        let rc = RateController::new(limits());
        assert_eq!(rc.current_backoff(), Duration::from_millis(100));
        rc.on_rate_limited();
        assert_eq!(rc.current_backoff(), Duration::from_millis(200));
        for _ in 0..10 {
            rc.on_rate_limited();
        }
        assert_eq!(rc.current_backoff(), Duration::from_millis(1_600));
    }

    #[test]
    fn ten_consecutive_successes_halve_backoff_floored_at_min() {
        let rc = RateController::new(limits());
        rc.on_rate_limited();
        rc.on_rate_limited();
        assert_eq!(rc.current_backoff(), Duration::from_millis(400));

        for _ in 0..10 {
            rc.on_success();
        }
        assert_eq!(rc.current_backoff(), Duration::from_millis(200));

        for _ in 0..10 {
            rc.on_success();
        }
        assert_eq!(rc.current_backoff(), Duration::from_millis(100));
    }

    #[test]
    fn fewer_than_ten_successes_do_not_touch_backoff() {
        let rc = RateController::new(limits());
        rc.on_rate_limited();
        let backoff_before = rc.current_backoff();
        for _ in 0..9 {
            rc.on_success();
        }
        assert_eq!(rc.current_backoff(), backoff_before);
    }

    #[test]
    fn retry_ladder_clamps_to_last_entry() {
        let ladder = RetryLadder(vec![100, 200, 400]);
        assert_eq!(ladder.delay_for(0), Duration::from_millis(100));
        assert_eq!(ladder.delay_for(2), Duration::from_millis(400));
        assert_eq!(ladder.delay_for(50), Duration::from_millis(400));
    }
}
