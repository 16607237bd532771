// Restart policy for the update loop.
//
// Pure bookkeeping: counts consecutive failures and decides how long to wait
// before the next relaunch, or whether to stop trying. The runtime side lives
// in `telegram::supervisor`.

use std::time::Duration;

/// How aggressively a failed component is relaunched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartPolicy {
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Consecutive failures tolerated before giving up. `0` means unlimited.
    pub max_restarts: u32,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
            max_restarts: 0,
        }
    }
}

/// What to do after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartDecision {
    /// Relaunch after waiting this long.
    Retry(Duration),
    /// Too many consecutive failures.
    GiveUp,
}

/// Tracks failures for one supervised component.
#[derive(Debug)]
pub struct RestartTracker {
    policy: RestartPolicy,
    consecutive_failures: u32,
    total_restarts: u64,
}

impl RestartTracker {
    pub fn new(policy: RestartPolicy) -> Self {
        Self {
            policy,
            consecutive_failures: 0,
            total_restarts: 0,
        }
    }

    /// Record a failure and decide on the next step.
    ///
    /// The delay doubles with every consecutive failure, starting at
    /// `initial_backoff` and capped at `max_backoff`.
    pub fn record_failure(&mut self) -> RestartDecision {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);

        if self.policy.max_restarts > 0 && self.consecutive_failures > self.policy.max_restarts {
            return RestartDecision::GiveUp;
        }

        self.total_restarts = self.total_restarts.saturating_add(1);
        RestartDecision::Retry(self.backoff_for(self.consecutive_failures))
    }

    /// A healthy probe resets the backoff.
    pub fn record_healthy(&mut self) {
        self.consecutive_failures = 0;
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn total_restarts(&self) -> u64 {
        self.total_restarts
    }

    fn backoff_for(&self, failures: u32) -> Duration {
        let initial = self.policy.initial_backoff.max(Duration::from_millis(1));
        let max = self.policy.max_backoff.max(initial);
        let exponent = failures.saturating_sub(1).min(31);

        initial
            .checked_mul(1u32 << exponent)
            .map(|d| d.min(max))
            .unwrap_or(max)
    }
}
