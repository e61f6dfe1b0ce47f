// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Retry policy for failed label dispatches.
//
// Every dispatch failure counts the same: there is no error classification
// and no per-job backoff stored in the row.  A failed job goes straight back
// to `Pending` (keeping its original `created_at`, so it is reclaimed ahead of
// newer arrivals) until the ceiling is reached, at which point it becomes
// `Failed` for good.  The worker that saw the failure pauses for
// `failure_pause` before pulling more work, which throttles a printer that is
// failing every job.

use std::time::Duration;

use etikett_core::ServiceConfig;
use etikett_core::types::JobStatus;
use tracing::debug;

/// Retry configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Failed attempts after which a job is `Failed`.
    pub max_attempts: u32,
    /// Pause a worker takes after reporting a failure.
    pub failure_pause: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            failure_pause: Duration::from_secs(5),
        }
    }
}

impl From<&ServiceConfig> for RetryPolicy {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            failure_pause: config.failure_pause(),
        }
    }
}

/// What happens to a job after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Back to `Pending` with the new attempt count.
    Retry { attempts: u32 },
    /// Ceiling reached; the job becomes `Failed` with the new attempt count.
    Exhausted { attempts: u32 },
}

impl RetryDecision {
    /// Status the job moves to.
    pub fn status(&self) -> JobStatus {
        match self {
            Self::Retry { .. } => JobStatus::Pending,
            Self::Exhausted { .. } => JobStatus::Failed,
        }
    }

    /// Attempt count recorded with the transition.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Retry { attempts } | Self::Exhausted { attempts } => *attempts,
        }
    }
}

impl RetryPolicy {
    /// Decide the next state for a job that has failed `attempts` times
    /// before this failure.
    ///
    /// `attempts + 1 >= max_attempts` exhausts the job.
    pub fn decide(&self, attempts: u32) -> RetryDecision {
        let next = attempts.saturating_add(1);
        if next >= self.max_attempts {
            debug!(attempts = next, max = self.max_attempts, "retry limit exhausted");
            RetryDecision::Exhausted { attempts: next }
        } else {
            debug!(attempts = next, max = self.max_attempts, "job will be retried");
            RetryDecision::Retry { attempts: next }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_failures_are_retried() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.decide(0), RetryDecision::Retry { attempts: 1 });
        assert_eq!(policy.decide(1), RetryDecision::Retry { attempts: 2 });
    }

    #[test]
    fn ceiling_exhausts() {
        let policy = RetryPolicy::default();
        let decision = policy.decide(2);
        assert_eq!(decision, RetryDecision::Exhausted { attempts: 3 });
        assert_eq!(decision.status(), JobStatus::Failed);
    }

    #[test]
    fn single_attempt_policy_never_retries() {
        let policy = RetryPolicy {
            max_attempts: 1,
            ..Default::default()
        };
        assert_eq!(policy.decide(0), RetryDecision::Exhausted { attempts: 1 });
    }

    #[test]
    fn retry_returns_to_pending() {
        let decision = RetryPolicy::default().decide(0);
        assert_eq!(decision.status(), JobStatus::Pending);
        assert_eq!(decision.attempts(), 1);
    }

    #[test]
    fn attempts_only_increase() {
        let policy = RetryPolicy {
            max_attempts: 10,
            ..Default::default()
        };
        for before in 0..12 {
            assert!(policy.decide(before).attempts() > before);
        }
    }

    #[test]
    fn saturates_instead_of_wrapping() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.decide(u32::MAX),
            RetryDecision::Exhausted { attempts: u32::MAX }
        );
    }

    #[test]
    fn built_from_service_config() {
        let config = ServiceConfig {
            max_attempts: 5,
            failure_pause_ms: 250,
            ..Default::default()
        };
        let policy = RetryPolicy::from(&config);
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.failure_pause, Duration::from_millis(250));
    }
}
