//! Retry scheduling
//!
//! Attempts are never retried in place. A transient failure turns into a
//! `Deferred` attempt and the orchestrator schedules the retry after the current
//! phase; the scheduler only decides the outcome of each single attempt.

use std::future::Future;
use std::time::Duration;

use tokio::time::timeout;

use dns_purge_provider::{ErrorClass, ProviderError};

use super::simulator::Dispatch;
use crate::error::{CoreError, CoreResult};
use crate::types::{AttemptError, AttemptOutcome, DeletionAttempt, PlanAction};

/// Provider name carried by timeouts raised by the scheduler itself.
const SCHEDULER: &str = "scheduler";

/// Default attempt budget for resources still in use.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Retry limits and timings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts allowed for `TransientInUse` failures (timeouts included).
    pub max_attempts: u32,
    /// Attempts allowed for `RateLimited` failures; never above `max_attempts`.
    pub rate_limited_max_attempts: u32,
    /// Wait between a phase and the retry of its deferred resources.
    pub phase_backoff: Duration,
    /// Upper bound on a provider-suggested `retry_after`.
    pub max_backoff: Duration,
    /// Per-call timeout; an elapsed timeout counts as `TransientInUse`.
    pub call_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            rate_limited_max_attempts: 2,
            phase_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(30),
            call_timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Attempt budget for an error class; terminal classes get a single attempt.
    pub fn limit_for(&self, class: ErrorClass) -> u32 {
        match class {
            ErrorClass::TransientInUse => self.max_attempts,
            ErrorClass::RateLimited => self.rate_limited_max_attempts,
            _ => 1,
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.max_attempts == 0 || self.rate_limited_max_attempts == 0 {
            return Err(CoreError::ConfigError(
                "retry attempt limits must be at least 1".to_string(),
            ));
        }
        if self.rate_limited_max_attempts > self.max_attempts {
            return Err(CoreError::ConfigError(format!(
                "rate_limited_max_attempts ({}) must not exceed max_attempts ({})",
                self.rate_limited_max_attempts, self.max_attempts
            )));
        }
        if self.call_timeout.is_zero() {
            return Err(CoreError::ConfigError(
                "call timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Runs one attempt and classifies its result.
#[derive(Debug, Clone)]
pub struct RetryScheduler {
    policy: RetryPolicy,
}

impl RetryScheduler {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute `dispatch` under the call timeout and record the attempt.
    ///
    /// `attempt_count` is 1-based.
    pub async fn attempt<F>(
        &self,
        account: &str,
        action: &PlanAction,
        attempt_count: u32,
        dispatch: F,
    ) -> DeletionAttempt
    where
        F: Future<Output = Dispatch>,
    {
        let Dispatch { result, simulated } = match timeout(self.policy.call_timeout, dispatch).await
        {
            Ok(dispatched) => dispatched,
            Err(_) => Dispatch {
                result: Err(ProviderError::Timeout {
                    provider: SCHEDULER.to_string(),
                    detail: format!(
                        "call did not complete within {}ms",
                        self.policy.call_timeout.as_millis()
                    ),
                }),
                simulated: false,
            },
        };

        let mut attempt =
            DeletionAttempt::new(account, action.clone(), AttemptOutcome::Succeeded, attempt_count);
        attempt.simulated = simulated;

        if let Err(error) = result {
            attempt.outcome = self.outcome_for(&error, attempt_count);
            if error.class() == ErrorClass::NotFound {
                attempt.already_absent = true;
            } else {
                let mut captured = AttemptError::from(&error);
                if attempt.outcome == AttemptOutcome::Failed && error.class().is_transient() {
                    captured.message =
                        format!("gave up after {attempt_count} attempts: {}", captured.message);
                }
                attempt.error = Some(captured);
            }
        }
        attempt
    }

    /// Outcome of a failed attempt.
    pub fn outcome_for(&self, error: &ProviderError, attempt_count: u32) -> AttemptOutcome {
        match error.class() {
            ErrorClass::NotFound => AttemptOutcome::Succeeded,
            class if class.is_transient() => {
                if attempt_count < self.policy.limit_for(class) {
                    AttemptOutcome::Deferred
                } else {
                    AttemptOutcome::Failed
                }
            }
            _ => AttemptOutcome::Failed,
        }
    }

    /// Wait before retrying the given deferred errors.
    ///
    /// The largest provider `retry_after` (capped at `max_backoff`) wins over the
    /// fixed `phase_backoff`.
    pub fn backoff<'e>(&self, deferred: impl IntoIterator<Item = &'e AttemptError>) -> Duration {
        deferred
            .into_iter()
            .filter_map(|e| e.retry_after)
            .max()
            .map_or(self.policy.phase_backoff, |secs| {
                Duration::from_secs(secs).min(self.policy.max_backoff)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dns_purge_provider::{AccountRef, ResourceRecord, ResourceType};

    fn action() -> PlanAction {
        let account = AccountRef::new("111122223333", "us-east-1");
        PlanAction::Delete(ResourceRecord::new(
            ResourceType::HealthCheck,
            "hc-1",
            "web",
            &account,
        ))
    }

    fn in_use() -> ProviderError {
        ProviderError::ResourceInUse {
            provider: "memory".into(),
            resource_id: "hc-1".into(),
            raw_message: None,
        }
    }

    fn rate_limited(retry_after: Option<u64>) -> ProviderError {
        ProviderError::RateLimited {
            provider: "memory".into(),
            retry_after,
            raw_message: None,
        }
    }

    fn failed_with(error: ProviderError) -> Dispatch {
        Dispatch {
            result: Err(error),
            simulated: false,
        }
    }

    #[test]
    fn transient_errors_defer_until_the_limit() {
        let scheduler = RetryScheduler::new(RetryPolicy::default());
        assert_eq!(scheduler.outcome_for(&in_use(), 1), AttemptOutcome::Deferred);
        assert_eq!(scheduler.outcome_for(&in_use(), 2), AttemptOutcome::Deferred);
        assert_eq!(scheduler.outcome_for(&in_use(), 3), AttemptOutcome::Failed);
    }

    #[test]
    fn rate_limits_have_a_smaller_budget() {
        let scheduler = RetryScheduler::new(RetryPolicy::default());
        let error = rate_limited(None);
        assert_eq!(scheduler.outcome_for(&error, 1), AttemptOutcome::Deferred);
        assert_eq!(scheduler.outcome_for(&error, 2), AttemptOutcome::Failed);
    }

    #[test]
    fn terminal_errors_fail_on_first_attempt() {
        let scheduler = RetryScheduler::new(RetryPolicy::default());
        let denied = ProviderError::PermissionDenied {
            provider: "memory".into(),
            raw_message: None,
        };
        let unknown = ProviderError::Unknown {
            provider: "memory".into(),
            raw_code: Some("InternalFailure".into()),
            raw_message: "boom".into(),
        };
        assert_eq!(scheduler.outcome_for(&denied, 1), AttemptOutcome::Failed);
        assert_eq!(scheduler.outcome_for(&unknown, 1), AttemptOutcome::Failed);
    }

    #[tokio::test]
    async fn not_found_counts_as_success() {
        let scheduler = RetryScheduler::new(RetryPolicy::default());
        let missing = ProviderError::NotFound {
            provider: "memory".into(),
            resource_id: "hc-1".into(),
        };
        let attempt = scheduler
            .attempt("111122223333", &action(), 1, async { failed_with(missing) })
            .await;
        assert_eq!(attempt.outcome, AttemptOutcome::Succeeded);
        assert!(attempt.already_absent);
        assert!(attempt.error.is_none());
    }

    #[tokio::test]
    async fn exhausted_attempt_explains_itself() {
        let scheduler = RetryScheduler::new(RetryPolicy::default());
        let attempt = scheduler
            .attempt("111122223333", &action(), 3, async { failed_with(in_use()) })
            .await;
        assert_eq!(attempt.outcome, AttemptOutcome::Failed);
        let error = attempt.error.unwrap();
        assert_eq!(error.class, ErrorClass::TransientInUse);
        assert!(error.message.starts_with("gave up after 3 attempts"));
    }

    #[tokio::test]
    async fn slow_call_times_out_as_transient() {
        let scheduler = RetryScheduler::new(RetryPolicy {
            call_timeout: Duration::from_millis(10),
            ..RetryPolicy::default()
        });
        let attempt = scheduler
            .attempt("111122223333", &action(), 1, async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                Dispatch {
                    result: Ok(()),
                    simulated: false,
                }
            })
            .await;
        assert_eq!(attempt.outcome, AttemptOutcome::Deferred);
        assert_eq!(attempt.error.unwrap().class, ErrorClass::TransientInUse);
    }

    #[test]
    fn backoff_prefers_capped_retry_after() {
        let scheduler = RetryScheduler::new(RetryPolicy::default());
        let plain = AttemptError::from(&in_use());
        assert_eq!(scheduler.backoff([&plain]), Duration::from_secs(2));

        let hinted = AttemptError::from(&rate_limited(Some(5)));
        assert_eq!(scheduler.backoff([&plain, &hinted]), Duration::from_secs(5));

        let excessive = AttemptError::from(&rate_limited(Some(600)));
        assert_eq!(scheduler.backoff([&excessive]), Duration::from_secs(30));
    }

    #[test]
    fn zero_limits_are_rejected() {
        let policy = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::default()
        };
        assert!(matches!(policy.validate(), Err(CoreError::ConfigError(_))));
        assert!(RetryPolicy::default().validate().is_ok());
    }

    #[test]
    fn rate_limited_budget_cannot_exceed_max_attempts() {
        let policy = RetryPolicy {
            max_attempts: 3,
            rate_limited_max_attempts: 5,
            ..RetryPolicy::default()
        };
        assert!(matches!(policy.validate(), Err(CoreError::ConfigError(_))));

        let equal = RetryPolicy {
            max_attempts: 3,
            rate_limited_max_attempts: 3,
            ..RetryPolicy::default()
        };
        assert!(equal.validate().is_ok());
    }
}
