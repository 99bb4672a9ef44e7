// Retry utilities
// Bounded exponential backoff with uniform jitter, driven as a small state machine.

use crate::types::{AppError, AppResult};
use async_trait::async_trait;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry configuration for one outbound request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before retry `i` is `backoff_base^i` seconds plus jitter
    pub backoff_base: f64,
    /// Upper bound of the uniform jitter, in seconds
    pub jitter_max: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: 2.0,
            jitter_max: 1.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_base: f64, jitter_max: f64) -> AppResult<Self> {
        if max_attempts < 1 {
            return Err(AppError::Config(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if !backoff_base.is_finite() || backoff_base <= 1.0 {
            return Err(AppError::Config(format!(
                "backoff_base must be greater than 1, got {}",
                backoff_base
            )));
        }
        if !jitter_max.is_finite() || jitter_max < 0.0 {
            return Err(AppError::Config(format!(
                "jitter_max must be non-negative, got {}",
                jitter_max
            )));
        }

        Ok(Self {
            max_attempts,
            backoff_base,
            jitter_max,
        })
    }

    /// Deterministic part of the delay after failed attempt `attempt` (0-indexed)
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let secs = self.backoff_base.powi(attempt.min(i32::MAX as u32) as i32);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }

    /// Full delay after failed attempt `attempt`, in `[base, base + jitter_max]`
    pub fn delay_for<R: Rng>(&self, attempt: u32, rng: &mut R) -> Duration {
        let jitter = if self.jitter_max > 0.0 {
            rng.gen_range(0.0..=self.jitter_max)
        } else {
            0.0
        };
        self.base_delay(attempt)
            .saturating_add(Duration::from_secs_f64(jitter))
    }
}

/// Classified outcome of a single attempt
#[derive(Debug)]
pub enum Attempt<T, E> {
    Done(T),
    /// Transient failure, eligible for another attempt
    Retry(E),
    /// Permanent failure, stop immediately
    Abort(E),
}

#[derive(Debug, PartialEq)]
pub enum RetryError<E> {
    Exhausted { attempts: u32, last: E },
    Aborted(E),
}

#[derive(Debug, PartialEq)]
pub enum RetryState<T, E> {
    Attempting(u32),
    Success(T),
    Failed(RetryError<E>),
}

impl<T, E> RetryState<T, E> {
    /// Transition out of `Attempting(attempt)` given that attempt's outcome
    pub fn advance(attempt: u32, outcome: Attempt<T, E>, policy: &RetryPolicy) -> Self {
        match outcome {
            Attempt::Done(value) => RetryState::Success(value),
            Attempt::Abort(error) => RetryState::Failed(RetryError::Aborted(error)),
            Attempt::Retry(error) => {
                let attempts = attempt + 1;
                if attempts >= policy.max_attempts {
                    RetryState::Failed(RetryError::Exhausted {
                        attempts,
                        last: error,
                    })
                } else {
                    RetryState::Attempting(attempts)
                }
            }
        }
    }
}

/// Source of the pause between attempts
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, delay: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Run `operation` until it succeeds, aborts, or the policy's attempt budget is spent.
/// The closure receives the 0-based attempt index. Sleeps only between attempts.
pub async fn with_retry<F, Fut, T, E>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Attempt<T, E>>,
    E: std::fmt::Display,
{
    let mut state = RetryState::Attempting(0);

    loop {
        state = match state {
            RetryState::Attempting(attempt) => {
                let outcome = operation(attempt).await;
                if let Attempt::Retry(ref error) = outcome {
                    warn!(
                        attempt = attempt + 1,
                        max_attempts = policy.max_attempts,
                        error = %error,
                        "Transient failure"
                    );
                }

                let next = RetryState::advance(attempt, outcome, policy);
                if matches!(next, RetryState::Attempting(_)) {
                    let delay = {
                        let mut rng = rand::thread_rng();
                        policy.delay_for(attempt, &mut rng)
                    };
                    debug!(delay_ms = delay.as_millis() as u64, "Backing off before retry");
                    sleeper.sleep(delay).await;
                }
                next
            }
            RetryState::Success(value) => return Ok(value),
            RetryState::Failed(error) => return Err(error),
        };
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingSleeper;
    use super::*;
    use std::future::ready;

    fn classify(status: u16) -> Attempt<&'static str, String> {
        match status {
            200 => Attempt::Done("ok"),
            429 | 500..=599 => Attempt::Retry(format!("status {}", status)),
            other => Attempt::Abort(format!("status {}", other)),
        }
    }

    async fn run(policy: RetryPolicy, statuses: &[u16]) -> (Result<&'static str, RetryError<String>>, Vec<Duration>) {
        let sleeper = RecordingSleeper::default();
        let result = with_retry(&policy, &sleeper, |attempt| {
            ready(classify(statuses[attempt as usize]))
        })
        .await;
        (result, sleeper.delays())
    }

    #[test]
    fn test_policy_validation() {
        assert!(RetryPolicy::new(1, 1.5, 0.0).is_ok());
        assert!(RetryPolicy::new(0, 2.0, 1.0).is_err());
        assert!(RetryPolicy::new(3, 1.0, 1.0).is_err());
        assert!(RetryPolicy::new(3, f64::NAN, 1.0).is_err());
        assert!(RetryPolicy::new(3, 2.0, -0.5).is_err());
        assert_eq!(RetryPolicy::default(), RetryPolicy::new(3, 2.0, 1.0).unwrap());
    }

    #[test]
    fn test_delay_bounds() {
        let policy = RetryPolicy::new(5, 2.0, 1.0).unwrap();
        let mut rng = rand::thread_rng();
        for attempt in 0..4 {
            let base = 2f64.powi(attempt as i32);
            for _ in 0..50 {
                let delay = policy.delay_for(attempt, &mut rng).as_secs_f64();
                assert!(delay >= base - 1e-9, "delay {} below {}", delay, base);
                assert!(delay <= base + 1.0 + 1e-9, "delay {} above {}", delay, base + 1.0);
            }
        }
    }

    #[test]
    fn test_zero_jitter_is_exact() {
        let policy = RetryPolicy::new(3, 3.0, 0.0).unwrap();
        let mut rng = rand::thread_rng();
        assert_eq!(policy.delay_for(0, &mut rng), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2, &mut rng), Duration::from_secs(9));
    }

    #[test]
    fn test_state_transitions() {
        let policy = RetryPolicy::default();

        let state: RetryState<u8, &str> = RetryState::advance(0, Attempt::Retry("busy"), &policy);
        assert_eq!(state, RetryState::Attempting(1));

        let state: RetryState<u8, &str> = RetryState::advance(2, Attempt::Retry("busy"), &policy);
        assert_eq!(
            state,
            RetryState::Failed(RetryError::Exhausted { attempts: 3, last: "busy" })
        );

        let state: RetryState<u8, &str> = RetryState::advance(0, Attempt::Abort("denied"), &policy);
        assert_eq!(state, RetryState::Failed(RetryError::Aborted("denied")));

        let state: RetryState<u8, &str> = RetryState::advance(1, Attempt::Done(7), &policy);
        assert_eq!(state, RetryState::Success(7));
    }

    #[tokio::test]
    async fn test_success_after_transient_failures() {
        let policy = RetryPolicy::new(4, 2.0, 0.5).unwrap();
        let (result, delays) = run(policy, &[429, 503, 200]).await;

        assert_eq!(result, Ok("ok"));
        assert_eq!(delays.len(), 2);
        for (attempt, delay) in delays.iter().enumerate() {
            let base = 2f64.powi(attempt as i32);
            let secs = delay.as_secs_f64();
            assert!(secs >= base - 1e-9 && secs <= base + 0.5 + 1e-9);
        }
    }

    #[tokio::test]
    async fn test_first_attempt_success_never_sleeps() {
        let (result, delays) = run(RetryPolicy::default(), &[200]).await;
        assert_eq!(result, Ok("ok"));
        assert!(delays.is_empty());
    }

    #[tokio::test]
    async fn test_exhaustion_skips_final_sleep() {
        let (result, delays) = run(RetryPolicy::default(), &[500, 502, 429, 200]).await;

        assert_eq!(
            result,
            Err(RetryError::Exhausted {
                attempts: 3,
                last: "status 429".to_string()
            })
        );
        assert_eq!(delays.len(), 2);
    }

    #[tokio::test]
    async fn test_single_attempt_policy() {
        let policy = RetryPolicy::new(1, 2.0, 1.0).unwrap();
        let (result, delays) = run(policy, &[503]).await;

        assert!(matches!(result, Err(RetryError::Exhausted { attempts: 1, .. })));
        assert!(delays.is_empty());
    }

    #[tokio::test]
    async fn test_abort_ignores_remaining_budget() {
        let policy = RetryPolicy::new(10, 2.0, 1.0).unwrap();
        let (result, delays) = run(policy, &[400]).await;

        assert_eq!(result, Err(RetryError::Aborted("status 400".to_string())));
        assert!(delays.is_empty());
    }

    #[tokio::test]
    async fn test_abort_after_retry() {
        let (result, delays) = run(RetryPolicy::default(), &[503, 401]).await;

        assert_eq!(result, Err(RetryError::Aborted("status 401".to_string())));
        assert_eq!(delays.len(), 1);
    }
}
