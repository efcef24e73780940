// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Retry policy for the exec phase.
//!
//! Exec is the only phase the engine re-invokes. It receives nothing but the
//! prepared value, so a retry cannot observe store state mutated by an earlier
//! attempt. After the last failed attempt the node's fallback gets one chance to
//! produce a substitute result.

use std::time::Duration;

use crate::engine::context::RunContext;
use crate::errors::{FlowError, Phase};
use crate::observability::messages::node::{ExecAttemptFailed, FallbackRecovered, RetriesExhausted};
use crate::observability::messages::StructuredLog;
use crate::traits::Node;

/// Wait between exec attempts.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RetryDelay {
    /// Retry immediately.
    #[default]
    None,
    /// Same wait before every retry.
    Constant(Duration),
    /// `initial * factor^n` before retry `n` (0-based), capped at `max`.
    Exponential {
        initial: Duration,
        max: Duration,
        factor: u32,
    },
}

/// How many times a failing exec is re-invoked and how long to wait in between.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use nodeflow::engine::RetryPolicy;
///
/// let policy = RetryPolicy::exponential(3, Duration::from_millis(100), Duration::from_secs(1));
/// assert_eq!(policy.max_attempts(), 4);
/// assert_eq!(policy.delay_for(0), Duration::from_millis(100));
/// assert_eq!(policy.delay_for(1), Duration::from_millis(200));
/// assert_eq!(policy.delay_for(5), Duration::from_secs(1));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: RetryDelay,
}

impl RetryPolicy {
    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self::default()
    }

    /// `max_retries` immediate retries.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            delay: RetryDelay::None,
        }
    }

    pub fn constant(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries,
            delay: RetryDelay::Constant(delay),
        }
    }

    pub fn exponential(max_retries: u32, initial: Duration, max: Duration) -> Self {
        Self {
            max_retries,
            delay: RetryDelay::Exponential {
                initial,
                max,
                factor: 2,
            },
        }
    }

    pub fn with_delay(mut self, delay: RetryDelay) -> Self {
        self.delay = delay;
        self
    }

    /// Total exec invocations allowed, counting the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Wait before retry number `retry` (0 = the wait after the first failure).
    pub fn delay_for(&self, retry: u32) -> Duration {
        match &self.delay {
            RetryDelay::None => Duration::ZERO,
            RetryDelay::Constant(delay) => *delay,
            RetryDelay::Exponential {
                initial,
                max,
                factor,
            } => {
                let multiplier = factor.checked_pow(retry).unwrap_or(u32::MAX);
                initial.checked_mul(multiplier).unwrap_or(*max).min(*max)
            }
        }
    }
}

/// Invoke `node.exec` under its retry policy, then its fallback.
///
/// Returns the exec result, the fallback's substitute result, or
/// [`FlowError::Exec`] carrying the final error and the attempt count.
pub(crate) async fn exec_with_retry<N>(
    node: &N,
    node_id: &str,
    ctx: &RunContext,
    prep: &N::Prep,
) -> Result<N::Exec, FlowError>
where
    N: Node,
{
    let policy = node.retry_policy();
    let max_attempts = policy.max_attempts();
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        let outcome = ctx
            .guard(node.exec(ctx, prep))
            .await
            .map_err(|interrupted| FlowError::interrupted(node_id, Phase::Exec, interrupted))?;

        let error = match outcome {
            Ok(result) => return Ok(result),
            Err(error) => error,
        };

        if attempt < max_attempts {
            let delay = policy.delay_for(attempt - 1);
            ExecAttemptFailed {
                node_id,
                attempt,
                max_attempts,
                delay,
                error: &*error,
            }
            .log();

            if !delay.is_zero() {
                ctx.sleep(delay).await.map_err(|interrupted| {
                    FlowError::interrupted(node_id, Phase::Exec, interrupted)
                })?;
            }
            continue;
        }

        RetriesExhausted {
            node_id,
            attempts: attempt,
            error: &*error,
        }
        .log();

        let recovered = ctx
            .guard(node.exec_fallback(ctx, prep, error))
            .await
            .map_err(|interrupted| FlowError::interrupted(node_id, Phase::Exec, interrupted))?;

        return match recovered {
            Ok(result) => {
                FallbackRecovered {
                    node_id,
                    attempts: attempt,
                }
                .log();
                Ok(result)
            }
            Err(source) => Err(FlowError::Exec {
                node: node_id.to_string(),
                attempts: attempt,
                source,
            }),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_policy_is_single_attempt() {
        let policy = RetryPolicy::none();
        assert_eq!(policy.max_attempts(), 1);
        assert_eq!(policy.delay_for(0), Duration::ZERO);
    }

    #[test]
    fn test_constant_delay() {
        let policy = RetryPolicy::constant(2, Duration::from_millis(250));
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.delay_for(0), Duration::from_millis(250));
        assert_eq!(policy.delay_for(7), Duration::from_millis(250));
    }

    #[test]
    fn test_exponential_delay_is_capped() {
        let policy = RetryPolicy::exponential(10, Duration::from_millis(50), Duration::from_millis(300));
        assert_eq!(policy.delay_for(0), Duration::from_millis(50));
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(300));
        assert_eq!(policy.delay_for(40), Duration::from_millis(300));
    }

    #[test]
    fn test_max_attempts_saturates() {
        assert_eq!(RetryPolicy::new(u32::MAX).max_attempts(), u32::MAX);
    }
}
