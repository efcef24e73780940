// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for node phase failures, retries and fallbacks.

use crate::errors::Phase;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// A prep or post phase failed. These phases are never retried.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct PhaseFailed<'a> {
    pub node_id: &'a str,
    pub phase: Phase,
    pub error: &'a dyn std::error::Error,
}

impl Display for PhaseFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' failed in {}: {}",
            self.node_id, self.phase, self.error
        )
    }
}

impl StructuredLog for PhaseFailed<'_> {
    fn log(&self) {
        tracing::error!(
            node_id = self.node_id,
            phase = self.phase.as_str(),
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "phase_failed",
            span_name = name,
            node_id = self.node_id,
            phase = self.phase.as_str(),
        )
    }
}

/// An exec attempt failed and will be retried.
///
/// # Log Level
/// `warn!` - Recoverable issue
///
/// # Example
/// ```
/// use nodeflow::observability::messages::node::ExecAttemptFailed;
/// use std::time::Duration;
///
/// let error = std::io::Error::new(std::io::ErrorKind::Other, "503");
/// let msg = ExecAttemptFailed {
///     node_id: "answer",
///     attempt: 1,
///     max_attempts: 3,
///     delay: Duration::from_millis(500),
///     error: &error,
/// };
///
/// assert_eq!(
///     msg.to_string(),
///     "Node 'answer' exec attempt 1/3 failed, retrying in 500ms: 503"
/// );
/// ```
pub struct ExecAttemptFailed<'a> {
    pub node_id: &'a str,
    pub attempt: u32,
    pub max_attempts: u32,
    pub delay: Duration,
    pub error: &'a dyn std::error::Error,
}

impl Display for ExecAttemptFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' exec attempt {}/{} failed, retrying in {:?}: {}",
            self.node_id, self.attempt, self.max_attempts, self.delay, self.error
        )
    }
}

impl StructuredLog for ExecAttemptFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            node_id = self.node_id,
            attempt = self.attempt,
            max_attempts = self.max_attempts,
            delay_ms = self.delay.as_millis() as u64,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "exec_retry",
            span_name = name,
            node_id = self.node_id,
            attempt = self.attempt,
            max_attempts = self.max_attempts,
        )
    }
}

/// Every exec attempt failed; the fallback is next.
///
/// # Log Level
/// `warn!` - The fallback may still recover
pub struct RetriesExhausted<'a> {
    pub node_id: &'a str,
    pub attempts: u32,
    pub error: &'a dyn std::error::Error,
}

impl Display for RetriesExhausted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' exhausted {} exec attempts: {}",
            self.node_id, self.attempts, self.error
        )
    }
}

impl StructuredLog for RetriesExhausted<'_> {
    fn log(&self) {
        tracing::warn!(
            node_id = self.node_id,
            attempts = self.attempts,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "retries_exhausted",
            span_name = name,
            node_id = self.node_id,
            attempts = self.attempts,
        )
    }
}

/// The fallback produced a substitute exec result.
///
/// # Log Level
/// `info!` - Degraded but successful
pub struct FallbackRecovered<'a> {
    pub node_id: &'a str,
    pub attempts: u32,
}

impl Display for FallbackRecovered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' recovered through its fallback after {} failed attempts",
            self.node_id, self.attempts
        )
    }
}

impl StructuredLog for FallbackRecovered<'_> {
    fn log(&self) {
        tracing::info!(
            node_id = self.node_id,
            attempts = self.attempts,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "fallback_recovered",
            span_name = name,
            node_id = self.node_id,
            attempts = self.attempts,
        )
    }
}
