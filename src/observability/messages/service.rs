// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for calls to the completion and search services.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// A completion request is being sent.
///
/// # Log Level
/// `debug!` - Request detail
pub struct CompletionRequested<'a> {
    pub model: &'a str,
    pub prompt_chars: usize,
    pub image_count: usize,
    pub grounded: bool,
}

impl Display for CompletionRequested<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Requesting completion from '{}': {} prompt chars, {} images, grounding={}",
            self.model, self.prompt_chars, self.image_count, self.grounded
        )
    }
}

impl StructuredLog for CompletionRequested<'_> {
    fn log(&self) {
        tracing::debug!(
            model = self.model,
            prompt_chars = self.prompt_chars,
            image_count = self.image_count,
            grounded = self.grounded,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "completion",
            span_name = name,
            model = self.model,
            image_count = self.image_count,
            grounded = self.grounded,
        )
    }
}

/// A completion response arrived.
///
/// # Log Level
/// `info!` - Important operational event
pub struct CompletionReceived<'a> {
    pub model: &'a str,
    pub response_chars: usize,
    pub source_count: usize,
    pub duration: Duration,
}

impl Display for CompletionReceived<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Completion from '{}' returned {} chars with {} sources in {:?}",
            self.model, self.response_chars, self.source_count, self.duration
        )
    }
}

impl StructuredLog for CompletionReceived<'_> {
    fn log(&self) {
        tracing::info!(
            model = self.model,
            response_chars = self.response_chars,
            source_count = self.source_count,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "completion_received",
            span_name = name,
            model = self.model,
            duration = ?self.duration,
        )
    }
}

/// A web search finished.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use nodeflow::observability::messages::service::SearchCompleted;
/// use std::time::Duration;
///
/// let msg = SearchCompleted {
///     query: "rust async traits",
///     result_count: 3,
///     duration: Duration::from_millis(420),
/// };
///
/// assert_eq!(msg.to_string(), "Search for 'rust async traits' returned 3 results in 420ms");
/// ```
pub struct SearchCompleted<'a> {
    pub query: &'a str,
    pub result_count: usize,
    pub duration: Duration,
}

impl Display for SearchCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Search for '{}' returned {} results in {:?}",
            self.query, self.result_count, self.duration
        )
    }
}

impl StructuredLog for SearchCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            query = self.query,
            result_count = self.result_count,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "search",
            span_name = name,
            query = self.query,
        )
    }
}

/// A service call failed.
///
/// # Log Level
/// `warn!` - The calling node's retry policy decides what happens next
pub struct ServiceCallFailed<'a> {
    pub service: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ServiceCallFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Call to {} failed: {}", self.service, self.error)
    }
}

impl StructuredLog for ServiceCallFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            service = self.service,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "service_call_failed",
            span_name = name,
            service = self.service,
        )
    }
}
