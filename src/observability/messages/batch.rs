// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for batch fan-out.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// A batch is about to process its items.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use nodeflow::observability::messages::batch::BatchStarted;
///
/// let msg = BatchStarted {
///     processor: "label_items",
///     item_count: 3,
///     mode: "concurrent",
///     max_concurrency: Some(2),
/// };
///
/// assert_eq!(
///     msg.to_string(),
///     "Batch 'label_items' processing 3 items (concurrent, max_concurrency=2)"
/// );
/// ```
pub struct BatchStarted<'a> {
    pub processor: &'a str,
    pub item_count: usize,
    pub mode: &'a str,
    pub max_concurrency: Option<usize>,
}

impl Display for BatchStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.max_concurrency {
            Some(limit) => write!(
                f,
                "Batch '{}' processing {} items ({}, max_concurrency={})",
                self.processor, self.item_count, self.mode, limit
            ),
            None => write!(
                f,
                "Batch '{}' processing {} items ({})",
                self.processor, self.item_count, self.mode
            ),
        }
    }
}

impl StructuredLog for BatchStarted<'_> {
    fn log(&self) {
        tracing::info!(
            processor = self.processor,
            item_count = self.item_count,
            mode = self.mode,
            max_concurrency = ?self.max_concurrency,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "batch",
            span_name = name,
            processor = self.processor,
            item_count = self.item_count,
            mode = self.mode,
        )
    }
}

/// One item of a batch failed.
///
/// # Log Level
/// `warn!` - The batch decides whether this is fatal
pub struct BatchItemFailed<'a> {
    pub processor: &'a str,
    pub index: usize,
    pub error: &'a dyn std::error::Error,
}

impl Display for BatchItemFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Batch '{}' item {} failed: {}",
            self.processor, self.index, self.error
        )
    }
}

impl StructuredLog for BatchItemFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            processor = self.processor,
            index = self.index,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "batch_item_failed",
            span_name = name,
            processor = self.processor,
            index = self.index,
        )
    }
}

/// All items of a batch have settled.
///
/// # Log Level
/// `info!` - Important operational event
pub struct BatchCompleted<'a> {
    pub processor: &'a str,
    pub item_count: usize,
    pub failed: usize,
    pub duration: Duration,
}

impl Display for BatchCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Batch '{}' finished {} items ({} failed) in {:?}",
            self.processor, self.item_count, self.failed, self.duration
        )
    }
}

impl StructuredLog for BatchCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            processor = self.processor,
            item_count = self.item_count,
            failed = self.failed,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "batch_completed",
            span_name = name,
            processor = self.processor,
            item_count = self.item_count,
            failed = self.failed,
        )
    }
}
