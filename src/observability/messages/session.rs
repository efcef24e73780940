// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the interactive session host.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::path::Path;
use tracing::Span;

/// The interactive session is ready for input.
///
/// # Log Level
/// `info!` - Important operational event
pub struct SessionStarted<'a> {
    pub mode: &'a str,
    pub model: &'a str,
    pub image_count: usize,
}

impl Display for SessionStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Session started in {} mode with model '{}' ({} images attached)",
            self.mode, self.model, self.image_count
        )
    }
}

impl StructuredLog for SessionStarted<'_> {
    fn log(&self) {
        tracing::info!(
            mode = self.mode,
            model = self.model,
            image_count = self.image_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "session",
            span_name = name,
            mode = self.mode,
            model = self.model,
        )
    }
}

/// One conversation turn failed; the session continues.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct TurnFailed<'a> {
    pub turn: usize,
    pub error: &'a dyn std::error::Error,
}

impl Display for TurnFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Turn {} failed: {}", self.turn, self.error)
    }
}

impl StructuredLog for TurnFailed<'_> {
    fn log(&self) {
        tracing::error!(
            turn = self.turn,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("turn_failed", span_name = name, turn = self.turn)
    }
}

/// Conversation history was written to disk.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use nodeflow::observability::messages::session::HistoryPersisted;
/// use std::path::Path;
///
/// let msg = HistoryPersisted {
///     path: Path::new("Conversations/rust_2025-01-01_10-00-00.json"),
///     entries: 2,
/// };
///
/// assert_eq!(
///     msg.to_string(),
///     "Saved 2 conversation entries to Conversations/rust_2025-01-01_10-00-00.json"
/// );
/// ```
pub struct HistoryPersisted<'a> {
    pub path: &'a Path,
    pub entries: usize,
}

impl Display for HistoryPersisted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Saved {} conversation entries to {}",
            self.entries,
            self.path.display()
        )
    }
}

impl StructuredLog for HistoryPersisted<'_> {
    fn log(&self) {
        tracing::info!(
            path = %self.path.display(),
            entries = self.entries,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "history_persisted",
            span_name = name,
            path = %self.path.display(),
        )
    }
}

/// The markdown renderer was unavailable; the answer is printed as plain text.
///
/// # Log Level
/// `debug!` - Expected on hosts without the renderer installed
pub struct RendererUnavailable<'a> {
    pub program: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for RendererUnavailable<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Renderer '{}' unavailable, printing plain text: {}",
            self.program, self.error
        )
    }
}

impl StructuredLog for RendererUnavailable<'_> {
    fn log(&self) {
        tracing::debug!(
            program = self.program,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("renderer_unavailable", span_name = name, program = self.program)
    }
}
