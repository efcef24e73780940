// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable line and
//! [`StructuredLog`] for emitting it with structured fields at the level the
//! event warrants.
//!
//! # Usage Pattern
//!
//! ```rust
//! use nodeflow::observability::messages::engine::FlowRunStarted;
//! use nodeflow::observability::messages::StructuredLog;
//!
//! let msg = FlowRunStarted {
//!     flow: "qa",
//!     start_node: "answer",
//!     node_count: 1,
//! };
//!
//! let span = msg.span("qa_turn");
//! let _entered = span.enter();
//! msg.log();
//! ```

use tracing::Span;

pub mod batch;
pub mod engine;
pub mod node;
pub mod service;
pub mod session;
pub mod validation;

/// A log event with a fixed level and structured fields.
pub trait StructuredLog {
    /// Emit the event at its level with its fields attached.
    fn log(&self);

    /// A span carrying the same fields, for scoping work under this event.
    fn span(&self, name: &str) -> Span;
}
