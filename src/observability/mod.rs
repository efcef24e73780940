// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Every diagnostic event the engine and the application emit is a small
//! message struct with a `Display` implementation and a [`StructuredLog`]
//! implementation that attaches the same data as `tracing` fields. Call sites
//! build a message and call `.log()`; no format strings are scattered through
//! the engine.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::engine` - flow run lifecycle and transitions
//! * `messages::node` - phase failures, retries and fallbacks
//! * `messages::batch` - batch fan-out and per-item failures
//! * `messages::validation` - graph and configuration validation
//! * `messages::service` - completion and search service calls
//! * `messages::session` - interactive host lifecycle
//!
//! # Usage
//!
//! ```rust
//! use nodeflow::observability::messages::node::RetriesExhausted;
//! use nodeflow::observability::messages::StructuredLog;
//!
//! let error = std::io::Error::new(std::io::ErrorKind::Other, "upstream unavailable");
//! RetriesExhausted {
//!     node_id: "answer",
//!     attempts: 3,
//!     error: &error,
//! }
//! .log();
//! ```
//!
//! [`StructuredLog`]: messages::StructuredLog

pub mod messages;
