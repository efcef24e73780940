// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for flow run lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Flow run start, completion and failure
//! * Node visits and the transitions taken between them

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// A flow run is starting.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use nodeflow::observability::messages::engine::FlowRunStarted;
///
/// let msg = FlowRunStarted {
///     flow: "agent",
///     start_node: "analyze",
///     node_count: 4,
/// };
///
/// assert_eq!(msg.to_string(), "Starting flow 'agent' at node 'analyze' (4 nodes)");
/// ```
pub struct FlowRunStarted<'a> {
    pub flow: &'a str,
    pub start_node: &'a str,
    pub node_count: usize,
}

impl Display for FlowRunStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting flow '{}' at node '{}' ({} nodes)",
            self.flow, self.start_node, self.node_count
        )
    }
}

impl StructuredLog for FlowRunStarted<'_> {
    fn log(&self) {
        tracing::info!(
            flow = self.flow,
            start_node = self.start_node,
            node_count = self.node_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "flow_run",
            span_name = name,
            flow = self.flow,
            start_node = self.start_node,
            node_count = self.node_count,
        )
    }
}

/// A flow run reached a terminal transition.
///
/// # Log Level
/// `info!` - Important operational event
pub struct FlowRunCompleted<'a> {
    pub flow: &'a str,
    pub steps: usize,
    pub terminal_node: &'a str,
    pub terminal_action: &'a str,
    pub duration: Duration,
}

impl Display for FlowRunCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Flow '{}' completed after {} steps at node '{}' with action '{}' in {:?}",
            self.flow, self.steps, self.terminal_node, self.terminal_action, self.duration
        )
    }
}

impl StructuredLog for FlowRunCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            flow = self.flow,
            steps = self.steps,
            terminal_node = self.terminal_node,
            terminal_action = self.terminal_action,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "flow_run_completed",
            span_name = name,
            flow = self.flow,
            steps = self.steps,
            duration = ?self.duration,
        )
    }
}

/// A flow run failed or was interrupted.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use nodeflow::observability::messages::engine::FlowRunFailed;
///
/// let error = std::io::Error::new(std::io::ErrorKind::Other, "test error");
/// let msg = FlowRunFailed {
///     flow: "qa",
///     steps: 1,
///     error: &error,
/// };
///
/// assert_eq!(msg.to_string(), "Flow 'qa' failed after 1 steps: test error");
/// ```
pub struct FlowRunFailed<'a> {
    pub flow: &'a str,
    pub steps: usize,
    pub error: &'a dyn std::error::Error,
}

impl Display for FlowRunFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Flow '{}' failed after {} steps: {}",
            self.flow, self.steps, self.error
        )
    }
}

impl StructuredLog for FlowRunFailed<'_> {
    fn log(&self) {
        tracing::error!(
            flow = self.flow,
            steps = self.steps,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "flow_run_failed",
            span_name = name,
            flow = self.flow,
            error = %self.error,
        )
    }
}

/// A node is about to be visited.
///
/// # Log Level
/// `debug!` - Per-step detail
pub struct NodeVisitStarted<'a> {
    pub flow: &'a str,
    pub node_id: &'a str,
    pub node_name: &'a str,
    pub step: usize,
}

impl Display for NodeVisitStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Flow '{}' step {}: visiting node '{}' ({})",
            self.flow, self.step, self.node_id, self.node_name
        )
    }
}

impl StructuredLog for NodeVisitStarted<'_> {
    fn log(&self) {
        tracing::debug!(
            flow = self.flow,
            node_id = self.node_id,
            node_name = self.node_name,
            step = self.step,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "node_visit",
            span_name = name,
            flow = self.flow,
            node_id = self.node_id,
            step = self.step,
        )
    }
}

/// The engine followed an edge.
///
/// # Log Level
/// `debug!` - Per-step detail
pub struct TransitionTaken<'a> {
    pub flow: &'a str,
    pub from: &'a str,
    pub action: &'a str,
    pub to: &'a str,
}

impl Display for TransitionTaken<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Flow '{}': '{}' --{}--> '{}'",
            self.flow, self.from, self.action, self.to
        )
    }
}

impl StructuredLog for TransitionTaken<'_> {
    fn log(&self) {
        tracing::debug!(
            flow = self.flow,
            from = self.from,
            action = self.action,
            to = self.to,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "transition",
            span_name = name,
            flow = self.flow,
            from = self.from,
            action = self.action,
            to = self.to,
        )
    }
}
