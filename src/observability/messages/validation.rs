// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for graph and configuration validation.
//!
//! This module contains message types for logging events related to:
//! * Flow graph validation failures at build time
//! * Nodes registered but unreachable from the start node
//! * Configuration validation failures

use crate::errors::GraphError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A flow graph was rejected at build time.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct GraphValidationFailed<'a> {
    pub flow: &'a str,
    pub errors: &'a [GraphError],
}

impl Display for GraphValidationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let rendered: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        write!(
            f,
            "Flow '{}' failed validation with {} errors: {}",
            self.flow,
            self.errors.len(),
            rendered.join("; ")
        )
    }
}

impl StructuredLog for GraphValidationFailed<'_> {
    fn log(&self) {
        tracing::error!(
            flow = self.flow,
            error_count = self.errors.len(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "graph_validation_failed",
            name = name,
            flow = self.flow,
            error_count = self.errors.len(),
        )
    }
}

/// Nodes no path from the start node reaches.
///
/// # Log Level
/// `warn!` - Potential issue
///
/// # Example
/// ```
/// use nodeflow::observability::messages::validation::UnreachableNodes;
///
/// let nodes = vec!["orphan".to_string()];
/// let msg = UnreachableNodes {
///     flow: "agent",
///     nodes: &nodes,
/// };
///
/// assert_eq!(msg.to_string(), "Flow 'agent' has nodes unreachable from its start: orphan");
/// ```
pub struct UnreachableNodes<'a> {
    pub flow: &'a str,
    pub nodes: &'a [String],
}

impl Display for UnreachableNodes<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Flow '{}' has nodes unreachable from its start: {}",
            self.flow,
            self.nodes.join(", ")
        )
    }
}

impl StructuredLog for UnreachableNodes<'_> {
    fn log(&self) {
        tracing::warn!(
            flow = self.flow,
            nodes = self.nodes.join(", "),
            node_count = self.nodes.len(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::WARN,
            "unreachable_nodes",
            name = name,
            flow = self.flow,
            node_count = self.nodes.len(),
        )
    }
}

/// A configuration file failed validation.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ConfigValidationFailed<'a> {
    pub path: &'a str,
    pub problems: &'a [String],
}

impl Display for ConfigValidationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Configuration '{}' is invalid: {}",
            self.path,
            self.problems.join("; ")
        )
    }
}

impl StructuredLog for ConfigValidationFailed<'_> {
    fn log(&self) {
        tracing::error!(
            path = self.path,
            problem_count = self.problems.len(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "config_validation_failed",
            name = name,
            path = self.path,
        )
    }
}
