// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

use crate::engine::Action;

/// Errors that can occur while validating a flow graph at construction time
#[derive(Debug, Clone, PartialEq)]
pub enum GraphError {
    /// Two nodes were registered under the same identity
    DuplicateNode {
        /// The duplicate node ID
        node_id: String,
    },
    /// No start node was configured
    MissingStart,
    /// The start node was never registered
    UnknownStart {
        /// The start node ID that couldn't be resolved
        node_id: String,
    },
    /// An edge leaves a node that was never registered
    UnknownSource {
        /// The unresolved source node
        node_id: String,
        /// The action the edge was wired on
        action: Action,
    },
    /// An edge points at a node that was never registered
    UnknownDestination {
        /// The node the edge leaves
        from: String,
        /// The action the edge was wired on
        action: Action,
        /// The destination that couldn't be resolved
        to: String,
    },
    /// The same (node, action) pair was wired twice
    DuplicateEdge {
        node_id: String,
        action: Action,
    },
    /// An edge is wired on an action the source node never returns
    UndeclaredAction {
        node_id: String,
        action: Action,
        /// What the node does declare
        declared: Vec<Action>,
    },
    /// An edge is wired on the explicit terminal action
    TerminalActionWired {
        node_id: String,
    },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::DuplicateNode { node_id } => {
                write!(f, "Duplicate node ID: '{}'", node_id)
            }
            GraphError::MissingStart => write!(f, "No start node configured"),
            GraphError::UnknownStart { node_id } => {
                write!(f, "Start node '{}' does not exist", node_id)
            }
            GraphError::UnknownSource { node_id, action } => {
                write!(
                    f,
                    "Edge on action '{}' leaves node '{}' which does not exist",
                    action, node_id
                )
            }
            GraphError::UnknownDestination { from, action, to } => {
                write!(
                    f,
                    "Node '{}' routes action '{}' to '{}' which does not exist",
                    from, action, to
                )
            }
            GraphError::DuplicateEdge { node_id, action } => {
                write!(
                    f,
                    "Node '{}' has more than one edge for action '{}'",
                    node_id, action
                )
            }
            GraphError::UndeclaredAction {
                node_id,
                action,
                declared,
            } => {
                let declared: Vec<String> = declared.iter().map(|a| a.to_string()).collect();
                write!(
                    f,
                    "Node '{}' has an edge for action '{}' but only declares [{}]",
                    node_id,
                    action,
                    declared.join(", ")
                )
            }
            GraphError::TerminalActionWired { node_id } => {
                write!(
                    f,
                    "Node '{}' wires an edge on the terminal action '{}'",
                    node_id,
                    Action::Done
                )
            }
        }
    }
}

impl std::error::Error for GraphError {}

/// All validation failures found while building one flow.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidGraph {
    pub flow: String,
    pub errors: Vec<GraphError>,
}

impl fmt::Display for InvalidGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Flow '{}' failed validation:", self.flow)?;
        for error in &self.errors {
            write!(f, "\n  - {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for InvalidGraph {}
