// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

use thiserror::Error;

use super::BoxError;
use crate::engine::Action;

/// The lifecycle phase a node was in when something went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Prep,
    Exec,
    Post,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Prep => "prep",
            Phase::Exec => "exec",
            Phase::Post => "post",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that abort a flow run.
///
/// Every variant tied to a node carries the node identity so a host can report
/// exactly where the run stopped.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Prep failed. Never retried.
    #[error("Node '{node}' failed during prep: {source}")]
    Prep {
        node: String,
        #[source]
        source: BoxError,
    },

    /// Exec failed on every attempt and the fallback did not recover.
    #[error("Node '{node}' failed during exec after {attempts} attempt(s): {source}")]
    Exec {
        node: String,
        attempts: u32,
        #[source]
        source: BoxError,
    },

    /// Post failed. Never retried.
    #[error("Node '{node}' failed during post: {source}")]
    Post {
        node: String,
        #[source]
        source: BoxError,
    },

    /// The run's cancellation token fired.
    #[error("Run cancelled while node '{node}' was in {phase}")]
    Cancelled { node: String, phase: Phase },

    /// The run's deadline passed.
    #[error("Run deadline exceeded while node '{node}' was in {phase}")]
    DeadlineExceeded { node: String, phase: Phase },

    /// Post returned an action the node never declared.
    #[error("Node '{node}' returned undeclared action '{action}'")]
    UndeclaredAction { node: String, action: Action },

    /// The flow's optional visit cap was hit.
    #[error("Flow '{flow}' exceeded its limit of {limit} node visits")]
    StepLimitExceeded { flow: String, limit: usize },

    /// An edge points at a node the flow does not hold.
    #[error("Flow '{flow}' has no node '{node}'")]
    UnknownNode { flow: String, node: String },
}

impl FlowError {
    /// The node the failure originated from, if any.
    pub fn node(&self) -> Option<&str> {
        match self {
            FlowError::Prep { node, .. }
            | FlowError::Exec { node, .. }
            | FlowError::Post { node, .. }
            | FlowError::Cancelled { node, .. }
            | FlowError::DeadlineExceeded { node, .. }
            | FlowError::UndeclaredAction { node, .. }
            | FlowError::UnknownNode { node, .. } => Some(node),
            FlowError::StepLimitExceeded { .. } => None,
        }
    }

    /// The phase the failure originated from, if any.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            FlowError::Prep { .. } => Some(Phase::Prep),
            FlowError::Exec { .. } => Some(Phase::Exec),
            FlowError::Post { .. } | FlowError::UndeclaredAction { .. } => Some(Phase::Post),
            FlowError::Cancelled { phase, .. } | FlowError::DeadlineExceeded { phase, .. } => {
                Some(*phase)
            }
            FlowError::StepLimitExceeded { .. } | FlowError::UnknownNode { .. } => None,
        }
    }

    /// True when the run stopped because of cancellation or a deadline rather
    /// than a node failure.
    pub fn is_interrupted(&self) -> bool {
        matches!(
            self,
            FlowError::Cancelled { .. } | FlowError::DeadlineExceeded { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exec_error_reports_node_phase_and_attempts() {
        let err = FlowError::Exec {
            node: "search".to_string(),
            attempts: 3,
            source: "connection reset".into(),
        };

        assert_eq!(err.node(), Some("search"));
        assert_eq!(err.phase(), Some(Phase::Exec));
        assert_eq!(
            err.to_string(),
            "Node 'search' failed during exec after 3 attempt(s): connection reset"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_cancelled_is_interrupted() {
        let err = FlowError::Cancelled {
            node: "answer".to_string(),
            phase: Phase::Exec,
        };
        assert!(err.is_interrupted());
        assert_eq!(err.phase(), Some(Phase::Exec));

        let err = FlowError::StepLimitExceeded {
            flow: "agent".to_string(),
            limit: 10,
        };
        assert!(!err.is_interrupted());
        assert_eq!(err.node(), None);
    }
}
