// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The flow state machine.
//!
//! A [`Flow`] owns a set of nodes keyed by identity and a transition table
//! `(node, action) -> node`. A run starts at the start node, visits one node at
//! a time, and ends when the current node's action has no outgoing edge. Graphs
//! may contain cycles; the engine imposes no visit limit unless one was set with
//! [`FlowBuilder::max_steps`](crate::engine::FlowBuilder::max_steps).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::Instrument;

use crate::engine::builder::FlowBuilder;
use crate::engine::{Action, RunContext};
use crate::errors::FlowError;
use crate::observability::messages::engine::{
    FlowRunCompleted, FlowRunFailed, FlowRunStarted, NodeVisitStarted, TransitionTaken,
};
use crate::observability::messages::StructuredLog;
use crate::store::SharedStore;
use crate::traits::Runnable;

/// What one successful run did.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub flow: String,
    /// Node identities in visit order, repeats included.
    pub visited: Vec<String>,
    pub terminal_node: String,
    pub terminal_action: Action,
    pub duration: Duration,
}

impl RunReport {
    pub fn steps(&self) -> usize {
        self.visited.len()
    }
}

/// A validated, immutable graph of nodes.
///
/// Built through [`FlowBuilder`]; cheap to share behind an `Arc` and safe to
/// run concurrently against different stores.
pub struct Flow {
    name: String,
    start: String,
    nodes: HashMap<String, Arc<dyn Runnable>>,
    edges: HashMap<String, HashMap<Action, String>>,
    max_steps: Option<usize>,
}

impl Flow {
    pub fn builder(name: impl Into<String>) -> FlowBuilder {
        FlowBuilder::new(name)
    }

    pub(crate) fn from_parts(
        name: String,
        start: String,
        nodes: HashMap<String, Arc<dyn Runnable>>,
        edges: HashMap<String, HashMap<Action, String>>,
        max_steps: Option<usize>,
    ) -> Self {
        Self {
            name,
            start,
            nodes,
            edges,
            max_steps,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_node(&self) -> &str {
        &self.start
    }

    /// Registered node identities, sorted.
    pub fn node_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.nodes.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// The node an action leads to, if that edge is wired.
    pub fn successor(&self, node_id: &str, action: &Action) -> Option<&str> {
        self.edges
            .get(node_id)
            .and_then(|outgoing| outgoing.get(action))
            .map(String::as_str)
    }

    /// Execute the flow against `store` until a terminal transition.
    ///
    /// The first node failure aborts the run; there is no automatic restart.
    pub async fn run(&self, ctx: &RunContext, store: &SharedStore) -> Result<RunReport, FlowError> {
        let started = FlowRunStarted {
            flow: &self.name,
            start_node: &self.start,
            node_count: self.nodes.len(),
        };
        let span = started.span(&self.name);

        async {
            started.log();
            let clock = Instant::now();
            let mut visited = Vec::new();

            match self.traverse(ctx, store, &mut visited).await {
                Ok((terminal_node, terminal_action)) => {
                    let report = RunReport {
                        flow: self.name.clone(),
                        visited,
                        terminal_node,
                        terminal_action,
                        duration: clock.elapsed(),
                    };
                    FlowRunCompleted {
                        flow: &self.name,
                        steps: report.steps(),
                        terminal_node: &report.terminal_node,
                        terminal_action: report.terminal_action.as_str(),
                        duration: report.duration,
                    }
                    .log();
                    Ok(report)
                }
                Err(error) => {
                    FlowRunFailed {
                        flow: &self.name,
                        steps: visited.len(),
                        error: &error,
                    }
                    .log();
                    Err(error)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn traverse(
        &self,
        ctx: &RunContext,
        store: &SharedStore,
        visited: &mut Vec<String>,
    ) -> Result<(String, Action), FlowError> {
        let mut current = self.start.clone();

        loop {
            if let Some(limit) = self.max_steps {
                if visited.len() >= limit {
                    return Err(FlowError::StepLimitExceeded {
                        flow: self.name.clone(),
                        limit,
                    });
                }
            }

            let node = self
                .nodes
                .get(&current)
                .ok_or_else(|| FlowError::UnknownNode {
                    flow: self.name.clone(),
                    node: current.clone(),
                })?;

            visited.push(current.clone());
            NodeVisitStarted {
                flow: &self.name,
                node_id: &current,
                node_name: node.name(),
                step: visited.len(),
            }
            .log();

            let action = node.run(&current, ctx, store).await?;

            let declared = node.declared_actions();
            if !action.is_done() && !declared.is_empty() && !declared.contains(&action) {
                return Err(FlowError::UndeclaredAction {
                    node: current,
                    action,
                });
            }

            match self.successor(&current, &action) {
                Some(next) => {
                    TransitionTaken {
                        flow: &self.name,
                        from: &current,
                        action: action.as_str(),
                        to: next,
                    }
                    .log();
                    current = next.to_string();
                }
                None => return Ok((current, action)),
            }
        }
    }
}

impl fmt::Debug for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flow")
            .field("name", &self.name)
            .field("start", &self.start)
            .field("nodes", &self.node_ids())
            .field("max_steps", &self.max_steps)
            .finish()
    }
}

/// A flow nested as a node of another flow. Its terminal action becomes the
/// parent's routing action.
#[async_trait]
impl Runnable for Flow {
    fn name(&self) -> &str {
        &self.name
    }

    // A sub-flow can end on any action its nodes return.
    fn declared_actions(&self) -> Vec<Action> {
        Vec::new()
    }

    async fn run(
        &self,
        _node_id: &str,
        ctx: &RunContext,
        store: &SharedStore,
    ) -> Result<Action, FlowError> {
        Flow::run(self, ctx, store)
            .await
            .map(|report| report.terminal_action)
    }
}
