// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::Arc;

use crate::engine::flow::Flow;
use crate::engine::lifecycle::NodeRunner;
use crate::engine::validation::{find_unreachable_nodes, validate_flow_graph, EdgeSpec, NodeSpec};
use crate::engine::Action;
use crate::errors::InvalidGraph;
use crate::observability::messages::validation::{GraphValidationFailed, UnreachableNodes};
use crate::observability::messages::StructuredLog;
use crate::traits::{Node, Runnable};

/// Assembles and validates a [`Flow`].
///
/// Registration order does not matter; everything is checked together in
/// [`build`](FlowBuilder::build).
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use nodeflow::engine::{Action, FlowBuilder, RunContext};
/// use nodeflow::errors::BoxError;
/// use nodeflow::store::SharedStore;
/// use nodeflow::traits::Node;
///
/// struct Noop;
///
/// #[async_trait]
/// impl Node for Noop {
///     type Prep = ();
///     type Exec = ();
///     async fn prep(&self, _: &RunContext, _: &SharedStore) -> Result<(), BoxError> { Ok(()) }
///     async fn exec(&self, _: &RunContext, _: &()) -> Result<(), BoxError> { Ok(()) }
/// }
///
/// let flow = FlowBuilder::new("pipeline")
///     .node("first", Noop)
///     .node("second", Noop)
///     .then("first", "second")
///     .start("first")
///     .build()
///     .unwrap();
///
/// assert_eq!(flow.successor("first", &Action::Default), Some("second"));
/// ```
pub struct FlowBuilder {
    name: String,
    nodes: Vec<(String, Arc<dyn Runnable>)>,
    edges: Vec<EdgeSpec>,
    start: Option<String>,
    max_steps: Option<usize>,
}

impl FlowBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
            start: None,
            max_steps: None,
        }
    }

    /// Register a node under `id`.
    pub fn node<N: Node>(self, id: impl Into<String>, node: N) -> Self {
        self.runnable(id, Arc::new(NodeRunner::new(node)))
    }

    /// Register a built flow as a single node of this one.
    pub fn subflow(self, id: impl Into<String>, flow: Flow) -> Self {
        self.runnable(id, Arc::new(flow))
    }

    /// Register any [`Runnable`], e.g. a flow shared with other parents.
    pub fn runnable(mut self, id: impl Into<String>, runnable: Arc<dyn Runnable>) -> Self {
        self.nodes.push((id.into(), runnable));
        self
    }

    /// Wire `from --action--> to`.
    pub fn edge(
        mut self,
        from: impl Into<String>,
        action: impl Into<Action>,
        to: impl Into<String>,
    ) -> Self {
        self.edges.push(EdgeSpec {
            from: from.into(),
            action: action.into(),
            to: to.into(),
        });
        self
    }

    /// Wire the default action.
    pub fn then(self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.edge(from, Action::Default, to)
    }

    pub fn start(mut self, id: impl Into<String>) -> Self {
        self.start = Some(id.into());
        self
    }

    /// Cap node visits per run.
    pub fn max_steps(mut self, limit: usize) -> Self {
        self.max_steps = Some(limit);
        self
    }

    /// Validate the graph and freeze it.
    pub fn build(self) -> Result<Flow, InvalidGraph> {
        let specs: Vec<NodeSpec> = self
            .nodes
            .iter()
            .map(|(id, runnable)| NodeSpec {
                id: id.clone(),
                declared_actions: runnable.declared_actions(),
            })
            .collect();

        if let Err(errors) = validate_flow_graph(&specs, &self.edges, self.start.as_deref()) {
            GraphValidationFailed {
                flow: &self.name,
                errors: &errors,
            }
            .log();
            return Err(InvalidGraph {
                flow: self.name,
                errors,
            });
        }

        // Validation guarantees a registered start node.
        let start = self.start.unwrap_or_default();

        let unreachable = find_unreachable_nodes(&specs, &self.edges, &start);
        if !unreachable.is_empty() {
            UnreachableNodes {
                flow: &self.name,
                nodes: &unreachable,
            }
            .log();
        }

        let nodes: HashMap<String, Arc<dyn Runnable>> = self.nodes.into_iter().collect();
        let mut edges: HashMap<String, HashMap<Action, String>> = HashMap::new();
        for edge in self.edges {
            edges.entry(edge.from).or_default().insert(edge.action, edge.to);
        }

        Ok(Flow::from_parts(self.name, start, nodes, edges, self.max_steps))
    }
}
