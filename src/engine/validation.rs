// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Construction-time validation of flow graphs.
//!
//! A flow is validated once, when [`FlowBuilder::build`](crate::engine::FlowBuilder::build)
//! is called, so wiring mistakes surface at startup instead of in the middle of
//! a run. Validation accumulates every error it finds so all issues can be fixed
//! in one pass.
//!
//! # Validation Pipeline
//!
//! 1. **Uniqueness**: every node identity is registered once
//! 2. **Start**: a start node is configured and registered
//! 3. **References**: every edge leaves and enters a registered node
//! 4. **Actions**: every `(node, action)` pair is wired at most once, never on the
//!    terminal action, and only on actions the source node declares
//!
//! Cycles are legal (a search/analyze loop is the canonical example), so unlike
//! a DAG there is no acyclicity check. Nodes unreachable from the start node are
//! reported separately by [`find_unreachable_nodes`] as a warning.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::engine::Action;
use crate::errors::GraphError;

/// One wired transition: `from --action--> to`.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeSpec {
    pub from: String,
    pub action: Action,
    pub to: String,
}

/// A registered node as seen by validation: its identity and declared actions.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpec {
    pub id: String,
    pub declared_actions: Vec<Action>,
}

/// Validates a flow graph for structural integrity.
///
/// # Returns
/// * `Ok(())` - The graph can be executed
/// * `Err(Vec<GraphError>)` - Every problem found
///
/// Action checks are skipped for edges whose source is unknown, since there is no
/// declaration to check them against.
pub fn validate_flow_graph(
    nodes: &[NodeSpec],
    edges: &[EdgeSpec],
    start: Option<&str>,
) -> Result<(), Vec<GraphError>> {
    let mut errors = Vec::new();

    if let Err(duplicate_errors) = validate_unique_node_ids(nodes) {
        errors.extend(duplicate_errors);
    }

    if let Err(start_error) = validate_start(nodes, start) {
        errors.push(start_error);
    }

    if let Err(reference_errors) = validate_edge_references(nodes, edges) {
        errors.extend(reference_errors);
    }

    if let Err(action_errors) = validate_edge_actions(nodes, edges) {
        errors.extend(action_errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_unique_node_ids(nodes: &[NodeSpec]) -> Result<(), Vec<GraphError>> {
    let mut seen_ids = HashSet::new();
    let mut errors = Vec::new();

    for node in nodes {
        if !seen_ids.insert(node.id.as_str()) {
            errors.push(GraphError::DuplicateNode {
                node_id: node.id.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_start(nodes: &[NodeSpec], start: Option<&str>) -> Result<(), GraphError> {
    match start {
        None => Err(GraphError::MissingStart),
        Some(start) if !nodes.iter().any(|node| node.id == start) => {
            Err(GraphError::UnknownStart {
                node_id: start.to_string(),
            })
        }
        Some(_) => Ok(()),
    }
}

/// Ensures every edge endpoint names a registered node.
///
/// Typical causes: a typo in an edge (`"serach"`), or a node removed from the
/// builder while its edges were left behind.
fn validate_edge_references(nodes: &[NodeSpec], edges: &[EdgeSpec]) -> Result<(), Vec<GraphError>> {
    let node_ids: HashSet<&str> = nodes.iter().map(|node| node.id.as_str()).collect();
    let mut errors = Vec::new();

    for edge in edges {
        if !node_ids.contains(edge.from.as_str()) {
            errors.push(GraphError::UnknownSource {
                node_id: edge.from.clone(),
                action: edge.action.clone(),
            });
        }
        if !node_ids.contains(edge.to.as_str()) {
            errors.push(GraphError::UnknownDestination {
                from: edge.from.clone(),
                action: edge.action.clone(),
                to: edge.to.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Checks each edge's action against the source node's declaration.
///
/// This is what separates an intentional terminal (a declared action left
/// unwired) from a mistyped one: an edge wired on an action the node never
/// returns would otherwise sit silently unused.
fn validate_edge_actions(nodes: &[NodeSpec], edges: &[EdgeSpec]) -> Result<(), Vec<GraphError>> {
    // First registration wins; duplicates are reported by the uniqueness check.
    let mut declarations: HashMap<&str, &[Action]> = HashMap::new();
    for node in nodes {
        declarations
            .entry(node.id.as_str())
            .or_insert(node.declared_actions.as_slice());
    }

    let mut wired = HashSet::new();
    let mut errors = Vec::new();

    for edge in edges {
        if edge.action.is_done() {
            errors.push(GraphError::TerminalActionWired {
                node_id: edge.from.clone(),
            });
            continue;
        }

        if !wired.insert((edge.from.as_str(), &edge.action)) {
            errors.push(GraphError::DuplicateEdge {
                node_id: edge.from.clone(),
                action: edge.action.clone(),
            });
        }

        if let Some(declared) = declarations.get(edge.from.as_str()) {
            if !declared.is_empty() && !declared.contains(&edge.action) {
                errors.push(GraphError::UndeclaredAction {
                    node_id: edge.from.clone(),
                    action: edge.action.clone(),
                    declared: declared.to_vec(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Nodes that no path from `start` reaches, sorted.
///
/// Breadth-first search over the edge table. Not an error: a node may be
/// registered for a later wiring change, but it is usually a mistake worth
/// a warning.
pub fn find_unreachable_nodes(nodes: &[NodeSpec], edges: &[EdgeSpec], start: &str) -> Vec<String> {
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in edges {
        adjacency
            .entry(edge.from.as_str())
            .or_default()
            .push(edge.to.as_str());
    }

    let mut reached = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);
    while let Some(current) = queue.pop_front() {
        for next in adjacency.get(current).into_iter().flatten() {
            if reached.insert(next) {
                queue.push_back(next);
            }
        }
    }

    let mut unreachable: Vec<String> = nodes
        .iter()
        .filter(|node| !reached.contains(node.id.as_str()))
        .map(|node| node.id.clone())
        .collect();
    unreachable.sort();
    unreachable.dedup();
    unreachable
}
