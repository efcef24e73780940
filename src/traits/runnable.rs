// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::engine::{Action, RunContext};
use crate::errors::FlowError;
use crate::store::SharedStore;

/// Object-safe view of anything a flow can visit.
///
/// [`Node`](crate::traits::Node) has associated types and cannot be stored as a
/// trait object, so the flow builder wraps each node in an adapter that runs the
/// full lifecycle and only hands back the routing [`Action`]. A
/// [`Flow`](crate::engine::Flow) is also `Runnable`, which is what allows a
/// sub-flow to be wired in as a single step of a larger flow.
#[async_trait]
pub trait Runnable: Send + Sync {
    fn name(&self) -> &str;

    /// See [`Node::declared_actions`](crate::traits::Node::declared_actions).
    fn declared_actions(&self) -> Vec<Action>;

    /// Execute one visit and return the action to route on.
    async fn run(
        &self,
        node_id: &str,
        ctx: &RunContext,
        store: &SharedStore,
    ) -> Result<Action, FlowError>;
}
