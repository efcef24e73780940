// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The workflow engine: node lifecycle, retries, batching and flow traversal.

pub mod action;
pub mod batch;
mod builder;
pub mod context;
mod flow;
mod lifecycle;
pub mod retry;
pub mod validation;

#[cfg(test)]
mod integration_tests;

pub use action::{Action, DEFAULT_ACTION, DONE_ACTION};
pub use batch::{BatchFailurePolicy, BatchItemFailure, BatchMode, BatchNode, BatchOutcome};
pub use builder::FlowBuilder;
pub use context::{Interrupted, RunContext};
pub use flow::{Flow, RunReport};
pub use lifecycle::run_node;
pub use retry::{RetryDelay, RetryPolicy};
