// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod batch;
mod config;
mod flow;
mod graph;
mod service;
mod session;
mod store;

pub use batch::BatchItemError;
pub use config::ConfigError;
pub use flow::{FlowError, Phase};
pub use graph::{GraphError, InvalidGraph};
pub use service::ServiceError;
pub use session::SessionError;
pub use store::StoreError;

/// Error type returned by node phases.
///
/// Phases may fail for any reason (missing store keys, HTTP failures, parse
/// errors), so they return a boxed error and the engine attaches the node
/// identity and phase when it wraps the failure in a [`FlowError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
