// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Seams to the outside world used by the application nodes.
//!
//! Nodes receive these as `Arc<dyn ...>` at construction so tests can swap in
//! scripted doubles and the binary can wire real HTTP clients.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::config::ModelConfig;
use crate::engine::RunContext;
use crate::errors::ServiceError;

/// One prompt for a text completion service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompletionRequest {
    pub prompt: String,
    /// Local image files sent inline with the prompt.
    pub images: Vec<PathBuf>,
    /// Let the service ground its answer with its own web search.
    pub use_search_grounding: bool,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    pub fn with_images(mut self, images: Vec<PathBuf>) -> Self {
        self.images = images;
        self
    }

    pub fn with_search_grounding(mut self, enabled: bool) -> Self {
        self.use_search_grounding = enabled;
        self
    }
}

/// Prompt in, text out.
#[async_trait]
pub trait TextCompleter: Send + Sync {
    async fn complete(
        &self,
        ctx: &RunContext,
        request: &CompletionRequest,
        model: &ModelConfig,
    ) -> Result<String, ServiceError>;
}

/// Query in, formatted result text out.
#[async_trait]
pub trait WebSearcher: Send + Sync {
    async fn search(&self, ctx: &RunContext, query: &str) -> Result<String, ServiceError>;
}

/// Durable storage for a JSON record. `hint` names the record, e.g. the
/// conversation name; the returned path says where it landed.
pub trait RecordSink: Send + Sync {
    fn persist(&self, record: &serde_json::Value, hint: &str) -> Result<PathBuf, ServiceError>;
}
