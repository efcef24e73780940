// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::engine::RunContext;
use crate::errors::BoxError;

/// Per-element work applied by a [`BatchNode`](crate::engine::BatchNode).
///
/// `process_item` may run on several tokio tasks at once, so implementations
/// hold only shareable configuration.
#[async_trait]
pub trait BatchProcessor: Send + Sync + 'static {
    type Item: Clone + Send + Sync + 'static;
    type Output: Clone + Send + Sync + 'static;

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn process_item(&self, ctx: &RunContext, item: Self::Item)
        -> Result<Self::Output, BoxError>;
}
