// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::BoxError;
use thiserror::Error;

/// A single batch element failed.
///
/// Reported as the source of the batch node's exec failure. In concurrent mode
/// this is always the failure with the lowest input index.
#[derive(Debug, Error)]
#[error("Batch item {index} failed: {source}")]
pub struct BatchItemError {
    pub index: usize,
    #[source]
    pub source: BoxError,
}
