// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::errors::{FlowError, ServiceError, StoreError};

/// Errors raised by a conversation turn or while persisting its history.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error("Failed to read session state: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to persist conversation history: {0}")]
    Persist(#[from] ServiceError),

    #[error("Failed to serialize conversation history: {0}")]
    Serialization(#[from] serde_json::Error),
}
