// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors raised by the typed accessors of the shared store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The key was never set (or was removed).
    #[error("Key '{key}' not found in shared store")]
    MissingKey { key: String },

    /// The key holds a value of a different type than the caller asked for.
    #[error("Key '{key}' does not hold a value of type {expected}")]
    TypeMismatch { key: String, expected: &'static str },
}
