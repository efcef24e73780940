// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised by the external collaborators (completion, search, persistence).

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// A required credential is not present in the environment.
    #[error("{var} environment variable not set")]
    MissingCredential { var: &'static str },

    /// Transport-level HTTP failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("{service} request failed with status {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// The service answered but with nothing usable in it.
    #[error("No response content from {service}")]
    EmptyResponse { service: &'static str },

    /// The call did not finish within its own timeout.
    #[error("{service} call timed out after {after:?}")]
    Timeout {
        service: &'static str,
        after: Duration,
    },

    /// An attachment has an extension the completion service cannot accept.
    #[error("Unsupported image type '{extension}' for '{path}'")]
    UnsupportedImage { path: String, extension: String },

    /// Local file I/O failed (image attachments, record persistence).
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
