// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors that can occur while loading application configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML for the expected shape
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// One or more values are out of range
    #[error("Configuration validation failed:\n{}", .0.join("\n"))]
    Invalid(Vec<String>),
}
