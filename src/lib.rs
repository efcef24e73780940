// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod app;        // application nodes, flows and history
pub mod backends;   // completion, search and persistence implementations
pub mod config;     // YAML config + validation
pub mod engine;     // flow graph runtime
pub mod errors;     // error handling
pub mod observability;
pub mod session;    // interactive conversation host
pub mod store;      // shared key/value store
pub mod traits;     // unified abstractions
