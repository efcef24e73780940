// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Implementations of the collaborator traits in [`crate::traits::services`].
//!
//! # Available Backends
//!
//! - **Gemini**: text completion over the `generateContent` REST endpoint, with
//!   inline image attachments and optional search grounding
//! - **Tavily**: web search, formatted into a prompt-ready text block
//! - **JSON file sink**: timestamped pretty-JSON records on local disk
//! - **Stub (test-only)**: scripted completer, searcher and in-memory sink
//!
//! Credentials are read from the environment by the `from_env` constructors;
//! nothing here touches global state.

pub mod file_sink;
pub mod gemini;
#[cfg(test)]
pub mod stub;
pub mod tavily;

pub use file_sink::JsonFileSink;
pub use gemini::GeminiClient;
pub use tavily::TavilySearch;
