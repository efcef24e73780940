// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The question-answering application built on the engine: conversation
//! history, the nodes that read and write it, and the three prebuilt flows.

pub mod flows;
pub mod history;
pub mod nodes;

pub use flows::{agent_flow, batch_flow, qa_flow, Mode};
pub use history::{Conversation, History};

/// Store keys shared by the application nodes and the session host.
pub mod keys {
    pub const QUESTION: &str = "question";
    pub const ANSWER: &str = "answer";
    pub const CONTEXT: &str = "context";
    pub const HISTORY: &str = "history";
    pub const IMAGE_PATHS: &str = "image_paths";
    pub const SEARCH_RESULTS: &str = "search_results";
    pub const CONVERSATION_NAME: &str = "conversation_name";
    pub const FINAL_RESULTS: &str = "final_results";
}
