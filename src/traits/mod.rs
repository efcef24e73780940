// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod batch;
pub mod node;
pub mod runnable;
pub mod services;

pub use batch::BatchProcessor;
pub use node::Node;
pub use runnable::Runnable;
pub use services::{CompletionRequest, RecordSink, TextCompleter, WebSearcher};
