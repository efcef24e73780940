// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Scripted collaborators for tests.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::config::ModelConfig;
use crate::engine::RunContext;
use crate::errors::ServiceError;
use crate::traits::{CompletionRequest, RecordSink, TextCompleter, WebSearcher};

/// Replays scripted replies in order, then echoes the prompt. Records every
/// request it receives.
#[derive(Default)]
pub struct ScriptedCompleter {
    replies: Mutex<VecDeque<Result<String, u16>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompleter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: &str) -> Self {
        self.push(Ok(text.to_string()))
    }

    /// Fail the next call with an HTTP status error.
    pub fn fail(self, status: u16) -> Self {
        self.push(Err(status))
    }

    fn push(self, reply: Result<String, u16>) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextCompleter for ScriptedCompleter {
    async fn complete(
        &self,
        _ctx: &RunContext,
        request: &CompletionRequest,
        _model: &ModelConfig,
    ) -> Result<String, ServiceError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(status)) => Err(ServiceError::Status {
                service: "stub",
                status,
                body: "scripted failure".to_string(),
            }),
            None => Ok(format!("echo: {}", request.prompt)),
        }
    }
}

/// Returns a fixed result and records queries.
pub struct ScriptedSearcher {
    result: String,
    queries: Mutex<Vec<String>>,
}

impl ScriptedSearcher {
    pub fn new(result: &str) -> Self {
        Self {
            result: result.to_string(),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebSearcher for ScriptedSearcher {
    async fn search(&self, _ctx: &RunContext, query: &str) -> Result<String, ServiceError> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.result.clone())
    }
}

/// Keeps persisted records in memory.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<(String, serde_json::Value)>>,
}

impl MemorySink {
    pub fn records(&self) -> Vec<(String, serde_json::Value)> {
        self.records.lock().unwrap().clone()
    }
}

impl RecordSink for MemorySink {
    fn persist(&self, record: &serde_json::Value, hint: &str) -> Result<PathBuf, ServiceError> {
        self.records
            .lock()
            .unwrap()
            .push((hint.to_string(), record.clone()));
        Ok(PathBuf::from(format!("memory/{}.json", hint)))
    }
}
