// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The three flows the binary can run.

use std::fmt;
use std::sync::Arc;

use clap::ValueEnum;

use crate::app::nodes::{
    AggregateResultsNode, AnalyzeNode, AnswerNode, LabelItems, LoadItemsNode, ProcessNode,
    SearchNode, ANALYZE_ACTION, PROCESS_ACTION, SEARCH_ACTION,
};
use crate::config::AppConfig;
use crate::engine::{BatchNode, Flow, FlowBuilder};
use crate::errors::InvalidGraph;
use crate::traits::{TextCompleter, WebSearcher};

/// Visit cap for the agent loop. A healthy run takes five visits.
pub const AGENT_MAX_STEPS: usize = 16;

/// Which flow a session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Mode {
    /// Answer each question directly.
    #[default]
    Qa,
    /// Search the web before answering.
    Agent,
    /// Run the demo batch once and exit.
    Batch,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Qa => "qa",
            Mode::Agent => "agent",
            Mode::Batch => "batch",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn answer_node(completer: Arc<dyn TextCompleter>, config: &AppConfig) -> AnswerNode {
    AnswerNode::new(completer, config.model.clone())
        .with_system_context(config.session.system_context.clone())
        .with_retry_policy(config.retry.to_policy())
}

/// `answer`
pub fn qa_flow(completer: Arc<dyn TextCompleter>, config: &AppConfig) -> Result<Flow, InvalidGraph> {
    FlowBuilder::new("qa")
        .node("answer", answer_node(completer, config))
        .start("answer")
        .build()
}

/// `analyze ⇄ search`, then `analyze → process → answer`.
pub fn agent_flow(
    completer: Arc<dyn TextCompleter>,
    searcher: Arc<dyn WebSearcher>,
    config: &AppConfig,
) -> Result<Flow, InvalidGraph> {
    FlowBuilder::new("agent")
        .node("analyze", AnalyzeNode)
        .node(
            "search",
            SearchNode::new(searcher).with_retry_policy(config.retry.to_policy()),
        )
        .node("process", ProcessNode)
        .node("answer", answer_node(completer, config))
        .edge("analyze", SEARCH_ACTION, "search")
        .edge("search", ANALYZE_ACTION, "analyze")
        .edge("analyze", PROCESS_ACTION, "process")
        .then("process", "answer")
        .start("analyze")
        .max_steps(AGENT_MAX_STEPS)
        .build()
}

/// `load → batch → aggregate`
pub fn batch_flow(config: &AppConfig) -> Result<Flow, InvalidGraph> {
    let batch = BatchNode::new(LabelItems)
        .with_mode(config.batch.mode())
        .with_failure_policy(config.batch.failure_policy)
        .with_retry_policy(config.retry.to_policy());

    FlowBuilder::new("batch")
        .node("load", LoadItemsNode::default())
        .node("batch", batch)
        .node("aggregate", AggregateResultsNode)
        .then("load", "batch")
        .then("batch", "aggregate")
        .start("load")
        .build()
}
