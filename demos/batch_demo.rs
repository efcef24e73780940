// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Runs a small word-count batch with a concurrency cap and partial results.
//!
//! `cargo run --example batch_demo`

use std::time::Duration;

use async_trait::async_trait;
use nodeflow::app::nodes::{AggregateResultsNode, LoadItemsNode};
use nodeflow::app::keys;
use nodeflow::engine::{BatchFailurePolicy, BatchNode, FlowBuilder, RunContext};
use nodeflow::errors::BoxError;
use nodeflow::store::SharedStore;
use nodeflow::traits::BatchProcessor;
use tracing_subscriber::EnvFilter;

/// Counts words, sleeping longer for shorter lines so completions arrive out of
/// order. Empty lines are rejected.
struct CountWords;

#[async_trait]
impl BatchProcessor for CountWords {
    type Item = String;
    type Output = String;

    fn name(&self) -> &str {
        "CountWords"
    }

    async fn process_item(&self, _ctx: &RunContext, line: String) -> Result<String, BoxError> {
        let words = line.split_whitespace().count();
        if words == 0 {
            return Err("empty line".into());
        }
        tokio::time::sleep(Duration::from_millis(200 / words as u64)).await;
        Ok(format!("{} words: {}", words, line))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let lines = vec![
        "the quick brown fox".to_string(),
        "jumps".to_string(),
        String::new(),
        "over the lazy dog".to_string(),
    ];

    let flow = FlowBuilder::new("word_count")
        .node("load", LoadItemsNode::new(lines))
        .node(
            "count",
            BatchNode::new(CountWords)
                .concurrent(Some(2))
                .with_failure_policy(BatchFailurePolicy::KeepPartial),
        )
        .node("aggregate", AggregateResultsNode)
        .then("load", "count")
        .then("count", "aggregate")
        .start("load")
        .build()?;

    let store = SharedStore::new();
    let report = flow.run(&RunContext::new(), &store).await?;

    println!("{}", store.require::<String>(keys::FINAL_RESULTS)?);
    println!("Visited {:?} in {:?}", report.visited, report.duration);
    Ok(())
}
