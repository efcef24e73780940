// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! A node that applies a [`BatchProcessor`] to every element of a collection.
//!
//! Prep reads `Vec<Item>` from the items key, exec processes the elements and
//! post writes the outputs, in input order, under the results key. Processing is
//! sequential or concurrent (one tokio task per element, optionally capped by a
//! semaphore). The node's retry policy applies to the batch as a whole.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::engine::{Action, RetryPolicy, RunContext};
use crate::errors::{BatchItemError, BoxError};
use crate::observability::messages::batch::{BatchCompleted, BatchItemFailed, BatchStarted};
use crate::observability::messages::StructuredLog;
use crate::store::SharedStore;
use crate::traits::{BatchProcessor, Node};

pub const DEFAULT_ITEMS_KEY: &str = "items";
pub const DEFAULT_RESULTS_KEY: &str = "results";

/// How the elements of a batch are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchMode {
    /// One element at a time, in order.
    #[default]
    Sequential,
    /// One task per element. `None` leaves concurrency unbounded.
    Concurrent { max_concurrency: Option<usize> },
}

impl BatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchMode::Sequential => "sequential",
            BatchMode::Concurrent { .. } => "concurrent",
        }
    }

    fn max_concurrency(&self) -> Option<usize> {
        match self {
            BatchMode::Sequential => Some(1),
            BatchMode::Concurrent { max_concurrency } => *max_concurrency,
        }
    }
}

/// What a batch does when some elements fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchFailurePolicy {
    /// Any element failure fails the batch with [`BatchItemError`].
    #[default]
    FailWhole,
    /// The batch succeeds. Results hold `Vec<Option<Output>>` with `None` at
    /// failed indices, and the failures are written under
    /// [`BatchNode::errors_key`].
    KeepPartial,
}

/// One failed element, as recorded under [`BatchFailurePolicy::KeepPartial`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItemFailure {
    pub index: usize,
    pub message: String,
}

/// The settled outcome of every element.
#[derive(Debug)]
pub struct BatchOutcome<O> {
    pub outputs: Vec<Option<O>>,
    pub failures: Vec<BatchItemFailure>,
}

pub struct BatchNode<P: BatchProcessor> {
    processor: Arc<P>,
    items_key: String,
    results_key: String,
    mode: BatchMode,
    failure_policy: BatchFailurePolicy,
    retry_policy: RetryPolicy,
}

impl<P: BatchProcessor> BatchNode<P> {
    pub fn new(processor: P) -> Self {
        Self {
            processor: Arc::new(processor),
            items_key: DEFAULT_ITEMS_KEY.to_string(),
            results_key: DEFAULT_RESULTS_KEY.to_string(),
            mode: BatchMode::default(),
            failure_policy: BatchFailurePolicy::default(),
            retry_policy: RetryPolicy::none(),
        }
    }

    pub fn with_items_key(mut self, key: impl Into<String>) -> Self {
        self.items_key = key.into();
        self
    }

    pub fn with_results_key(mut self, key: impl Into<String>) -> Self {
        self.results_key = key.into();
        self
    }

    pub fn with_mode(mut self, mode: BatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn concurrent(self, max_concurrency: Option<usize>) -> Self {
        self.with_mode(BatchMode::Concurrent { max_concurrency })
    }

    pub fn with_failure_policy(mut self, policy: BatchFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn mode(&self) -> BatchMode {
        self.mode
    }

    /// Where per-element failures are written under `KeepPartial`.
    pub fn errors_key(&self) -> String {
        format!("{}_errors", self.results_key)
    }

    async fn process_sequential(
        &self,
        ctx: &RunContext,
        items: &[P::Item],
    ) -> Vec<Result<P::Output, BoxError>> {
        let mut outcomes = Vec::with_capacity(items.len());
        for item in items.iter().cloned() {
            let outcome = self.processor.process_item(ctx, item).await;
            let failed = outcome.is_err();
            outcomes.push(outcome);
            if failed && self.failure_policy == BatchFailurePolicy::FailWhole {
                break;
            }
        }
        outcomes
    }

    /// Every element gets its own task. The join set aborts outstanding tasks
    /// if this future is dropped, e.g. when the run is cancelled.
    async fn process_concurrent(
        &self,
        ctx: &RunContext,
        items: &[P::Item],
        max_concurrency: Option<usize>,
    ) -> Vec<Result<P::Output, BoxError>> {
        // A cap at or above the item count never blocks a task.
        let semaphore = max_concurrency
            .filter(|limit| *limit < items.len())
            .map(|limit| Arc::new(Semaphore::new(limit.clamp(1, Semaphore::MAX_PERMITS))));
        let mut tasks = JoinSet::new();

        for (index, item) in items.iter().cloned().enumerate() {
            let processor = Arc::clone(&self.processor);
            let ctx = ctx.clone();
            let semaphore = semaphore.clone();
            tasks.spawn(async move {
                let outcome = process_one(processor, ctx, item, semaphore).await;
                (index, outcome)
            });
        }

        let mut slots: Vec<Option<Result<P::Output, BoxError>>> =
            (0..items.len()).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            // A panicked task loses its index; its slot stays empty below.
            if let Ok((index, outcome)) = joined {
                slots[index] = Some(outcome);
            }
        }

        slots
            .into_iter()
            .map(|slot| slot.unwrap_or_else(|| Err("batch item task panicked".into())))
            .collect()
    }
}

async fn process_one<P: BatchProcessor>(
    processor: Arc<P>,
    ctx: RunContext,
    item: P::Item,
    semaphore: Option<Arc<Semaphore>>,
) -> Result<P::Output, BoxError> {
    let _permit = match semaphore {
        Some(semaphore) => Some(semaphore.acquire_owned().await?),
        None => None,
    };
    processor.process_item(&ctx, item).await
}

#[async_trait]
impl<P: BatchProcessor> Node for BatchNode<P> {
    type Prep = Vec<P::Item>;
    type Exec = BatchOutcome<P::Output>;

    fn name(&self) -> &str {
        self.processor.name()
    }

    async fn prep(&self, _ctx: &RunContext, store: &SharedStore) -> Result<Vec<P::Item>, BoxError> {
        Ok(store.require::<Vec<P::Item>>(&self.items_key)?)
    }

    async fn exec(
        &self,
        ctx: &RunContext,
        items: &Vec<P::Item>,
    ) -> Result<BatchOutcome<P::Output>, BoxError> {
        let started = Instant::now();
        let processor = self.processor.name();
        BatchStarted {
            processor,
            item_count: items.len(),
            mode: self.mode.as_str(),
            max_concurrency: self.mode.max_concurrency(),
        }
        .log();

        let results = match self.mode {
            BatchMode::Sequential => self.process_sequential(ctx, items).await,
            BatchMode::Concurrent { max_concurrency } => {
                self.process_concurrent(ctx, items, max_concurrency).await
            }
        };

        let mut outputs = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(output) => outputs.push(Some(output)),
                Err(source) => {
                    BatchItemFailed {
                        processor,
                        index,
                        error: &*source,
                    }
                    .log();
                    // Results are in index order, so this is the lowest failing index.
                    if self.failure_policy == BatchFailurePolicy::FailWhole {
                        return Err(Box::new(BatchItemError { index, source }));
                    }
                    failures.push(BatchItemFailure {
                        index,
                        message: source.to_string(),
                    });
                    outputs.push(None);
                }
            }
        }

        BatchCompleted {
            processor,
            item_count: items.len(),
            failed: failures.len(),
            duration: started.elapsed(),
        }
        .log();

        Ok(BatchOutcome { outputs, failures })
    }

    async fn post(
        &self,
        _ctx: &RunContext,
        store: &SharedStore,
        _items: Vec<P::Item>,
        outcome: BatchOutcome<P::Output>,
    ) -> Result<Action, BoxError> {
        match self.failure_policy {
            BatchFailurePolicy::FailWhole => {
                let outputs: Vec<P::Output> = outcome.outputs.into_iter().flatten().collect();
                store.set(self.results_key.clone(), outputs);
            }
            BatchFailurePolicy::KeepPartial => {
                store.set(self.results_key.clone(), outcome.outputs);
                store.set(self.errors_key(), outcome.failures);
            }
        }
        Ok(Action::Default)
    }

    fn retry_policy(&self) -> RetryPolicy {
        self.retry_policy.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::run_node;
    use crate::errors::FlowError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Sleeps for the item's delay, fails on negative ids, and tracks how many
    /// items are in flight at once.
    #[derive(Default)]
    struct Delayed {
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl BatchProcessor for Delayed {
        type Item = (i32, u64);
        type Output = String;

        async fn process_item(&self, _ctx: &RunContext, item: (i32, u64)) -> Result<String, BoxError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(item.1)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if item.0 < 0 {
                return Err(format!("item {} rejected", item.0).into());
            }
            Ok(format!("Processed: {}", item.0))
        }
    }

    fn store_with(items: Vec<(i32, u64)>) -> SharedStore {
        let store = SharedStore::new();
        store.set(DEFAULT_ITEMS_KEY, items);
        store
    }

    fn batch_item_error(err: &FlowError) -> &BatchItemError {
        match err {
            FlowError::Exec { source, .. } => source
                .downcast_ref::<BatchItemError>()
                .expect("exec failure should carry a BatchItemError"),
            other => panic!("expected exec failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_concurrent_results_keep_input_order() {
        let node = BatchNode::new(Delayed::default()).concurrent(None);
        let store = store_with(vec![(1, 40), (2, 20), (3, 1)]);

        run_node(&node, "batch", &RunContext::new(), &store)
            .await
            .unwrap();

        assert_eq!(
            store.require::<Vec<String>>(DEFAULT_RESULTS_KEY).unwrap(),
            vec!["Processed: 1", "Processed: 2", "Processed: 3"]
        );
    }

    #[tokio::test]
    async fn test_concurrency_cap_is_respected() {
        let node = BatchNode::new(Delayed::default()).concurrent(Some(2));
        let store = store_with((0..6).map(|i| (i, 10)).collect());

        run_node(&node, "batch", &RunContext::new(), &store)
            .await
            .unwrap();

        assert!(node.processor.peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(store.require::<Vec<String>>(DEFAULT_RESULTS_KEY).unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_oversized_cap_runs_unbounded() {
        let node = BatchNode::new(Delayed::default()).concurrent(Some(usize::MAX));
        let store = store_with((0..4).map(|i| (i, 10)).collect());

        run_node(&node, "batch", &RunContext::new(), &store)
            .await
            .unwrap();

        assert_eq!(node.processor.peak.load(Ordering::SeqCst), 4);
        assert_eq!(store.require::<Vec<String>>(DEFAULT_RESULTS_KEY).unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_sequential_fails_fast() {
        let node = BatchNode::new(Delayed::default());
        let store = store_with(vec![(1, 0), (-2, 0), (3, 0)]);

        let err = run_node(&node, "batch", &RunContext::new(), &store)
            .await
            .unwrap_err();

        assert_eq!(batch_item_error(&err).index, 1);
        assert_eq!(node.processor.calls.load(Ordering::SeqCst), 2);
        assert!(!store.contains(DEFAULT_RESULTS_KEY));
    }

    #[tokio::test]
    async fn test_concurrent_reports_lowest_failing_index() {
        let node = BatchNode::new(Delayed::default()).concurrent(None);
        // Index 3 fails long before index 1 does.
        let store = store_with(vec![(0, 0), (-1, 40), (2, 0), (-3, 1)]);

        let err = run_node(&node, "batch", &RunContext::new(), &store)
            .await
            .unwrap_err();

        let item_error = batch_item_error(&err);
        assert_eq!(item_error.index, 1);
        assert_eq!(item_error.source.to_string(), "item -1 rejected");
        assert_eq!(node.processor.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_keep_partial_records_failures() {
        let node = BatchNode::new(Delayed::default())
            .concurrent(Some(3))
            .with_results_key("labels")
            .with_failure_policy(BatchFailurePolicy::KeepPartial);
        let store = store_with(vec![(1, 0), (-2, 0), (3, 0)]);

        run_node(&node, "batch", &RunContext::new(), &store)
            .await
            .unwrap();

        assert_eq!(
            store.require::<Vec<Option<String>>>("labels").unwrap(),
            vec![Some("Processed: 1".to_string()), None, Some("Processed: 3".to_string())]
        );
        assert_eq!(
            store.require::<Vec<BatchItemFailure>>("labels_errors").unwrap(),
            vec![BatchItemFailure {
                index: 1,
                message: "item -2 rejected".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_empty_items_produce_empty_results() {
        for mode in [BatchMode::Sequential, BatchMode::Concurrent { max_concurrency: None }] {
            let node = BatchNode::new(Delayed::default()).with_mode(mode);
            let store = store_with(Vec::new());

            run_node(&node, "batch", &RunContext::new(), &store)
                .await
                .unwrap();

            assert!(store.require::<Vec<String>>(DEFAULT_RESULTS_KEY).unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_missing_items_fail_in_prep() {
        let node = BatchNode::new(Delayed::default());
        let err = run_node(&node, "batch", &RunContext::new(), &SharedStore::new())
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::Prep { .. }));
    }
}
