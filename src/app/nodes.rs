// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Application nodes.
//!
//! Every node reads what it needs in prep and writes what it owns in post; the
//! store keys are listed in [`keys`](crate::app::keys).

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::app::history::History;
use crate::app::keys;
use crate::config::ModelConfig;
use crate::engine::{Action, RetryPolicy, RunContext};
use crate::errors::{BoxError, StoreError};
use crate::store::SharedStore;
use crate::traits::{BatchProcessor, CompletionRequest, Node, TextCompleter, WebSearcher};

pub const SEARCH_ACTION: &str = "search";
pub const PROCESS_ACTION: &str = "process";
pub const ANALYZE_ACTION: &str = "analyze";

/// Everything the answer node needs for one prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerInput {
    pub question: String,
    pub context: String,
    pub history: History,
    pub images: Vec<PathBuf>,
}

/// `Context: …\nAnswer this question: …`, with the transcript in between when
/// there is one.
pub fn build_answer_prompt(input: &AnswerInput) -> String {
    if input.history.is_empty() {
        format!(
            "Context: {}\nAnswer this question: {}",
            input.context, input.question
        )
    } else {
        format!(
            "Context: {}\nHistory:\n{}\nAnswer this question: {}",
            input.context,
            input.history.render(),
            input.question
        )
    }
}

/// Answers `question` with the completion service and records the exchange.
pub struct AnswerNode {
    completer: Arc<dyn TextCompleter>,
    model: ModelConfig,
    system_context: String,
    retry_policy: RetryPolicy,
    use_search_grounding: bool,
}

impl AnswerNode {
    pub fn new(completer: Arc<dyn TextCompleter>, model: ModelConfig) -> Self {
        Self {
            completer,
            model,
            system_context: String::new(),
            retry_policy: RetryPolicy::none(),
            use_search_grounding: false,
        }
    }

    /// Context used when the store holds none.
    pub fn with_system_context(mut self, context: impl Into<String>) -> Self {
        self.system_context = context.into();
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn with_search_grounding(mut self, enabled: bool) -> Self {
        self.use_search_grounding = enabled;
        self
    }
}

#[async_trait]
impl Node for AnswerNode {
    type Prep = AnswerInput;
    type Exec = String;

    fn name(&self) -> &str {
        "AnswerNode"
    }

    async fn prep(&self, _ctx: &RunContext, store: &SharedStore) -> Result<AnswerInput, BoxError> {
        Ok(AnswerInput {
            question: store.require(keys::QUESTION)?,
            context: store.get_or(keys::CONTEXT, self.system_context.clone())?,
            history: History::load(store)?,
            images: store.get_or(keys::IMAGE_PATHS, Vec::new())?,
        })
    }

    async fn exec(&self, ctx: &RunContext, input: &AnswerInput) -> Result<String, BoxError> {
        let request = CompletionRequest::new(build_answer_prompt(input))
            .with_images(input.images.clone())
            .with_search_grounding(self.use_search_grounding);
        Ok(self.completer.complete(ctx, &request, &self.model).await?)
    }

    async fn post(
        &self,
        _ctx: &RunContext,
        store: &SharedStore,
        input: AnswerInput,
        answer: String,
    ) -> Result<Action, BoxError> {
        let mut history = input.history;
        history.push(input.question, answer.clone());
        history.save(store);
        store.set(keys::ANSWER, answer);
        Ok(Action::Default)
    }

    fn retry_policy(&self) -> RetryPolicy {
        self.retry_policy.clone()
    }
}

/// Routes to `"search"` until search results exist, then to `"process"`.
pub struct AnalyzeNode;

#[async_trait]
impl Node for AnalyzeNode {
    type Prep = bool;
    type Exec = Action;

    fn name(&self) -> &str {
        "AnalyzeNode"
    }

    async fn prep(&self, _ctx: &RunContext, store: &SharedStore) -> Result<bool, BoxError> {
        store.require::<String>(keys::QUESTION)?;
        Ok(store.contains(keys::SEARCH_RESULTS))
    }

    async fn exec(&self, _ctx: &RunContext, has_results: &bool) -> Result<Action, BoxError> {
        Ok(if *has_results {
            Action::named(PROCESS_ACTION)
        } else {
            Action::named(SEARCH_ACTION)
        })
    }

    async fn post(
        &self,
        _ctx: &RunContext,
        _store: &SharedStore,
        _has_results: bool,
        action: Action,
    ) -> Result<Action, BoxError> {
        Ok(action)
    }

    fn declared_actions(&self) -> Vec<Action> {
        vec![Action::named(SEARCH_ACTION), Action::named(PROCESS_ACTION)]
    }
}

/// Searches the web for `question` and hands control back to analysis.
pub struct SearchNode {
    searcher: Arc<dyn WebSearcher>,
    retry_policy: RetryPolicy,
}

impl SearchNode {
    pub fn new(searcher: Arc<dyn WebSearcher>) -> Self {
        Self {
            searcher,
            retry_policy: RetryPolicy::none(),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }
}

#[async_trait]
impl Node for SearchNode {
    type Prep = String;
    type Exec = String;

    fn name(&self) -> &str {
        "SearchNode"
    }

    async fn prep(&self, _ctx: &RunContext, store: &SharedStore) -> Result<String, BoxError> {
        Ok(store.require(keys::QUESTION)?)
    }

    async fn exec(&self, ctx: &RunContext, question: &String) -> Result<String, BoxError> {
        Ok(self.searcher.search(ctx, question).await?)
    }

    async fn post(
        &self,
        _ctx: &RunContext,
        store: &SharedStore,
        _question: String,
        results: String,
    ) -> Result<Action, BoxError> {
        store.set(keys::SEARCH_RESULTS, results);
        Ok(Action::named(ANALYZE_ACTION))
    }

    fn retry_policy(&self) -> RetryPolicy {
        self.retry_policy.clone()
    }

    fn declared_actions(&self) -> Vec<Action> {
        vec![Action::named(ANALYZE_ACTION)]
    }
}

/// Promotes search results to the answer context.
pub struct ProcessNode;

#[async_trait]
impl Node for ProcessNode {
    type Prep = String;
    type Exec = String;

    fn name(&self) -> &str {
        "ProcessNode"
    }

    async fn prep(&self, _ctx: &RunContext, store: &SharedStore) -> Result<String, BoxError> {
        Ok(store.require(keys::SEARCH_RESULTS)?)
    }

    async fn exec(&self, _ctx: &RunContext, results: &String) -> Result<String, BoxError> {
        Ok(results.clone())
    }

    async fn post(
        &self,
        _ctx: &RunContext,
        store: &SharedStore,
        _results: String,
        context: String,
    ) -> Result<Action, BoxError> {
        store.set(keys::CONTEXT, context);
        Ok(Action::Default)
    }
}

/// Seeds the batch flow with its items.
pub struct LoadItemsNode {
    items: Vec<String>,
}

impl LoadItemsNode {
    pub fn new(items: Vec<String>) -> Self {
        Self { items }
    }
}

impl Default for LoadItemsNode {
    fn default() -> Self {
        Self::new((1..=5).map(|i| format!("Item {}", i)).collect())
    }
}

#[async_trait]
impl Node for LoadItemsNode {
    type Prep = ();
    type Exec = Vec<String>;

    fn name(&self) -> &str {
        "LoadItemsNode"
    }

    async fn prep(&self, _ctx: &RunContext, _store: &SharedStore) -> Result<(), BoxError> {
        Ok(())
    }

    async fn exec(&self, _ctx: &RunContext, _prep: &()) -> Result<Vec<String>, BoxError> {
        Ok(self.items.clone())
    }

    async fn post(
        &self,
        _ctx: &RunContext,
        store: &SharedStore,
        _prep: (),
        items: Vec<String>,
    ) -> Result<Action, BoxError> {
        store.set(crate::engine::batch::DEFAULT_ITEMS_KEY, items);
        Ok(Action::Default)
    }
}

/// Batch processor that labels each item as processed.
pub struct LabelItems;

#[async_trait]
impl BatchProcessor for LabelItems {
    type Item = String;
    type Output = String;

    fn name(&self) -> &str {
        "LabelItems"
    }

    async fn process_item(&self, _ctx: &RunContext, item: String) -> Result<String, BoxError> {
        Ok(format!("Processed: {}", item))
    }
}

/// Placeholder shown for items a partial batch could not process.
pub const FAILED_ITEM: &str = "<failed>";

/// `Aggregated Results:` followed by one numbered line per result.
pub fn aggregate_results(results: &[String]) -> String {
    let mut text = String::from("Aggregated Results:\n");
    for (i, result) in results.iter().enumerate() {
        text.push_str(&format!("{}. {}\n", i + 1, result));
    }
    text
}

/// Joins batch results into `final_results`.
pub struct AggregateResultsNode;

#[async_trait]
impl Node for AggregateResultsNode {
    type Prep = Vec<String>;
    type Exec = String;

    fn name(&self) -> &str {
        "AggregateResultsNode"
    }

    /// Accepts both complete (`Vec<String>`) and partial (`Vec<Option<String>>`)
    /// batch results.
    async fn prep(&self, _ctx: &RunContext, store: &SharedStore) -> Result<Vec<String>, BoxError> {
        let key = crate::engine::batch::DEFAULT_RESULTS_KEY;
        match store.require::<Vec<String>>(key) {
            Ok(results) => Ok(results),
            Err(StoreError::TypeMismatch { .. }) => Ok(store
                .require::<Vec<Option<String>>>(key)?
                .into_iter()
                .map(|result| result.unwrap_or_else(|| FAILED_ITEM.to_string()))
                .collect()),
            Err(missing) => Err(missing.into()),
        }
    }

    async fn exec(&self, _ctx: &RunContext, results: &Vec<String>) -> Result<String, BoxError> {
        Ok(aggregate_results(results))
    }

    async fn post(
        &self,
        _ctx: &RunContext,
        store: &SharedStore,
        _results: Vec<String>,
        aggregated: String,
    ) -> Result<Action, BoxError> {
        store.set(keys::FINAL_RESULTS, aggregated);
        Ok(Action::Default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::{ScriptedCompleter, ScriptedSearcher};
    use crate::engine::run_node;
    use crate::errors::FlowError;
    use std::time::Duration;

    fn input(history: History) -> AnswerInput {
        AnswerInput {
            question: "What is Rust?".to_string(),
            context: "be brief".to_string(),
            history,
            images: Vec::new(),
        }
    }

    #[test]
    fn test_prompt_without_history() {
        assert_eq!(
            build_answer_prompt(&input(History::default())),
            "Context: be brief\nAnswer this question: What is Rust?"
        );
    }

    #[test]
    fn test_prompt_with_history() {
        let mut history = History::default();
        history.push("hi", "hello");
        assert_eq!(
            build_answer_prompt(&input(history)),
            "Context: be brief\nHistory:\n1. User: hi\n   AI: hello\n\nAnswer this question: What is Rust?"
        );
    }

    #[tokio::test]
    async fn test_answer_node_writes_answer_and_history() {
        let completer = Arc::new(ScriptedCompleter::new().reply("A systems language."));
        let node = AnswerNode::new(completer.clone(), ModelConfig::default())
            .with_system_context("You are helpful.");
        let store = SharedStore::new();
        store.set(keys::QUESTION, "What is Rust?".to_string());
        store.set(keys::IMAGE_PATHS, vec![PathBuf::from("diagram.png")]);

        run_node(&node, "answer", &RunContext::new(), &store)
            .await
            .unwrap();

        assert_eq!(
            store.require::<String>(keys::ANSWER).unwrap(),
            "A systems language."
        );
        let history = History::load(&store).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history.conversations[0].user, "What is Rust?");

        let requests = completer.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].prompt.starts_with("Context: You are helpful.\n"));
        assert_eq!(requests[0].images, vec![PathBuf::from("diagram.png")]);
    }

    #[tokio::test]
    async fn test_answer_node_retries_service_failures() {
        let completer = Arc::new(ScriptedCompleter::new().fail(503).reply("recovered"));
        let node = AnswerNode::new(completer.clone(), ModelConfig::default())
            .with_retry_policy(RetryPolicy::constant(1, Duration::from_millis(1)));
        let store = SharedStore::new();
        store.set(keys::QUESTION, "q".to_string());

        run_node(&node, "answer", &RunContext::new(), &store)
            .await
            .unwrap();

        assert_eq!(store.require::<String>(keys::ANSWER).unwrap(), "recovered");
        assert_eq!(completer.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_answer_node_requires_question() {
        let node = AnswerNode::new(Arc::new(ScriptedCompleter::new()), ModelConfig::default());
        let err = run_node(&node, "answer", &RunContext::new(), &SharedStore::new())
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::Prep { .. }));
        assert!(err.to_string().contains("question"));
    }

    #[tokio::test]
    async fn test_analyze_routes_on_search_results() {
        let store = SharedStore::new();
        store.set(keys::QUESTION, "q".to_string());
        let ctx = RunContext::new();

        let first = run_node(&AnalyzeNode, "analyze", &ctx, &store).await.unwrap();
        assert_eq!(first, Action::named(SEARCH_ACTION));

        store.set(keys::SEARCH_RESULTS, "results".to_string());
        let second = run_node(&AnalyzeNode, "analyze", &ctx, &store).await.unwrap();
        assert_eq!(second, Action::named(PROCESS_ACTION));
    }

    #[tokio::test]
    async fn test_search_then_process() {
        let searcher = Arc::new(ScriptedSearcher::new("Web search results:\n\nSource 1: …"));
        let store = SharedStore::new();
        store.set(keys::QUESTION, "rust news".to_string());
        let ctx = RunContext::new();

        let action = run_node(&SearchNode::new(searcher.clone()), "search", &ctx, &store)
            .await
            .unwrap();
        assert_eq!(action, Action::named(ANALYZE_ACTION));
        assert_eq!(searcher.queries(), vec!["rust news"]);

        run_node(&ProcessNode, "process", &ctx, &store).await.unwrap();
        assert_eq!(
            store.require::<String>(keys::CONTEXT).unwrap(),
            "Web search results:\n\nSource 1: …"
        );
    }

    #[test]
    fn test_aggregate_results() {
        let results = vec!["Processed: Item 1".to_string(), "Processed: Item 2".to_string()];
        assert_eq!(
            aggregate_results(&results),
            "Aggregated Results:\n1. Processed: Item 1\n2. Processed: Item 2\n"
        );
        assert_eq!(aggregate_results(&[]), "Aggregated Results:\n");
    }

    #[tokio::test]
    async fn test_aggregate_accepts_partial_results() {
        let store = SharedStore::new();
        store.set(
            crate::engine::batch::DEFAULT_RESULTS_KEY,
            vec![Some("Processed: a".to_string()), None],
        );

        run_node(&AggregateResultsNode, "aggregate", &RunContext::new(), &store)
            .await
            .unwrap();

        assert_eq!(
            store.require::<String>(keys::FINAL_RESULTS).unwrap(),
            "Aggregated Results:\n1. Processed: a\n2. <failed>\n"
        );
    }
}
