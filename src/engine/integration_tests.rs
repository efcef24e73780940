// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::app::{agent_flow, keys, qa_flow, History};
use crate::backends::stub::{ScriptedCompleter, ScriptedSearcher};
use crate::config::AppConfig;
use crate::engine::{Action, FlowBuilder, RunContext};
use crate::errors::{BoxError, FlowError, GraphError};
use crate::store::SharedStore;
use crate::traits::Node;

/// Integration tests running whole flows against the shared store
#[cfg(test)]
mod tests {
    use super::*;

    /// Returns a fixed action and counts its visits under `visits/<label>`.
    struct Route {
        label: &'static str,
        action: Action,
        declared: Vec<Action>,
    }

    impl Route {
        fn new(label: &'static str, action: impl Into<Action>) -> Self {
            let action = action.into();
            Self {
                label,
                declared: vec![action.clone()],
                action,
            }
        }

        fn declaring(mut self, declared: &[&str]) -> Self {
            self.declared = declared.iter().map(|a| Action::from(*a)).collect();
            self
        }
    }

    #[async_trait]
    impl Node for Route {
        type Prep = usize;
        type Exec = ();

        async fn prep(&self, _ctx: &RunContext, store: &SharedStore) -> Result<usize, BoxError> {
            Ok(store.get_or(&format!("visits/{}", self.label), 0_usize)?)
        }

        async fn exec(&self, _ctx: &RunContext, _visits: &usize) -> Result<(), BoxError> {
            Ok(())
        }

        async fn post(
            &self,
            _ctx: &RunContext,
            store: &SharedStore,
            visits: usize,
            _exec: (),
        ) -> Result<Action, BoxError> {
            store.set(format!("visits/{}", self.label), visits + 1);
            Ok(self.action.clone())
        }

        fn declared_actions(&self) -> Vec<Action> {
            self.declared.clone()
        }
    }

    fn visits(store: &SharedStore, label: &str) -> usize {
        store.get_or(&format!("visits/{}", label), 0_usize).unwrap()
    }

    #[tokio::test]
    async fn test_agent_loop_searches_once_then_answers() {
        let completer = Arc::new(ScriptedCompleter::new().reply("Rust 1.80 shipped in July."));
        let searcher = Arc::new(ScriptedSearcher::new(
            "Web search results:\n\nSource 1: Rust Blog (https://blog.rust-lang.org)\nContent: 1.80\n\n",
        ));
        let flow = agent_flow(completer.clone(), searcher.clone(), &AppConfig::default()).unwrap();
        let store = SharedStore::new();
        store.set(keys::QUESTION, "Latest Rust release?".to_string());

        let report = flow.run(&RunContext::new(), &store).await.unwrap();

        assert_eq!(
            report.visited,
            vec!["analyze", "search", "analyze", "process", "answer"]
        );
        assert_eq!(report.terminal_node, "answer");
        assert_eq!(report.terminal_action, Action::Default);
        assert_eq!(searcher.queries(), vec!["Latest Rust release?"]);

        let prompt = &completer.requests()[0].prompt;
        assert!(prompt.starts_with("Context: Web search results:"));
        assert!(prompt.ends_with("Answer this question: Latest Rust release?"));
        assert_eq!(
            store.require::<String>(keys::ANSWER).unwrap(),
            "Rust 1.80 shipped in July."
        );
    }

    #[tokio::test]
    async fn test_qa_flow_carries_history_between_runs() {
        let completer = Arc::new(ScriptedCompleter::new().reply("Paris.").reply("Yes."));
        let flow = qa_flow(completer.clone(), &AppConfig::default()).unwrap();
        let store = SharedStore::new();
        let ctx = RunContext::new();

        store.set(keys::QUESTION, "Capital of France?".to_string());
        flow.run(&ctx, &store).await.unwrap();
        store.set(keys::QUESTION, "Is it big?".to_string());
        flow.run(&ctx, &store).await.unwrap();

        let history = History::load(&store).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.conversations[1].ai, "Yes.");

        let second_prompt = &completer.requests()[1].prompt;
        assert!(second_prompt.contains("History:\n1. User: Capital of France?\n   AI: Paris.\n"));
    }

    #[tokio::test]
    async fn test_subflow_terminal_action_routes_parent() {
        let inner = FlowBuilder::new("inner")
            .node("check", Route::new("check", "approved"))
            .start("check")
            .build()
            .unwrap();

        let outer = FlowBuilder::new("outer")
            .node("begin", Route::new("begin", Action::Default))
            .subflow("review", inner)
            .node("publish", Route::new("publish", Action::Default))
            .then("begin", "review")
            .edge("review", "approved", "publish")
            .start("begin")
            .build()
            .unwrap();

        let store = SharedStore::new();
        let report = outer.run(&RunContext::new(), &store).await.unwrap();

        assert_eq!(report.visited, vec!["begin", "review", "publish"]);
        assert_eq!(visits(&store, "check"), 1);
        assert_eq!(visits(&store, "publish"), 1);
    }

    #[tokio::test]
    async fn test_step_limit_stops_runaway_loop() {
        let flow = FlowBuilder::new("spin")
            .node("ping", Route::new("ping", "pong"))
            .node("pong", Route::new("pong", "ping"))
            .edge("ping", "pong", "pong")
            .edge("pong", "ping", "ping")
            .start("ping")
            .max_steps(6)
            .build()
            .unwrap();

        let store = SharedStore::new();
        let err = flow.run(&RunContext::new(), &store).await.unwrap_err();

        assert!(matches!(err, FlowError::StepLimitExceeded { limit: 6, .. }));
        assert_eq!(visits(&store, "ping"), 3);
        assert_eq!(visits(&store, "pong"), 3);
    }

    #[tokio::test]
    async fn test_undeclared_action_at_runtime_fails_run() {
        let flow = FlowBuilder::new("strict")
            .node("router", Route::new("router", "sideways").declaring(&["left", "right"]))
            .node("left", Route::new("left", Action::Default))
            .edge("router", "left", "left")
            .start("router")
            .build()
            .unwrap();

        let err = flow.run(&RunContext::new(), &SharedStore::new()).await.unwrap_err();

        match err {
            FlowError::UndeclaredAction { node, action } => {
                assert_eq!(node, "router");
                assert_eq!(action.as_str(), "sideways");
            }
            other => panic!("expected undeclared action, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_declared_but_unwired_action_ends_run() {
        let flow = FlowBuilder::new("early_exit")
            .node("router", Route::new("router", "right").declaring(&["left", "right"]))
            .node("left", Route::new("left", Action::Default))
            .edge("router", "left", "left")
            .start("router")
            .build()
            .unwrap();

        let store = SharedStore::new();
        let report = flow.run(&RunContext::new(), &store).await.unwrap();

        assert_eq!(report.terminal_node, "router");
        assert_eq!(report.terminal_action, Action::named("right"));
        assert_eq!(visits(&store, "left"), 0);
    }

    #[tokio::test]
    async fn test_done_action_always_terminates() {
        let flow = FlowBuilder::new("finish")
            .node("stop", Route::new("stop", Action::Done).declaring(&["default"]))
            .node("never", Route::new("never", Action::Default))
            .then("stop", "never")
            .start("stop")
            .build()
            .unwrap();

        let store = SharedStore::new();
        let report = flow.run(&RunContext::new(), &store).await.unwrap();

        assert_eq!(report.terminal_action, Action::Done);
        assert_eq!(visits(&store, "never"), 0);
    }

    #[test]
    fn test_build_rejects_unknown_destination() {
        let err = FlowBuilder::new("broken")
            .node("answer", Route::new("answer", Action::Default))
            .then("answer", "render")
            .start("answer")
            .build()
            .unwrap_err();

        assert_eq!(err.flow, "broken");
        assert_eq!(
            err.errors,
            vec![GraphError::UnknownDestination {
                from: "answer".to_string(),
                action: Action::Default,
                to: "render".to_string(),
            }]
        );
        assert!(err.to_string().contains("render"));
    }

    #[tokio::test]
    async fn test_failing_node_aborts_without_later_visits() {
        struct Broken;

        #[async_trait]
        impl Node for Broken {
            type Prep = ();
            type Exec = ();

            async fn prep(&self, _ctx: &RunContext, _store: &SharedStore) -> Result<(), BoxError> {
                Ok(())
            }

            async fn exec(&self, _ctx: &RunContext, _prep: &()) -> Result<(), BoxError> {
                Err("service down".into())
            }
        }

        let flow = FlowBuilder::new("fragile")
            .node("broken", Broken)
            .node("after", Route::new("after", Action::Default))
            .then("broken", "after")
            .start("broken")
            .build()
            .unwrap();

        let store = SharedStore::new();
        let err = flow.run(&RunContext::new(), &store).await.unwrap_err();

        assert_eq!(err.node(), Some("broken"));
        assert_eq!(visits(&store, "after"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_interrupts_slow_node() {
        struct Slow {
            started: Arc<AtomicUsize>,
        }

        #[async_trait]
        impl Node for Slow {
            type Prep = ();
            type Exec = ();

            async fn prep(&self, _ctx: &RunContext, _store: &SharedStore) -> Result<(), BoxError> {
                Ok(())
            }

            async fn exec(&self, _ctx: &RunContext, _prep: &()) -> Result<(), BoxError> {
                self.started.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(600)).await;
                Ok(())
            }
        }

        let started = Arc::new(AtomicUsize::new(0));
        let flow = FlowBuilder::new("slow")
            .node(
                "slow",
                Slow {
                    started: started.clone(),
                },
            )
            .start("slow")
            .build()
            .unwrap();

        let ctx = RunContext::new().with_timeout(Duration::from_secs(5));
        let err = flow.run(&ctx, &SharedStore::new()).await.unwrap_err();

        assert!(matches!(err, FlowError::DeadlineExceeded { .. }));
        assert_eq!(started.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_one_flow_runs_concurrently_on_separate_stores() {
        let flow = Arc::new(
            FlowBuilder::new("shared")
                .node("a", Route::new("a", Action::Default))
                .node("b", Route::new("b", Action::Default))
                .then("a", "b")
                .start("a")
                .build()
                .unwrap(),
        );

        let mut handles = Vec::new();
        for _ in 0..8 {
            let flow = flow.clone();
            handles.push(tokio::spawn(async move {
                let store = SharedStore::new();
                flow.run(&RunContext::new(), &store).await.map(|_| store)
            }));
        }

        for handle in handles {
            let store = handle.await.unwrap().unwrap();
            assert_eq!(visits(&store, "a"), 1);
            assert_eq!(visits(&store, "b"), 1);
        }
    }
}
