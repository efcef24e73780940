// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The prep → exec-with-retry → post lifecycle of a single node visit.

use async_trait::async_trait;

use crate::engine::context::{Interrupted, RunContext};
use crate::engine::retry::exec_with_retry;
use crate::engine::Action;
use crate::errors::{FlowError, Phase};
use crate::observability::messages::node::PhaseFailed;
use crate::observability::messages::StructuredLog;
use crate::store::SharedStore;
use crate::traits::{Node, Runnable};

impl FlowError {
    pub(crate) fn interrupted(node_id: &str, phase: Phase, interrupted: Interrupted) -> Self {
        match interrupted {
            Interrupted::Cancelled => FlowError::Cancelled {
                node: node_id.to_string(),
                phase,
            },
            Interrupted::DeadlineExceeded => FlowError::DeadlineExceeded {
                node: node_id.to_string(),
                phase,
            },
        }
    }
}

/// Adapts a typed [`Node`] to the object-safe [`Runnable`] the flow stores.
pub(crate) struct NodeRunner<N> {
    node: N,
}

impl<N: Node> NodeRunner<N> {
    pub(crate) fn new(node: N) -> Self {
        Self { node }
    }
}

#[async_trait]
impl<N: Node> Runnable for NodeRunner<N> {
    fn name(&self) -> &str {
        self.node.name()
    }

    fn declared_actions(&self) -> Vec<Action> {
        self.node.declared_actions()
    }

    async fn run(
        &self,
        node_id: &str,
        ctx: &RunContext,
        store: &SharedStore,
    ) -> Result<Action, FlowError> {
        run_node(&self.node, node_id, ctx, store).await
    }
}

/// Run one visit of `node`.
///
/// Prep and post run exactly once and are never retried; exec goes through
/// [`exec_with_retry`]. Each phase is raced against the context's cancellation
/// token and deadline.
pub async fn run_node<N: Node>(
    node: &N,
    node_id: &str,
    ctx: &RunContext,
    store: &SharedStore,
) -> Result<Action, FlowError> {
    let prep = ctx
        .guard(node.prep(ctx, store))
        .await
        .map_err(|interrupted| FlowError::interrupted(node_id, Phase::Prep, interrupted))?
        .map_err(|source| {
            PhaseFailed {
                node_id,
                phase: Phase::Prep,
                error: &*source,
            }
            .log();
            FlowError::Prep {
                node: node_id.to_string(),
                source,
            }
        })?;

    let exec = exec_with_retry(node, node_id, ctx, &prep).await?;

    ctx.guard(node.post(ctx, store, prep, exec))
        .await
        .map_err(|interrupted| FlowError::interrupted(node_id, Phase::Post, interrupted))?
        .map_err(|source| {
            PhaseFailed {
                node_id,
                phase: Phase::Post,
                error: &*source,
            }
            .log();
            FlowError::Post {
                node: node_id.to_string(),
                source,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RetryPolicy;
    use crate::errors::BoxError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Fails exec a fixed number of times, counting every phase call.
    struct Flaky {
        failures: u32,
        retries: u32,
        fallback: Option<&'static str>,
        prep_calls: Arc<AtomicU32>,
        exec_calls: Arc<AtomicU32>,
        post_calls: Arc<AtomicU32>,
    }

    impl Flaky {
        fn new(failures: u32, retries: u32) -> Self {
            Self {
                failures,
                retries,
                fallback: None,
                prep_calls: Arc::new(AtomicU32::new(0)),
                exec_calls: Arc::new(AtomicU32::new(0)),
                post_calls: Arc::new(AtomicU32::new(0)),
            }
        }
    }

    #[async_trait]
    impl Node for Flaky {
        type Prep = String;
        type Exec = String;

        async fn prep(&self, _ctx: &RunContext, store: &SharedStore) -> Result<String, BoxError> {
            self.prep_calls.fetch_add(1, Ordering::SeqCst);
            Ok(store.get_or("input", "x".to_string())?)
        }

        async fn exec(&self, _ctx: &RunContext, prep: &String) -> Result<String, BoxError> {
            let call = self.exec_calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                return Err(format!("attempt {} failed", call).into());
            }
            Ok(format!("{}!", prep))
        }

        async fn exec_fallback(
            &self,
            _ctx: &RunContext,
            _prep: &String,
            error: BoxError,
        ) -> Result<String, BoxError> {
            match self.fallback {
                Some(value) => Ok(value.to_string()),
                None => Err(error),
            }
        }

        async fn post(
            &self,
            _ctx: &RunContext,
            store: &SharedStore,
            _prep: String,
            exec: String,
        ) -> Result<Action, BoxError> {
            self.post_calls.fetch_add(1, Ordering::SeqCst);
            store.set("output", exec);
            Ok(Action::Default)
        }

        fn retry_policy(&self) -> RetryPolicy {
            RetryPolicy::constant(self.retries, Duration::from_millis(5))
        }
    }

    #[tokio::test]
    async fn test_success_after_k_failures_matches_immediate_success() {
        for k in 0..4 {
            let node = Flaky::new(k, k);
            let store = SharedStore::new();
            store.set("input", "hi".to_string());

            let action = run_node(&node, "flaky", &RunContext::new(), &store)
                .await
                .unwrap();

            assert_eq!(action, Action::Default);
            assert_eq!(store.require::<String>("output").unwrap(), "hi!");
            assert_eq!(node.exec_calls.load(Ordering::SeqCst), k + 1);
            assert_eq!(node.prep_calls.load(Ordering::SeqCst), 1);
            assert_eq!(node.post_calls.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test]
    async fn test_exhausted_retries_use_fallback() {
        let mut node = Flaky::new(u32::MAX, 2);
        node.fallback = Some("fallback answer");
        let store = SharedStore::new();

        run_node(&node, "flaky", &RunContext::new(), &store)
            .await
            .unwrap();

        assert_eq!(store.require::<String>("output").unwrap(), "fallback answer");
        assert_eq!(node.exec_calls.load(Ordering::SeqCst), 3);
        assert_eq!(node.post_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhausted_retries_without_fallback_fail_with_node_identity() {
        let node = Flaky::new(u32::MAX, 2);
        let store = SharedStore::new();

        let err = run_node(&node, "flaky", &RunContext::new(), &store)
            .await
            .unwrap_err();

        match err {
            FlowError::Exec {
                node: ref id,
                attempts,
                ref source,
            } => {
                assert_eq!(id, "flaky");
                assert_eq!(attempts, 3);
                assert_eq!(source.to_string(), "attempt 3 failed");
            }
            other => panic!("expected exec failure, got {:?}", other),
        }
        assert_eq!(node.post_calls.load(Ordering::SeqCst), 0);
        assert!(!store.contains("output"));
    }

    #[tokio::test]
    async fn test_prep_failure_is_not_retried() {
        let node = Flaky::new(0, 5);
        let store = SharedStore::new();
        store.set("input", 12_u8);

        let err = run_node(&node, "flaky", &RunContext::new(), &store)
            .await
            .unwrap_err();

        assert!(matches!(err, FlowError::Prep { .. }));
        assert_eq!(node.prep_calls.load(Ordering::SeqCst), 1);
        assert_eq!(node.exec_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancelled_context_stops_before_prep() {
        let node = Flaky::new(0, 0);
        let ctx = RunContext::new();
        ctx.cancel();

        let err = run_node(&node, "flaky", &ctx, &SharedStore::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            FlowError::Cancelled {
                phase: Phase::Prep,
                ..
            }
        ));
        assert_eq!(node.prep_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_interrupts_retry_wait() {
        struct AlwaysFails;

        #[async_trait]
        impl Node for AlwaysFails {
            type Prep = ();
            type Exec = ();

            async fn prep(&self, _ctx: &RunContext, _store: &SharedStore) -> Result<(), BoxError> {
                Ok(())
            }

            async fn exec(&self, _ctx: &RunContext, _prep: &()) -> Result<(), BoxError> {
                Err("down".into())
            }

            fn retry_policy(&self) -> RetryPolicy {
                RetryPolicy::constant(100, Duration::from_secs(60))
            }
        }

        let ctx = RunContext::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(90)).await;
            canceller.cancel();
        });

        let err = run_node(&AlwaysFails, "always_fails", &ctx, &SharedStore::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            FlowError::Cancelled {
                phase: Phase::Exec,
                ..
            }
        ));
    }
}
