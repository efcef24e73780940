// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::engine::{Action, RetryPolicy, RunContext};
use crate::errors::BoxError;
use crate::store::SharedStore;

/// A unit of work with a three-phase lifecycle.
///
/// Per visit the flow calls, in order:
/// 1. [`prep`](Node::prep) reads inputs from the store, exactly once;
/// 2. [`exec`](Node::exec) does the work on the prepared value only, and is
///    re-invoked under [`retry_policy`](Node::retry_policy) when it fails, with
///    [`exec_fallback`](Node::exec_fallback) as the last resort;
/// 3. [`post`](Node::post) writes results back to the store, exactly once, and
///    returns the [`Action`] used for routing.
///
/// Nodes are constructed once and may be visited many times, including several
/// times in one run when the graph loops. They hold configuration, not run
/// state; everything a visit needs flows through the store.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use nodeflow::engine::{Action, RunContext};
/// use nodeflow::errors::BoxError;
/// use nodeflow::store::SharedStore;
/// use nodeflow::traits::Node;
///
/// struct Shout;
///
/// #[async_trait]
/// impl Node for Shout {
///     type Prep = String;
///     type Exec = String;
///
///     async fn prep(&self, _ctx: &RunContext, store: &SharedStore) -> Result<String, BoxError> {
///         Ok(store.require::<String>("text")?)
///     }
///
///     async fn exec(&self, _ctx: &RunContext, text: &String) -> Result<String, BoxError> {
///         Ok(text.to_uppercase())
///     }
///
///     async fn post(
///         &self,
///         _ctx: &RunContext,
///         store: &SharedStore,
///         _prep: String,
///         shouted: String,
///     ) -> Result<Action, BoxError> {
///         store.set("shouted", shouted);
///         Ok(Action::Default)
///     }
/// }
/// ```
#[async_trait]
pub trait Node: Send + Sync + 'static {
    /// Value produced by prep and handed to exec (and post).
    type Prep: Send + Sync + 'static;
    /// Value produced by exec (or the fallback) and handed to post.
    type Exec: Send + 'static;

    /// Human-readable name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn prep(&self, ctx: &RunContext, store: &SharedStore) -> Result<Self::Prep, BoxError>;

    /// Must not touch the store.
    async fn exec(&self, ctx: &RunContext, prep: &Self::Prep) -> Result<Self::Exec, BoxError>;

    /// Called once when every exec attempt failed. The default re-raises the
    /// last error, which means "no fallback".
    async fn exec_fallback(
        &self,
        _ctx: &RunContext,
        _prep: &Self::Prep,
        error: BoxError,
    ) -> Result<Self::Exec, BoxError> {
        Err(error)
    }

    /// The default performs no store mutation and continues on the default edge.
    async fn post(
        &self,
        _ctx: &RunContext,
        _store: &SharedStore,
        _prep: Self::Prep,
        _exec: Self::Exec,
    ) -> Result<Action, BoxError> {
        Ok(Action::Default)
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::none()
    }

    /// Every action post may return. Edges are validated against this list when
    /// the flow is built. An empty list accepts any action.
    fn declared_actions(&self) -> Vec<Action> {
        vec![Action::Default]
    }
}
