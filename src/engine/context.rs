// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Cancellation and deadline context threaded through every phase call.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a guarded future was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Interrupted {
    #[error("run was cancelled")]
    Cancelled,
    #[error("run deadline exceeded")]
    DeadlineExceeded,
}

/// Per-run cancellation signal plus an optional deadline.
///
/// Cloning shares the same token. [`RunContext::child`] derives a context whose
/// token is cancelled with its parent but can also be cancelled on its own, which
/// is how a host gives each conversation turn its own scope under one
/// process-wide shutdown signal.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe an existing token, e.g. one cancelled by a signal handler.
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Bound the run by `timeout` from now. An earlier existing deadline wins.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// `configured`, shortened to the time left when the deadline is nearer.
    pub fn bound_timeout(&self, configured: Duration) -> Duration {
        match self.remaining() {
            Some(remaining) => configured.min(remaining),
            None => configured,
        }
    }

    /// Fail immediately if the run was cancelled or its deadline has passed.
    pub fn check(&self) -> Result<(), Interrupted> {
        if self.token.is_cancelled() {
            return Err(Interrupted::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Interrupted::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Run `fut` unless cancellation or the deadline comes first.
    pub async fn guard<F>(&self, fut: F) -> Result<F::Output, Interrupted>
    where
        F: Future,
    {
        self.check()?;

        let deadline = self.deadline;
        let expired = async move {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(Interrupted::Cancelled),
            _ = expired => Err(Interrupted::DeadlineExceeded),
            output = fut => Ok(output),
        }
    }

    /// Cancellation-aware sleep, used between retry attempts.
    pub async fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
        self.guard(tokio::time::sleep(duration)).await
    }
}
