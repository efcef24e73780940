// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Interactive conversation host.
//!
//! A [`Session`] owns one store for the lifetime of a conversation and runs the
//! configured flow once per question. Reading the terminal and reacting to
//! shutdown signals is left to the binary; everything here works on plain
//! readers and strings so it can be driven from tests.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Arc;

use crate::app::{keys, History};
use crate::engine::{Flow, RunContext};
use crate::errors::SessionError;
use crate::observability::messages::session::{HistoryPersisted, RendererUnavailable, TurnFailed};
use crate::observability::messages::StructuredLog;
use crate::store::SharedStore;
use crate::traits::RecordSink;

/// Line that ends a multi-line question.
pub const END_OF_INPUT: &str = "EOF";

pub const INPUT_HINT: &str =
    "(Enter your text. Type EOF on a new line or press Ctrl+D to finish)";

const CONVERSATION_NAME_LEN: usize = 20;

/// What the user typed at one prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Question(String),
    /// Only whitespace; prompt again.
    Blank,
    /// `quit` or `exit`.
    Quit,
    /// The input stream ended before anything was typed.
    Closed,
}

/// Read one question: lines up to an `EOF` line or the end of the stream.
pub fn read_input<R: BufRead>(reader: &mut R) -> io::Result<Input> {
    let mut lines = Vec::new();
    let mut terminated = false;

    for line in reader.lines() {
        let line = line?;
        if line.trim() == END_OF_INPUT {
            terminated = true;
            break;
        }
        lines.push(line);
    }

    if lines.is_empty() && !terminated {
        return Ok(Input::Closed);
    }

    let text = lines.join("\n").trim().to_string();
    Ok(if text.is_empty() {
        Input::Blank
    } else if text.eq_ignore_ascii_case("quit") || text.eq_ignore_ascii_case("exit") {
        Input::Quit
    } else {
        Input::Question(text)
    })
}

/// File-name-friendly label derived from the first question.
pub fn conversation_name(question: &str) -> String {
    question
        .trim()
        .chars()
        .take(CONVERSATION_NAME_LEN)
        .map(|c| match c {
            ' ' | '/' | '\\' => '_',
            other => other,
        })
        .collect()
}

/// One conversation: a flow, the store it runs against, and where the history
/// goes when the conversation ends.
pub struct Session {
    flow: Flow,
    store: SharedStore,
    sink: Arc<dyn RecordSink>,
    turns: usize,
}

impl Session {
    pub fn new(flow: Flow, sink: Arc<dyn RecordSink>) -> Self {
        Self {
            flow,
            store: SharedStore::new(),
            sink,
            turns: 0,
        }
    }

    /// Attach images to every question of the session.
    pub fn with_images(self, images: Vec<PathBuf>) -> Self {
        if !images.is_empty() {
            self.store.set(keys::IMAGE_PATHS, images);
        }
        self
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn turns(&self) -> usize {
        self.turns
    }

    /// Seed the store for a new question. The previous answer and search
    /// results are dropped so the agent loop searches afresh.
    pub fn prepare_turn(&self, question: &str) {
        self.store.set(keys::QUESTION, question.to_string());
        self.store.remove(keys::ANSWER);
        self.store.remove(keys::SEARCH_RESULTS);
        if !self.store.contains(keys::CONVERSATION_NAME) {
            self.store
                .set(keys::CONVERSATION_NAME, conversation_name(question));
        }
    }

    /// Run the flow for one question under a child of `ctx` and return the
    /// answer it stored.
    ///
    /// A failed turn leaves the history untouched, so the user may ask again.
    /// An answer of the wrong type is reported as [`SessionError::Store`].
    pub async fn ask(&mut self, ctx: &RunContext, question: &str) -> Result<String, SessionError> {
        self.turns += 1;
        self.prepare_turn(question);

        let turn_ctx = ctx.child();
        let outcome = match self.flow.run(&turn_ctx, &self.store).await {
            Ok(report) => self
                .store
                .get::<String>(keys::ANSWER)
                .map(|answer| {
                    answer.unwrap_or_else(|| {
                        format!("(flow '{}' finished without an answer)", report.flow)
                    })
                })
                .map_err(SessionError::from),
            Err(error) => Err(SessionError::from(error)),
        };

        if let Err(error) = &outcome {
            TurnFailed {
                turn: self.turns,
                error,
            }
            .log();
        }
        outcome
    }

    pub fn history(&self) -> Result<History, SessionError> {
        Ok(History::load(&self.store)?)
    }

    /// Write the history through the sink. `Ok(None)` when there is nothing to
    /// save.
    pub fn persist_history(&self) -> Result<Option<PathBuf>, SessionError> {
        let history = self.history()?;
        if history.is_empty() {
            return Ok(None);
        }

        let name = self
            .store
            .get_or(keys::CONVERSATION_NAME, String::new())?;
        let record = serde_json::to_value(&history)?;
        let path = self.sink.persist(&record, &name)?;

        HistoryPersisted {
            path: &path,
            entries: history.len(),
        }
        .log();
        Ok(Some(path))
    }
}

/// Show an answer through `renderer` (markdown highlighting), or as plain text
/// when the renderer cannot be run.
pub fn render_answer(renderer: &str, answer: &str) {
    if let Err(error) = pipe_to_renderer(renderer, answer) {
        RendererUnavailable {
            program: renderer,
            error: &error,
        }
        .log();
        println!("{}", answer);
    }
}

fn pipe_to_renderer(renderer: &str, answer: &str) -> io::Result<()> {
    let mut child = Command::new(renderer)
        .args(["--paging=never", "--style=plain", "--language=markdown"])
        .stdin(Stdio::piped())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(answer.as_bytes())?;
        stdin.write_all(b"\n")?;
    }

    let status = child.wait()?;
    if status.success() {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::Other,
            format!("{} exited with {}", renderer, status),
        ))
    }
}
