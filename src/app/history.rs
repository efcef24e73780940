// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

use crate::app::keys;
use crate::errors::StoreError;
use crate::store::SharedStore;

/// One question and the answer it got.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Conversation {
    pub user: String,
    pub ai: String,
}

/// Every exchange of a session, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct History {
    pub conversations: Vec<Conversation>,
}

impl History {
    /// The history held by the store, or an empty one.
    pub fn load(store: &SharedStore) -> Result<Self, StoreError> {
        store.get_or(keys::HISTORY, History::default())
    }

    pub fn save(&self, store: &SharedStore) {
        store.set(keys::HISTORY, self.clone());
    }

    pub fn push(&mut self, user: impl Into<String>, ai: impl Into<String>) {
        self.conversations.push(Conversation {
            user: user.into(),
            ai: ai.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    /// Numbered transcript for inclusion in a prompt.
    pub fn render(&self) -> String {
        self.conversations
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{}. User: {}\n   AI: {}\n", i + 1, c.user, c.ai))
            .collect()
    }
}
