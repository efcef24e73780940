// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Concurrency-safe key/value store shared by every node of a flow run.
//!
//! Values are opaque to the store: any `'static + Send + Sync` type can be set
//! under a string key. Readers recover the concrete type through the fallible
//! typed accessors ([`SharedStore::get`] and [`SharedStore::require`]), which
//! report a [`StoreError::TypeMismatch`] instead of panicking when a key holds
//! something else.
//!
//! Each read and write takes the internal lock once, so a reader never observes
//! a partially written value. There is no multi-key atomicity: a node reads the
//! keys it needs in prep and writes the keys it owns in post.
//!
//! # Example
//! ```
//! use nodeflow::store::SharedStore;
//!
//! let store = SharedStore::new();
//! store.set("question", "What is the capital of France?".to_string());
//!
//! let question: String = store.require("question").unwrap();
//! assert_eq!(question, "What is the capital of France?");
//! assert!(store.get::<String>("answer").unwrap().is_none());
//! ```

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::errors::StoreError;

/// A value held by the store.
pub type StoreValue = Arc<dyn Any + Send + Sync>;

/// Cheaply clonable handle to one store instance.
///
/// Clones share the same underlying map, which is how the store is handed to
/// concurrent batch tasks or retained by a host across conversation turns.
#[derive(Clone, Default)]
pub struct SharedStore {
    inner: Arc<RwLock<HashMap<String, StoreValue>>>,
}

impl SharedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the value under `key`.
    pub fn set<T>(&self, key: impl Into<String>, value: T)
    where
        T: Any + Send + Sync,
    {
        self.write().insert(key.into(), Arc::new(value));
    }

    /// Untyped lookup: the raw value if the key is present.
    pub fn get_raw(&self, key: &str) -> Option<StoreValue> {
        self.read().get(key).cloned()
    }

    /// Typed lookup. `Ok(None)` when absent, `TypeMismatch` when the key holds
    /// a value of another type.
    pub fn get<T>(&self, key: &str) -> Result<Option<T>, StoreError>
    where
        T: Any + Clone + Send + Sync,
    {
        match self.get_raw(key) {
            None => Ok(None),
            Some(value) => value
                .downcast_ref::<T>()
                .cloned()
                .map(Some)
                .ok_or_else(|| StoreError::TypeMismatch {
                    key: key.to_string(),
                    expected: type_name::<T>(),
                }),
        }
    }

    /// Typed lookup that treats absence as an error.
    pub fn require<T>(&self, key: &str) -> Result<T, StoreError>
    where
        T: Any + Clone + Send + Sync,
    {
        self.get(key)?.ok_or_else(|| StoreError::MissingKey {
            key: key.to_string(),
        })
    }

    /// Typed lookup that substitutes a default for an absent key.
    pub fn get_or<T>(&self, key: &str, default: T) -> Result<T, StoreError>
    where
        T: Any + Clone + Send + Sync,
    {
        Ok(self.get(key)?.unwrap_or(default))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    /// Remove a key, returning its previous value.
    pub fn remove(&self, key: &str) -> Option<StoreValue> {
        self.write().remove(key)
    }

    /// All keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // Every write is a single insert/remove, so a poisoned lock still guards a
    // consistent map.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, StoreValue>> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, StoreValue>> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl fmt::Debug for SharedStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedStore")
            .field("keys", &self.keys())
            .finish()
    }
}
