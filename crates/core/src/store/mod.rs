//! Preference store module
//!
//! A durable key-value store holding flat preference entries. Stores push a
//! fresh snapshot to every subscriber whenever a transaction commits.

mod file;
mod memory;

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub use file::FilePreferenceStore;
pub use memory::InMemoryPreferenceStore;

/// A single stored value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PreferenceValue {
    Bool(bool),
    Str(String),
}

/// Rust types that can be stored as a preference value
pub trait PreferenceType: Sized {
    fn into_value(self) -> PreferenceValue;
    fn from_value(value: &PreferenceValue) -> Option<Self>;
}

impl PreferenceType for bool {
    fn into_value(self) -> PreferenceValue {
        PreferenceValue::Bool(self)
    }

    fn from_value(value: &PreferenceValue) -> Option<Self> {
        match value {
            PreferenceValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl PreferenceType for String {
    fn into_value(self) -> PreferenceValue {
        PreferenceValue::Str(self)
    }

    fn from_value(value: &PreferenceValue) -> Option<Self> {
        match value {
            PreferenceValue::Str(s) => Some(s.clone()),
            _ => None,
        }
    }
}

/// Typed name of a preference entry
pub struct PreferenceKey<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> PreferenceKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> fmt::Debug for PreferenceKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PreferenceKey").field(&self.name).finish()
    }
}

/// A point-in-time view of every stored entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Preferences {
    entries: BTreeMap<String, PreferenceValue>,
}

impl Preferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read an entry. Returns `None` if it is absent or holds another type.
    pub fn get<T: PreferenceType>(&self, key: &PreferenceKey<T>) -> Option<T> {
        self.entries.get(key.name).and_then(T::from_value)
    }

    pub fn set<T: PreferenceType>(&mut self, key: &PreferenceKey<T>, value: T) {
        self.entries.insert(key.name.to_string(), value.into_value());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Edit applied inside a store transaction
pub type Mutator = Box<dyn FnOnce(&mut Preferences) -> Result<()> + Send>;

/// Durable key-value preference store
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Subscribe to snapshots.
    ///
    /// The stream yields the current snapshot, then one snapshot per
    /// committed change. Every call returns an independent subscription.
    /// An individual emission may fail without ending the stream.
    fn data(&self) -> BoxStream<'static, Result<Preferences>>;

    /// Read the current snapshot once
    async fn read(&self) -> Result<Preferences> {
        self.data()
            .next()
            .await
            .unwrap_or_else(|| Err(Error::Storage("Preference store closed".to_string())))
    }

    /// Atomically apply `mutator` to the latest snapshot and commit it.
    ///
    /// Transactions are serialized. If the mutator fails nothing is
    /// written and its error is returned.
    async fn update(&self, mutator: Mutator) -> Result<Preferences>;
}
