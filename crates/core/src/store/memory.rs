//! In-memory preference store
//!
//! Keeps the snapshot in a watch channel. Nothing survives the process.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::sync::{watch, Mutex};
use tokio_stream::wrappers::WatchStream;
use tracing::debug;

use super::{Mutator, PreferenceStore, Preferences};
use crate::Result;

/// Volatile preference store, useful for tests and previews
pub struct InMemoryPreferenceStore {
    state: watch::Sender<Preferences>,
    /// Serializes transactions
    write_lock: Mutex<()>,
}

impl Default for InMemoryPreferenceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPreferenceStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::with_preferences(Preferences::default())
    }

    /// Create a store seeded with `initial`
    pub fn with_preferences(initial: Preferences) -> Self {
        let (state, _) = watch::channel(initial);
        Self {
            state,
            write_lock: Mutex::new(()),
        }
    }

    /// Current snapshot without subscribing
    pub fn snapshot(&self) -> Preferences {
        self.state.borrow().clone()
    }
}

#[async_trait]
impl PreferenceStore for InMemoryPreferenceStore {
    fn data(&self) -> BoxStream<'static, Result<Preferences>> {
        WatchStream::new(self.state.subscribe()).map(Ok).boxed()
    }

    async fn read(&self) -> Result<Preferences> {
        Ok(self.snapshot())
    }

    async fn update(&self, mutator: Mutator) -> Result<Preferences> {
        let _guard = self.write_lock.lock().await;

        let current = self.snapshot();
        let mut next = current.clone();
        mutator(&mut next)?;

        if next != current {
            self.state.send_replace(next.clone());
            debug!("Committed preferences ({} entries)", next.len());
        }
        Ok(next)
    }
}
