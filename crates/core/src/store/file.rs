//! File-based preference store
//!
//! Stores the snapshot as a flat JSON object on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::sync::{watch, Mutex};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info};

use super::{Mutator, PreferenceStore, Preferences};
use crate::config::StoreConfig;
use crate::{Error, Result};

/// File-backed preference store using JSON
pub struct FilePreferenceStore {
    /// Path to the JSON file
    path: Arc<PathBuf>,
    /// Bumped after every committed write
    version: watch::Sender<u64>,
    /// Serializes transactions
    write_lock: Mutex<()>,
}

impl FilePreferenceStore {
    /// Create a new FilePreferenceStore
    ///
    /// The file is read once to validate it. If it doesn't exist, it will
    /// be created on first write.
    pub async fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let initial = load(&path).await?;
        info!(
            "Opened preference store at {} ({} entries)",
            path.display(),
            initial.len()
        );

        let (version, _) = watch::channel(0);
        Ok(Self {
            path: Arc::new(path),
            version,
            write_lock: Mutex::new(()),
        })
    }

    /// Open the store at the location described by `config`
    pub async fn open(config: &StoreConfig) -> Result<Self> {
        Self::new(config.path()).await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist a snapshot to disk
    async fn persist(&self, prefs: &Preferences) -> Result<()> {
        let content = serde_json::to_string_pretty(prefs)?;

        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, content).await?;
        if let Err(err) = tokio::fs::rename(&tmp_path, self.path.as_path()).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(err.into());
        }
        Ok(())
    }
}

/// Read a snapshot from disk. A missing or blank file is an empty snapshot.
async fn load(path: &Path) -> Result<Preferences> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Preferences::default()),
        Err(e) => return Err(e.into()),
    };

    if content.trim().is_empty() {
        return Ok(Preferences::default());
    }

    serde_json::from_str(&content).map_err(|e| {
        Error::Corruption(format!(
            "Failed to parse preferences file {}: {}",
            path.display(),
            e
        ))
    })
}

#[async_trait]
impl PreferenceStore for FilePreferenceStore {
    fn data(&self) -> BoxStream<'static, Result<Preferences>> {
        let path = Arc::clone(&self.path);
        WatchStream::new(self.version.subscribe())
            .then(move |version| {
                let path = Arc::clone(&path);
                async move {
                    debug!("Loading preferences (version {})", version);
                    load(&path).await
                }
            })
            .boxed()
    }

    async fn read(&self) -> Result<Preferences> {
        load(&self.path).await
    }

    async fn update(&self, mutator: Mutator) -> Result<Preferences> {
        let _guard = self.write_lock.lock().await;

        let current = load(&self.path).await?;
        let mut next = current.clone();
        mutator(&mut next)?;

        if next != current {
            self.persist(&next).await?;
            self.version.send_modify(|version| *version += 1);
            debug!(
                "Committed preferences to {} ({} entries)",
                self.path.display(),
                next.len()
            );
        }
        Ok(next)
    }
}
