//! Error types for the core library

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Transient failure reading or writing the preference store.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored data could not be parsed at all.
    #[error("Corrupted preferences: {0}")]
    Corruption(String),

    /// A stored value is well-formed but not one this crate recognizes.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Whether this error is a transient I/O failure that readers may
    /// recover from by falling back to defaults.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
