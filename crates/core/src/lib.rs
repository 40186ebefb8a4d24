//! Core library for the todo task list
//!
//! This crate contains the user preference layer, including:
//! - A key-value preference store abstraction with in-memory and file backends
//! - The user preferences repository (show completed, sort order)
//! - Task filtering and sorting driven by those preferences

pub mod config;
pub mod error;
pub mod preferences;
pub mod store;
pub mod task;

pub use config::StoreConfig;
pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
