//! Preferences module
//!
//! The user's task list preferences and the repository that persists them.

mod model;
mod repository;

pub use model::*;
pub use repository::{UserPreferencesRepository, SHOW_COMPLETED, SORT_ORDER};
