//! Task module
//!
//! Tasks shown in the list and the filtering/sorting applied to them.

mod filter;
mod model;

pub use filter::filter_sort_tasks;
pub use model::*;
