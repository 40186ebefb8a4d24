//! Task model definitions

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Task priority level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

/// A task in the list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub name: String,
    pub deadline: NaiveDate,
    pub priority: TaskPriority,
    pub completed: bool,
}

impl Task {
    /// Create a new open task due on `deadline`
    pub fn new(name: impl Into<String>, deadline: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            deadline,
            priority: TaskPriority::default(),
            completed: false,
        }
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Mark the task as completed
    pub fn completed(mut self) -> Self {
        self.completed = true;
        self
    }
}
