//! Applies user preferences to a task list

use std::cmp::Ordering;

use crate::preferences::UserPreferences;

use super::model::Task;

/// Hide completed tasks unless requested, then sort by the chosen order.
///
/// Sorting is stable; higher priority comes first and earlier deadlines
/// come first.
pub fn filter_sort_tasks(tasks: &[Task], prefs: &UserPreferences) -> Vec<Task> {
    let mut visible: Vec<Task> = tasks
        .iter()
        .filter(|t| prefs.show_completed || !t.completed)
        .cloned()
        .collect();

    let flags = prefs.sort_flags();
    if flags.by_deadline || flags.by_priority {
        visible.sort_by(|a, b| {
            let by_deadline = if flags.by_deadline {
                a.deadline.cmp(&b.deadline)
            } else {
                Ordering::Equal
            };
            by_deadline.then_with(|| {
                if flags.by_priority {
                    b.priority.cmp(&a.priority)
                } else {
                    Ordering::Equal
                }
            })
        });
    }

    visible
}
