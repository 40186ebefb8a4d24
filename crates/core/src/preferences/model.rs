//! User preference model definitions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Sort order of the task list as persisted.
///
/// Multiplexes the two independent sort criteria onto one stored value.
/// Code that changes a single criterion should go through [`SortFlags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "&'static str", try_from = "String")]
pub enum SortOrder {
    #[default]
    None,
    ByDeadline,
    ByPriority,
    ByDeadlineAndPriority,
}

impl SortOrder {
    pub const ALL: [SortOrder; 4] = [
        SortOrder::None,
        SortOrder::ByDeadline,
        SortOrder::ByPriority,
        SortOrder::ByDeadlineAndPriority,
    ];

    /// Stored name of this order
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::ByDeadline => "BY_DEADLINE",
            Self::ByPriority => "BY_PRIORITY",
            Self::ByDeadlineAndPriority => "BY_DEADLINE_AND_PRIORITY",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SortOrder {
    type Err = Error;

    /// Names must match exactly; anything else is treated as corrupted state.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|order| order.name() == s)
            .ok_or_else(|| Error::InvalidState(format!("Unknown sort order: {:?}", s)))
    }
}

impl From<SortOrder> for &'static str {
    fn from(order: SortOrder) -> Self {
        order.name()
    }
}

impl TryFrom<String> for SortOrder {
    type Error = Error;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}

/// The two sort criteria as independent switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortFlags {
    pub by_deadline: bool,
    pub by_priority: bool,
}

impl From<SortOrder> for SortFlags {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::None => Self {
                by_deadline: false,
                by_priority: false,
            },
            SortOrder::ByDeadline => Self {
                by_deadline: true,
                by_priority: false,
            },
            SortOrder::ByPriority => Self {
                by_deadline: false,
                by_priority: true,
            },
            SortOrder::ByDeadlineAndPriority => Self {
                by_deadline: true,
                by_priority: true,
            },
        }
    }
}

impl From<SortFlags> for SortOrder {
    fn from(flags: SortFlags) -> Self {
        match (flags.by_deadline, flags.by_priority) {
            (false, false) => Self::None,
            (true, false) => Self::ByDeadline,
            (false, true) => Self::ByPriority,
            (true, true) => Self::ByDeadlineAndPriority,
        }
    }
}

/// Snapshot of the user's task list preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub show_completed: bool,
    pub sort_order: SortOrder,
}

impl UserPreferences {
    pub fn new(show_completed: bool, sort_order: SortOrder) -> Self {
        Self {
            show_completed,
            sort_order,
        }
    }

    pub fn sort_flags(&self) -> SortFlags {
        SortFlags::from(self.sort_order)
    }
}
