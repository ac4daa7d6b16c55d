//! Task lifecycle.
//!
//! ```text
//!   OPEN ──complete──▶ CLOSED ──reopen──▶ OPEN
//!    │                   ▲
//!   push               complete
//!    ▼                   │
//!  PUSHED ──push──▶ PUSHED
//! ```
//!
//! CLOSED is never pushed. There is no terminal state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, TransitionError};

/// Completion state of a task.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    /// Newly created, not yet acted on.
    Open,
    /// Rolled forward from an earlier day while still incomplete.
    Pushed,
    /// Done.
    Closed,
}

/// A status change requested by the user or the migration service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// User marks the task done.
    Complete,
    /// User undoes a completion.
    Reopen,
    /// Migration carries the task forward to today.
    Push,
}

impl TaskStatus {
    /// Wire name, as persisted.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Open => "OPEN",
            TaskStatus::Pushed => "PUSHED",
            TaskStatus::Closed => "CLOSED",
        }
    }

    /// Bullet-journal glyph.
    pub fn glyph(&self) -> &'static str {
        match self {
            TaskStatus::Open => "·",
            TaskStatus::Pushed => "→",
            TaskStatus::Closed => "×",
        }
    }

    /// OPEN and PUSHED tasks still need attention.
    pub fn is_incomplete(&self) -> bool {
        !matches!(self, TaskStatus::Closed)
    }

    /// Applies an action, rejecting every edge not in the lifecycle.
    pub fn transition(self, action: Action) -> Result<TaskStatus, TransitionError> {
        let next = match (self, action) {
            (TaskStatus::Open | TaskStatus::Pushed, Action::Complete) => TaskStatus::Closed,
            (TaskStatus::Closed, Action::Reopen) => TaskStatus::Open,
            (TaskStatus::Open | TaskStatus::Pushed, Action::Push) => TaskStatus::Pushed,
            (from, action) => {
                return Err(TransitionError::Invalid {
                    from,
                    to: action.target(),
                })
            }
        };
        Ok(next)
    }

    /// The single tap affordance: done if incomplete, reopened if done.
    pub fn toggle(self) -> TaskStatus {
        match self {
            TaskStatus::Open | TaskStatus::Pushed => TaskStatus::Closed,
            TaskStatus::Closed => TaskStatus::Open,
        }
    }

    /// Whether a stored status may be overwritten with `next`.
    ///
    /// Leaving the status unchanged is always allowed.
    pub fn can_become(self, next: TaskStatus) -> bool {
        self == next
            || matches!(
                (self, next),
                (TaskStatus::Open | TaskStatus::Pushed, TaskStatus::Closed)
                    | (TaskStatus::Closed, TaskStatus::Open)
                    | (TaskStatus::Open, TaskStatus::Pushed)
            )
    }
}

impl Action {
    fn target(self) -> TaskStatus {
        match self {
            Action::Complete => TaskStatus::Closed,
            Action::Reopen => TaskStatus::Open,
            Action::Push => TaskStatus::Pushed,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(TaskStatus::Open),
            "PUSHED" => Ok(TaskStatus::Pushed),
            "CLOSED" => Ok(TaskStatus::Closed),
            other => Err(StoreError::UnknownStatus(other.to_string())),
        }
    }
}
