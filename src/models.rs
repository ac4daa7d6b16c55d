//! Journal records: tasks, recurrence rules and aspirations.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, TransitionError};
use crate::recurrence::Schedule;
use crate::status::{Action, TaskStatus};

/// Kind of journal entry. Only `Task` entries move through the status lifecycle.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum BulletType {
    Task,
    Note,
    Event,
}

impl BulletType {
    /// Wire name, as persisted.
    pub fn as_str(&self) -> &'static str {
        match self {
            BulletType::Task => "TASK",
            BulletType::Note => "NOTE",
            BulletType::Event => "EVENT",
        }
    }
}

impl fmt::Display for BulletType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BulletType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TASK" => Ok(BulletType::Task),
            "NOTE" => Ok(BulletType::Note),
            "EVENT" => Ok(BulletType::Event),
            other => Err(StoreError::UnknownBulletType(other.to_string())),
        }
    }
}

/// Represents a single entry on a calendar day.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Task {
    /// Unique identifier, stable for the task's lifetime.
    pub id: i64,
    /// Free-text description.
    pub content: String,
    pub bullet_type: BulletType,
    pub status: TaskStatus,
    /// The day the task is scheduled for.
    pub date: NaiveDate,
    /// Creation time; only used to order tasks within a day.
    pub created_at: DateTime<Utc>,
    /// Rule that generated this task, if any. Non-owning.
    pub recurring_task_id: Option<i64>,
}

impl Task {
    /// Applies a user action to this task's status.
    ///
    /// Notes and events have no completion state and reject every action.
    pub fn apply(&mut self, action: Action) -> Result<TaskStatus, TransitionError> {
        self.ensure_actionable()?;
        self.status = self.status.transition(action)?;
        Ok(self.status)
    }

    /// Done if incomplete, reopened if done.
    pub fn toggle(&mut self) -> Result<TaskStatus, TransitionError> {
        self.ensure_actionable()?;
        self.status = self.status.toggle();
        Ok(self.status)
    }

    fn ensure_actionable(&self) -> Result<(), TransitionError> {
        if self.bullet_type == BulletType::Task {
            Ok(())
        } else {
            Err(TransitionError::NotActionable(self.id))
        }
    }
}

/// Data for a task that has not been stored yet. Stored tasks always start OPEN.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub content: String,
    pub bullet_type: BulletType,
    pub date: NaiveDate,
    pub recurring_task_id: Option<i64>,
}

impl NewTask {
    /// A manually entered entry.
    pub fn new(content: impl Into<String>, bullet_type: BulletType, date: NaiveDate) -> Self {
        Self {
            content: content.into(),
            bullet_type,
            date,
            recurring_task_id: None,
        }
    }

    /// The instance of `rule` for `date`.
    pub fn generated(rule: &RecurringTask, date: NaiveDate) -> Self {
        Self {
            content: rule.title.clone(),
            bullet_type: BulletType::Task,
            date,
            recurring_task_id: Some(rule.id),
        }
    }
}

/// Fields to change on a stored task. `None` leaves the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskEdit {
    pub content: Option<String>,
    pub date: Option<NaiveDate>,
}

/// A rule describing when to auto-generate tasks.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RecurringTask {
    pub id: i64,
    /// Copied verbatim into generated task content.
    pub title: String,
    /// `None` when the stored fields do not form a valid schedule. Such a rule never fires.
    pub schedule: Option<Schedule>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Data for a rule that has not been stored yet. New rules are active.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRule {
    pub title: String,
    pub schedule: Schedule,
}

/// A longer-term goal. Has no lifecycle interaction with tasks.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Aspiration {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub note: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAspiration {
    pub title: String,
    pub note: String,
}
