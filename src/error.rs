//! Error types for the nib core.

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::status::TaskStatus;

/// Errors raised by a task or rule store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying SQLite failure.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Filesystem error while preparing the database location.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A task for this rule already exists on this date.
    #[error("a task for rule {rule_id} already exists on {date}")]
    Duplicate { date: NaiveDate, rule_id: i64 },

    /// No record with this id.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },

    /// A stored date is not a `yyyy-MM-dd` string.
    #[error("malformed date '{0}', expected yyyy-MM-dd")]
    MalformedDate(String),

    /// A stored status name is not OPEN, PUSHED or CLOSED.
    #[error("unknown task status '{0}'")]
    UnknownStatus(String),

    /// A stored bullet type is not TASK, NOTE or EVENT.
    #[error("unknown bullet type '{0}'")]
    UnknownBulletType(String),

    /// A stored frequency is not DAILY, WEEKLY or MONTHLY.
    #[error("unknown frequency '{0}'")]
    UnknownFrequency(String),

    /// An update tried to move a task along an edge the state machine forbids.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("lock poisoned: {0}")]
    Lock(String),
}

/// Rejected status change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("cannot move a task from {from} to {to}")]
    Invalid { from: TaskStatus, to: TaskStatus },

    /// Notes and events carry no completion state.
    #[error("entry {0} is not a task and cannot change status")]
    NotActionable(i64),
}

/// Invalid recurrence rule parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("day of month must be between 1 and 31, got {0}")]
    DayOfMonth(i64),

    #[error("weekday must be between 1 (Monday) and 7 (Sunday), got {0}")]
    Weekday(i64),

    #[error("monthly ordinal must be 1, 2, 3, 4 or -1 (last), got {0}")]
    Ordinal(i64),

    #[error("unrecognized weekday '{0}'")]
    WeekdayName(String),

    #[error("unrecognized ordinal '{0}'")]
    OrdinalName(String),

    /// The flat rule columns do not describe exactly one scheduling mode.
    #[error("rule fields do not describe a single {0} schedule")]
    Mixed(&'static str),
}

/// Configuration file problems.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Top-level error type for the crate.
#[derive(Debug, thiserror::Error)]
pub enum NibError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("transition error: {0}")]
    Transition(#[from] TransitionError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Bad user input, e.g. an unparseable date on the command line.
    #[error("invalid input: {0}")]
    Input(String),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, NibError>;
