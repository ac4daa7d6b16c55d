//! # nib
//!
//! A bullet-journal task tracker: daily entries, longer-term aspirations,
//! and recurrence rules that generate tasks on a schedule.
//!
//! ## Core
//!
//! *   **Recurrence** ([`recurrence`]): decides whether a rule fires on a date.
//!     Daily, weekly on an ISO weekday, monthly on a day (days 29-31 skip
//!     short months), or monthly on the Nth / last weekday.
//! *   **Descriptions** ([`describe`]): "Monthly on the last Friday".
//! *   **Lifecycle** ([`status`]): OPEN, PUSHED, CLOSED. Completion can be undone.
//! *   **Day rollover** ([`migration`]): unfinished tasks from earlier days are
//!     pushed to today, then each active rule that fires today gets exactly
//!     one task. Both passes are idempotent and safe under concurrent callers.
//!
//! ## Data Storage
//!
//! Everything lives in one SQLite file:
//! *   Linux: `~/.local/share/nib/nib.db`
//! *   macOS: `~/Library/Application Support/nib/nib.db`
//! *   Windows: `%LOCALAPPDATA%\nib\nib.db`
//!
//! Override with the `NIB_DB` environment variable or the `database` key in
//! `config.toml`. Dates are stored as `yyyy-MM-dd`.

pub mod calendar;
pub mod commands;
pub mod config;
pub mod dates;
pub mod describe;
pub mod error;
pub mod migration;
pub mod models;
pub mod recurrence;
pub mod schema;
pub mod status;
pub mod storage;

pub use error::{NibError, Result};
