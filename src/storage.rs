//! Persistent storage for tasks, rules and aspirations.
//!
//! The core talks to storage through [`TaskStore`], [`RuleStore`] and
//! [`AspirationStore`]. [`SqliteStore`] implements all three on a single
//! SQLite file.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, TransactionBehavior};

use crate::dates::{format_date, parse_date};
use crate::error::{StoreError, TransitionError};
use crate::models::{Aspiration, BulletType, NewAspiration, NewRule, NewTask, RecurringTask, Task, TaskEdit};
use crate::recurrence::{Frequency, Schedule, ScheduleColumns};
use crate::schema::apply_schema;
use crate::status::TaskStatus;

/// How long a writer waits for another connection's lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Task queries and updates the core relies on.
pub trait TaskStore {
    /// Loads a single task by its ID.
    fn load_task(&self, id: i64) -> Result<Option<Task>, StoreError>;

    /// All tasks, newest day first, creation order within a day.
    fn load_tasks(&self) -> Result<Vec<Task>, StoreError>;

    /// Tasks with `from <= date <= to`, by date then creation.
    fn load_tasks_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Task>, StoreError>;

    fn load_tasks_on(&self, date: NaiveDate) -> Result<Vec<Task>, StoreError> {
        self.load_tasks_between(date, date)
    }

    /// Tasks strictly after `date` (the future log).
    fn load_tasks_after(&self, date: NaiveDate) -> Result<Vec<Task>, StoreError>;

    /// The instance of a rule on a given day, if one exists.
    fn find_generated_task(&self, date: NaiveDate, rule_id: i64) -> Result<Option<Task>, StoreError>;

    /// Stores a new task in the OPEN state.
    ///
    /// Fails with [`StoreError::Duplicate`] if the rule already has a task that day.
    fn insert_task(&self, task: &NewTask) -> Result<Task, StoreError>;

    /// Changes only the status of a task, checked against the stored status.
    ///
    /// Returns the task as stored after the change.
    fn set_status(&self, id: i64, next: TaskStatus) -> Result<Task, StoreError>;

    /// Changes only the fields set in `edit`. Status and other fields keep
    /// their stored values.
    fn edit_task(&self, id: i64, edit: &TaskEdit) -> Result<Task, StoreError>;

    fn delete_task(&self, id: i64) -> Result<(), StoreError>;

    /// Moves every OPEN or PUSHED task dated before `today` onto `today` as
    /// PUSHED, atomically. Returns how many tasks moved.
    fn push_incomplete_tasks(&self, today: NaiveDate) -> Result<usize, StoreError>;
}

/// Recurrence rule persistence.
pub trait RuleStore {
    /// All rules in creation order.
    fn load_rules(&self) -> Result<Vec<RecurringTask>, StoreError>;

    fn load_active_rules(&self) -> Result<Vec<RecurringTask>, StoreError>;

    fn load_rule(&self, id: i64) -> Result<Option<RecurringTask>, StoreError>;

    fn insert_rule(&self, rule: &NewRule) -> Result<RecurringTask, StoreError>;

    /// Overwrites title, schedule and active flag.
    fn update_rule(&self, rule: &RecurringTask) -> Result<(), StoreError>;

    /// Deletes the rule. Tasks it generated are kept.
    fn delete_rule(&self, id: i64) -> Result<(), StoreError>;
}

pub trait AspirationStore {
    /// All aspirations in creation order.
    fn load_aspirations(&self) -> Result<Vec<Aspiration>, StoreError>;

    fn insert_aspiration(&self, aspiration: &NewAspiration) -> Result<Aspiration, StoreError>;

    fn delete_aspiration(&self, id: i64) -> Result<(), StoreError>;
}

/// SQLite-backed store.
///
/// Thread-safe via an internal `Mutex<Connection>`. Separate handles or
/// processes on the same file are serialized by SQLite's own locking.
pub struct SqliteStore {
    path: Option<PathBuf>,
    conn: Mutex<Connection>,
}

const TASK_COLUMNS: &str =
    "id, content, bullet_type, status, date, created_at, recurring_task_id";

const RULE_COLUMNS: &str = "id, title, frequency, day_of_week, day_of_month, \
     monthly_ordinal, monthly_week_day, is_active, created_at";

impl SqliteStore {
    /// Opens (or creates) the database file at `path`, creating parent
    /// directories and bringing the schema up to date.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::init(conn, Some(path.to_path_buf()))
    }

    /// A private database that lives as long as this handle.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(mut conn: Connection, path: Option<PathBuf>) -> Result<Self, StoreError> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let version = apply_schema(&mut conn)?;
        tracing::debug!(?path, version, "opened task database");
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Database file location, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Deletes every task, rule and aspiration.
    pub fn clear(&self) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute_batch(
            "DELETE FROM tasks; DELETE FROM recurring_tasks; DELETE FROM aspirations;",
        )?;
        tx.commit()?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Lock(e.to_string()))
    }

    fn query_tasks(&self, sql: &str, args: impl rusqlite::Params) -> Result<Vec<Task>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(args, TaskRow::read)?;
        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?.into_task()?);
        }
        Ok(tasks)
    }

    fn query_rules(&self, sql: &str, args: impl rusqlite::Params) -> Result<Vec<RecurringTask>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(args, RuleRow::read)?;
        let mut rules = Vec::new();
        for row in rows {
            rules.push(row?.into_rule()?);
        }
        Ok(rules)
    }
}

impl TaskStore for SqliteStore {
    fn load_task(&self, id: i64) -> Result<Option<Task>, StoreError> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1");
        Ok(self.query_tasks(&sql, params![id])?.into_iter().next())
    }

    fn load_tasks(&self) -> Result<Vec<Task>, StoreError> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY date DESC, created_at ASC, id ASC");
        self.query_tasks(&sql, [])
    }

    fn load_tasks_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Task>, StoreError> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE date >= ?1 AND date <= ?2 \
             ORDER BY date ASC, created_at ASC, id ASC"
        );
        self.query_tasks(&sql, params![format_date(from), format_date(to)])
    }

    fn load_tasks_after(&self, date: NaiveDate) -> Result<Vec<Task>, StoreError> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE date > ?1 ORDER BY date ASC, created_at ASC, id ASC"
        );
        self.query_tasks(&sql, params![format_date(date)])
    }

    fn find_generated_task(&self, date: NaiveDate, rule_id: i64) -> Result<Option<Task>, StoreError> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE date = ?1 AND recurring_task_id = ?2 LIMIT 1"
        );
        Ok(self
            .query_tasks(&sql, params![format_date(date), rule_id])?
            .into_iter()
            .next())
    }

    fn insert_task(&self, task: &NewTask) -> Result<Task, StoreError> {
        let conn = self.lock()?;
        let created_at = Utc::now();
        let status = TaskStatus::Open;
        let inserted = conn.execute(
            "INSERT INTO tasks (content, bullet_type, status, date, created_at, recurring_task_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                task.content,
                task.bullet_type.as_str(),
                status.as_str(),
                format_date(task.date),
                format_timestamp(created_at),
                task.recurring_task_id
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(StoreError::Duplicate {
                    date: task.date,
                    rule_id: task.recurring_task_id.unwrap_or_default(),
                })
            }
            Err(e) => return Err(e.into()),
        }
        Ok(Task {
            id: conn.last_insert_rowid(),
            content: task.content.clone(),
            bullet_type: task.bullet_type,
            status,
            date: task.date,
            created_at,
            recurring_task_id: task.recurring_task_id,
        })
    }

    fn set_status(&self, id: i64, next: TaskStatus) -> Result<Task, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut task = load_task_in(&tx, id)?;
        if task.status != next {
            if task.bullet_type != BulletType::Task {
                return Err(TransitionError::NotActionable(id).into());
            }
            if !task.status.can_become(next) {
                return Err(TransitionError::Invalid {
                    from: task.status,
                    to: next,
                }
                .into());
            }
            tx.execute(
                "UPDATE tasks SET status = ?1 WHERE id = ?2",
                params![next.as_str(), id],
            )?;
            task.status = next;
        }
        tx.commit()?;
        Ok(task)
    }

    fn edit_task(&self, id: i64, edit: &TaskEdit) -> Result<Task, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut task = load_task_in(&tx, id)?;
        if let Some(content) = &edit.content {
            task.content = content.clone();
        }
        if let Some(date) = edit.date {
            task.date = date;
        }
        let updated = tx.execute(
            "UPDATE tasks SET content = ?1, date = ?2 WHERE id = ?3",
            params![task.content, format_date(task.date), id],
        );
        match updated {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(StoreError::Duplicate {
                    date: task.date,
                    rule_id: task.recurring_task_id.unwrap_or_default(),
                })
            }
            Err(e) => return Err(e.into()),
        }
        tx.commit()?;
        Ok(task)
    }

    fn delete_task(&self, id: i64) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let rows = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(StoreError::NotFound { kind: "task", id });
        }
        Ok(())
    }

    fn push_incomplete_tasks(&self, today: NaiveDate) -> Result<usize, StoreError> {
        let today = format_date(today);
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        // A rule keeps at most one task per day. A stale instance that would
        // land on an occupied slot, or that is not the newest stale instance
        // of its rule, moves as a plain task.
        let detached = tx.execute(
            "UPDATE tasks SET recurring_task_id = NULL \
             WHERE status IN ('OPEN', 'PUSHED') AND date < ?1 AND recurring_task_id IS NOT NULL \
               AND (EXISTS (SELECT 1 FROM tasks t \
                            WHERE t.date = ?1 AND t.recurring_task_id = tasks.recurring_task_id) \
                    OR id <> (SELECT MAX(s.id) FROM tasks s \
                              WHERE s.recurring_task_id = tasks.recurring_task_id \
                                AND s.status IN ('OPEN', 'PUSHED') AND s.date < ?1))",
            params![today],
        )?;
        if detached > 0 {
            tracing::warn!(detached, "detached stale rule instances that collide on {today}");
        }

        let moved = tx.execute(
            "UPDATE tasks SET date = ?1, status = 'PUSHED' \
             WHERE status IN ('OPEN', 'PUSHED') AND date < ?1",
            params![today],
        )?;
        tx.commit()?;
        Ok(moved)
    }
}

impl RuleStore for SqliteStore {
    fn load_rules(&self) -> Result<Vec<RecurringTask>, StoreError> {
        let sql = format!("SELECT {RULE_COLUMNS} FROM recurring_tasks ORDER BY created_at ASC, id ASC");
        self.query_rules(&sql, [])
    }

    fn load_active_rules(&self) -> Result<Vec<RecurringTask>, StoreError> {
        let sql = format!(
            "SELECT {RULE_COLUMNS} FROM recurring_tasks WHERE is_active = 1 ORDER BY created_at ASC, id ASC"
        );
        self.query_rules(&sql, [])
    }

    fn load_rule(&self, id: i64) -> Result<Option<RecurringTask>, StoreError> {
        let sql = format!("SELECT {RULE_COLUMNS} FROM recurring_tasks WHERE id = ?1");
        Ok(self.query_rules(&sql, params![id])?.into_iter().next())
    }

    fn insert_rule(&self, rule: &NewRule) -> Result<RecurringTask, StoreError> {
        let conn = self.lock()?;
        let created_at = Utc::now();
        let cols = rule.schedule.to_columns();
        conn.execute(
            "INSERT INTO recurring_tasks \
             (title, frequency, day_of_week, day_of_month, monthly_ordinal, monthly_week_day, \
              is_active, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7)",
            params![
                rule.title,
                rule.schedule.frequency().as_str(),
                cols.day_of_week,
                cols.day_of_month,
                cols.monthly_ordinal,
                cols.monthly_week_day,
                format_timestamp(created_at)
            ],
        )?;
        Ok(RecurringTask {
            id: conn.last_insert_rowid(),
            title: rule.title.clone(),
            schedule: Some(rule.schedule),
            is_active: true,
            created_at,
        })
    }

    fn update_rule(&self, rule: &RecurringTask) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let rows = match rule.schedule {
            Some(schedule) => {
                let cols = schedule.to_columns();
                conn.execute(
                    "UPDATE recurring_tasks SET title = ?1, frequency = ?2, day_of_week = ?3, \
                     day_of_month = ?4, monthly_ordinal = ?5, monthly_week_day = ?6, is_active = ?7 \
                     WHERE id = ?8",
                    params![
                        rule.title,
                        schedule.frequency().as_str(),
                        cols.day_of_week,
                        cols.day_of_month,
                        cols.monthly_ordinal,
                        cols.monthly_week_day,
                        rule.is_active,
                        rule.id
                    ],
                )?
            }
            // Unreadable schedule columns are left as they are.
            None => conn.execute(
                "UPDATE recurring_tasks SET title = ?1, is_active = ?2 WHERE id = ?3",
                params![rule.title, rule.is_active, rule.id],
            )?,
        };
        if rows == 0 {
            return Err(StoreError::NotFound { kind: "rule", id: rule.id });
        }
        Ok(())
    }

    fn delete_rule(&self, id: i64) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let rows = conn.execute("DELETE FROM recurring_tasks WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(StoreError::NotFound { kind: "rule", id });
        }
        Ok(())
    }
}

impl AspirationStore for SqliteStore {
    fn load_aspirations(&self) -> Result<Vec<Aspiration>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, title, note, created_at FROM aspirations ORDER BY created_at ASC, id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;
        let mut aspirations = Vec::new();
        for row in rows {
            let (id, title, note, created_at) = row?;
            aspirations.push(Aspiration {
                id,
                title,
                note,
                created_at: parse_timestamp(&created_at)?,
            });
        }
        Ok(aspirations)
    }

    fn insert_aspiration(&self, aspiration: &NewAspiration) -> Result<Aspiration, StoreError> {
        let conn = self.lock()?;
        let created_at = Utc::now();
        conn.execute(
            "INSERT INTO aspirations (title, note, created_at) VALUES (?1, ?2, ?3)",
            params![aspiration.title, aspiration.note, format_timestamp(created_at)],
        )?;
        Ok(Aspiration {
            id: conn.last_insert_rowid(),
            title: aspiration.title.clone(),
            note: aspiration.note.clone(),
            created_at,
        })
    }

    fn delete_aspiration(&self, id: i64) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let rows = conn.execute("DELETE FROM aspirations WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(StoreError::NotFound { kind: "aspiration", id });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Row conversion helpers
// ---------------------------------------------------------------------------

/// Reads a task inside an open transaction.
fn load_task_in(conn: &Connection, id: i64) -> Result<Task, StoreError> {
    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1");
    let row = conn
        .query_row(&sql, params![id], TaskRow::read)
        .optional()?
        .ok_or(StoreError::NotFound { kind: "task", id })?;
    row.into_task()
}

/// A `tasks` row as raw column values.
struct TaskRow {
    id: i64,
    content: String,
    bullet_type: String,
    status: String,
    date: String,
    created_at: String,
    recurring_task_id: Option<i64>,
}

impl TaskRow {
    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            content: row.get(1)?,
            bullet_type: row.get(2)?,
            status: row.get(3)?,
            date: row.get(4)?,
            created_at: row.get(5)?,
            recurring_task_id: row.get(6)?,
        })
    }

    fn into_task(self) -> Result<Task, StoreError> {
        Ok(Task {
            id: self.id,
            content: self.content,
            bullet_type: self.bullet_type.parse()?,
            status: self.status.parse()?,
            date: parse_date(&self.date)?,
            created_at: parse_timestamp(&self.created_at)?,
            recurring_task_id: self.recurring_task_id,
        })
    }
}

/// A `recurring_tasks` row as raw column values.
struct RuleRow {
    id: i64,
    title: String,
    frequency: String,
    columns: ScheduleColumns,
    is_active: bool,
    created_at: String,
}

impl RuleRow {
    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            frequency: row.get(2)?,
            columns: ScheduleColumns {
                day_of_week: row.get(3)?,
                day_of_month: row.get(4)?,
                monthly_ordinal: row.get(5)?,
                monthly_week_day: row.get(6)?,
            },
            is_active: row.get(7)?,
            created_at: row.get(8)?,
        })
    }

    fn into_rule(self) -> Result<RecurringTask, StoreError> {
        let frequency: Frequency = self.frequency.parse()?;
        let schedule = match Schedule::from_columns(frequency, self.columns) {
            Ok(s) => Some(s),
            Err(e) => {
                tracing::warn!(rule_id = self.id, error = %e, "rule has an unusable schedule; it will never fire");
                None
            }
        };
        Ok(RecurringTask {
            id: self.id,
            title: self.title,
            schedule,
            is_active: self.is_active,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

/// Fixed-width UTC form, so text order is time order.
fn format_timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| StoreError::MalformedDate(s.to_string()))
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == ErrorCode::ConstraintViolation
                && err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::DayOfMonth;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory().expect("open in-memory store")
    }

    #[test]
    fn tasks_round_trip_with_iso_dates() {
        let s = store();
        let t = s
            .insert_task(&NewTask::new("write letter", BulletType::Task, date(2024, 2, 29)))
            .expect("insert");
        assert_eq!(t.status, TaskStatus::Open);

        let loaded = s.load_task(t.id).expect("load").expect("present");
        assert_eq!(loaded.content, "write letter");
        assert_eq!(loaded.date, date(2024, 2, 29));

        let raw: String = s
            .lock()
            .unwrap()
            .query_row("SELECT date FROM tasks WHERE id = ?1", params![t.id], |r| r.get(0))
            .unwrap();
        assert_eq!(raw, "2024-02-29");
    }

    #[test]
    fn range_queries_are_inclusive_and_ordered() {
        let s = store();
        for (content, d) in [("c", 3), ("a", 1), ("b", 2), ("d", 4)] {
            s.insert_task(&NewTask::new(content, BulletType::Note, date(2024, 6, d)))
                .unwrap();
        }
        let got: Vec<_> = s
            .load_tasks_between(date(2024, 6, 2), date(2024, 6, 3))
            .unwrap()
            .into_iter()
            .map(|t| t.content)
            .collect();
        assert_eq!(got, ["b", "c"]);

        let after: Vec<_> = s
            .load_tasks_after(date(2024, 6, 2))
            .unwrap()
            .into_iter()
            .map(|t| t.content)
            .collect();
        assert_eq!(after, ["c", "d"]);
    }

    #[test]
    fn duplicate_rule_instance_is_reported() {
        let s = store();
        let rule = s
            .insert_rule(&NewRule {
                title: "stretch".into(),
                schedule: Schedule::Daily,
            })
            .unwrap();
        let today = date(2024, 1, 10);
        s.insert_task(&NewTask::generated(&rule, today)).unwrap();
        match s.insert_task(&NewTask::generated(&rule, today)) {
            Err(StoreError::Duplicate { date: d, rule_id }) => {
                assert_eq!(d, today);
                assert_eq!(rule_id, rule.id);
            }
            other => panic!("expected Duplicate, got {other:?}"),
        }
        assert!(s.find_generated_task(today, rule.id).unwrap().is_some());
    }

    #[test]
    fn malformed_stored_date_is_an_error() {
        let s = store();
        s.lock()
            .unwrap()
            .execute(
                "INSERT INTO tasks (content, bullet_type, status, date, created_at) \
                 VALUES ('bad', 'TASK', 'OPEN', '03/01/2024', '2024-03-01T00:00:00Z')",
                [],
            )
            .unwrap();
        assert!(matches!(s.load_tasks(), Err(StoreError::MalformedDate(d)) if d == "03/01/2024"));
    }

    #[test]
    fn unknown_stored_status_is_an_error() {
        let s = store();
        s.lock()
            .unwrap()
            .execute(
                "INSERT INTO tasks (content, bullet_type, status, date, created_at) \
                 VALUES ('bad', 'TASK', 'DONE', '2024-03-01', '2024-03-01T00:00:00Z')",
                [],
            )
            .unwrap();
        assert!(matches!(s.load_tasks(), Err(StoreError::UnknownStatus(v)) if v == "DONE"));
    }

    #[test]
    fn set_status_rejects_pushing_a_closed_task() {
        let s = store();
        let t = s
            .insert_task(&NewTask::new("file taxes", BulletType::Task, date(2024, 4, 1)))
            .unwrap();
        assert_eq!(s.set_status(t.id, TaskStatus::Closed).expect("complete").status, TaskStatus::Closed);

        assert!(matches!(
            s.set_status(t.id, TaskStatus::Pushed),
            Err(StoreError::Transition(TransitionError::Invalid { .. }))
        ));

        s.set_status(t.id, TaskStatus::Open).expect("reopen");
        assert!(matches!(
            s.set_status(999, TaskStatus::Closed),
            Err(StoreError::NotFound { kind: "task", id: 999 })
        ));
    }

    #[test]
    fn notes_do_not_change_status() {
        let s = store();
        let n = s
            .insert_task(&NewTask::new("it rained", BulletType::Note, date(2024, 4, 1)))
            .unwrap();
        assert!(matches!(
            s.set_status(n.id, TaskStatus::Closed),
            Err(StoreError::Transition(TransitionError::NotActionable(_)))
        ));
    }

    #[test]
    fn edit_touches_only_given_fields() {
        let s = store();
        let t = s
            .insert_task(&NewTask::new("draft", BulletType::Task, date(2024, 4, 1)))
            .unwrap();
        s.set_status(t.id, TaskStatus::Closed).unwrap();

        let edited = s
            .edit_task(
                t.id,
                &TaskEdit {
                    content: Some("final".into()),
                    date: None,
                },
            )
            .unwrap();
        assert_eq!(edited.content, "final");
        assert_eq!(edited.date, date(2024, 4, 1));
        assert_eq!(edited.status, TaskStatus::Closed);
        assert_eq!(s.load_task(t.id).unwrap(), Some(edited));
    }

    #[test]
    fn edit_onto_an_occupied_rule_slot_is_a_duplicate() {
        let s = store();
        let rule = s
            .insert_rule(&NewRule {
                title: "stretch".into(),
                schedule: Schedule::Daily,
            })
            .unwrap();
        let first = s.insert_task(&NewTask::generated(&rule, date(2024, 4, 1))).unwrap();
        s.insert_task(&NewTask::generated(&rule, date(2024, 4, 2))).unwrap();

        let edit = TaskEdit {
            content: None,
            date: Some(date(2024, 4, 2)),
        };
        assert!(matches!(s.edit_task(first.id, &edit), Err(StoreError::Duplicate { .. })));
        assert_eq!(s.load_task(first.id).unwrap().unwrap().date, date(2024, 4, 1));
    }

    #[test]
    fn rules_round_trip_every_mode() {
        let s = store();
        let schedules = [
            Schedule::Daily,
            Schedule::Weekly {
                weekday: chrono::Weekday::Thu,
            },
            Schedule::MonthlyOnDay {
                day: DayOfMonth::new(31).unwrap(),
            },
            Schedule::MonthlyOnWeekday {
                ordinal: crate::recurrence::Ordinal::Last,
                weekday: chrono::Weekday::Fri,
            },
        ];
        for (i, schedule) in schedules.iter().enumerate() {
            s.insert_rule(&NewRule {
                title: format!("rule {i}"),
                schedule: *schedule,
            })
            .unwrap();
        }
        let loaded: Vec<_> = s.load_rules().unwrap().into_iter().map(|r| r.schedule).collect();
        assert_eq!(loaded, schedules.map(Some));
    }

    #[test]
    fn inconsistent_rule_rows_load_without_a_schedule() {
        let s = store();
        s.lock()
            .unwrap()
            .execute(
                "INSERT INTO recurring_tasks (title, frequency, is_active, created_at) \
                 VALUES ('broken', 'MONTHLY', 1, '2024-01-01T00:00:00Z')",
                [],
            )
            .unwrap();
        let rules = s.load_active_rules().unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].schedule, None);
    }

    #[test]
    fn paused_rules_are_not_active() {
        let s = store();
        let mut rule = s
            .insert_rule(&NewRule {
                title: "gym".into(),
                schedule: Schedule::Daily,
            })
            .unwrap();
        rule.is_active = false;
        s.update_rule(&rule).unwrap();
        assert!(s.load_active_rules().unwrap().is_empty());
        assert_eq!(s.load_rules().unwrap().len(), 1);
    }

    #[test]
    fn deleting_a_rule_keeps_its_tasks() {
        let s = store();
        let rule = s
            .insert_rule(&NewRule {
                title: "journal".into(),
                schedule: Schedule::Daily,
            })
            .unwrap();
        let t = s.insert_task(&NewTask::generated(&rule, date(2024, 5, 5))).unwrap();
        s.delete_rule(rule.id).unwrap();
        let kept = s.load_task(t.id).unwrap().expect("task survives rule deletion");
        assert_eq!(kept.recurring_task_id, Some(rule.id));
        assert!(matches!(s.delete_rule(rule.id), Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn aspirations_keep_creation_order() {
        let s = store();
        for title in ["learn piano", "run a marathon"] {
            s.insert_aspiration(&NewAspiration {
                title: title.into(),
                note: String::new(),
            })
            .unwrap();
        }
        let titles: Vec<_> = s
            .load_aspirations()
            .unwrap()
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(titles, ["learn piano", "run a marathon"]);
    }
}
