//! SQLite DDL and schema evolution.
//!
//! Each step is additive and runs once, inside its own transaction, in
//! version order. A database is never dropped and recreated.

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

/// Connection settings applied on every open.
const PRAGMAS_SQL: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
"#;

const META_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_meta (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// v1: daily entries and aspirations.
const V1_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS tasks (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    content     TEXT NOT NULL,
    bullet_type TEXT NOT NULL,
    status      TEXT NOT NULL,
    date        TEXT NOT NULL,      -- yyyy-MM-dd
    created_at  TEXT NOT NULL       -- RFC 3339
);

CREATE INDEX IF NOT EXISTS idx_tasks_date ON tasks(date);

CREATE TABLE IF NOT EXISTS aspirations (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    title      TEXT NOT NULL,
    note       TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL
);
"#;

/// v2: weekly/day-of-month rules and the back-reference from tasks.
///
/// NULL rule ids are distinct in a UNIQUE index, so manual tasks are unconstrained.
const V2_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS recurring_tasks (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    title        TEXT NOT NULL,
    frequency    TEXT NOT NULL,     -- DAILY | WEEKLY | MONTHLY
    day_of_week  INTEGER,           -- 1 = Monday .. 7 = Sunday
    day_of_month INTEGER,
    is_active    INTEGER NOT NULL DEFAULT 1,
    created_at   TEXT NOT NULL
);

ALTER TABLE tasks ADD COLUMN recurring_task_id INTEGER;

CREATE UNIQUE INDEX IF NOT EXISTS idx_tasks_date_rule ON tasks(date, recurring_task_id);
"#;

/// v3: "Nth weekday of the month" rules.
const V3_SQL: &str = r#"
ALTER TABLE recurring_tasks ADD COLUMN monthly_ordinal INTEGER;   -- 1..4, or -1 for last
ALTER TABLE recurring_tasks ADD COLUMN monthly_week_day INTEGER;  -- 1 = Monday .. 7 = Sunday
"#;

/// Ordered schema steps.
const MIGRATIONS: &[(u32, &str)] = &[(1, V1_SQL), (2, V2_SQL), (3, V3_SQL)];

/// Version the newest step brings a database to.
pub const CURRENT_SCHEMA_VERSION: u32 = 3;

/// Brings the database up to [`CURRENT_SCHEMA_VERSION`].
///
/// Safe to call on every open and from concurrent processes: each step
/// re-reads the version under a write lock before applying.
/// Returns the resulting version.
pub fn apply_schema(conn: &mut Connection) -> rusqlite::Result<u32> {
    conn.execute_batch(PRAGMAS_SQL)?;
    conn.execute_batch(META_SQL)?;

    for &(version, sql) in MIGRATIONS {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current = read_schema_version(&tx)?.unwrap_or(0);
        if current >= version {
            continue;
        }
        tx.execute_batch(sql)?;
        tx.execute(
            "INSERT INTO schema_meta (key, value) VALUES ('schema_version', ?1) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![version.to_string()],
        )?;
        tx.commit()?;
        tracing::debug!(version, "applied schema step");
    }

    Ok(read_schema_version(conn)?.unwrap_or(0))
}

/// Reads the stored schema version, `None` on a fresh database.
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<u32>> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM schema_meta WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value.and_then(|v| v.parse::<u32>().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(conn: &Connection) -> Vec<String> {
        conn.prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .expect("prepare")
            .query_map([], |row| row.get(0))
            .expect("query")
            .filter_map(|r| r.ok())
            .collect()
    }

    #[test]
    fn apply_schema_creates_tables() {
        let mut conn = Connection::open_in_memory().expect("open in-memory db");
        let version = apply_schema(&mut conn).expect("apply_schema");
        assert_eq!(version, CURRENT_SCHEMA_VERSION);

        let tables = table_names(&conn);
        for t in ["aspirations", "recurring_tasks", "schema_meta", "tasks"] {
            assert!(tables.contains(&t.to_owned()), "missing {t}");
        }
    }

    #[test]
    fn apply_schema_is_idempotent() {
        let mut conn = Connection::open_in_memory().expect("open in-memory db");
        apply_schema(&mut conn).expect("first apply");
        apply_schema(&mut conn).expect("second apply");
        assert_eq!(
            read_schema_version(&conn).expect("read"),
            Some(CURRENT_SCHEMA_VERSION)
        );
    }

    #[test]
    fn upgrades_a_v1_database_without_losing_rows() {
        let mut conn = Connection::open_in_memory().expect("open in-memory db");
        conn.execute_batch(META_SQL).expect("meta");
        conn.execute_batch(V1_SQL).expect("v1");
        conn.execute(
            "INSERT INTO schema_meta (key, value) VALUES ('schema_version', '1')",
            [],
        )
        .expect("stamp v1");
        conn.execute(
            "INSERT INTO tasks (content, bullet_type, status, date, created_at) \
             VALUES ('old entry', 'TASK', 'OPEN', '2023-01-05', '2023-01-05T08:00:00Z')",
            [],
        )
        .expect("seed");

        apply_schema(&mut conn).expect("upgrade");

        let (content, rule): (String, Option<i64>) = conn
            .query_row("SELECT content, recurring_task_id FROM tasks", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .expect("row survives");
        assert_eq!(content, "old entry");
        assert_eq!(rule, None);
        assert_eq!(
            read_schema_version(&conn).expect("read"),
            Some(CURRENT_SCHEMA_VERSION)
        );
    }

    #[test]
    fn duplicate_rule_instances_are_rejected() {
        let mut conn = Connection::open_in_memory().expect("open in-memory db");
        apply_schema(&mut conn).expect("apply_schema");
        let insert = "INSERT INTO tasks (content, bullet_type, status, date, created_at, recurring_task_id) \
                      VALUES ('x', 'TASK', 'OPEN', '2024-01-01', '2024-01-01T00:00:00Z', ?1)";
        conn.execute(insert, params![Some(1_i64)]).expect("first");
        assert!(conn.execute(insert, params![Some(1_i64)]).is_err());
        // Manual tasks carry NULL and never collide.
        conn.execute(insert, params![None::<i64>]).expect("manual 1");
        conn.execute(insert, params![None::<i64>]).expect("manual 2");
    }
}
