//! Day rollover: carry unfinished work forward and instantiate today's
//! recurring tasks.
//!
//! Both passes are idempotent and safe to run from several triggers at
//! once. [`refresh_day`] runs them in the required order.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::StoreError;
use crate::models::NewTask;
use crate::recurrence::fires;
use crate::storage::{RuleStore, TaskStore};

/// What a refresh changed.
#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Tasks moved onto today as PUSHED.
    pub migrated: usize,
    /// Tasks created from rules.
    pub generated: usize,
}

impl RefreshReport {
    /// Whether derived views need refreshing.
    pub fn changed(&self) -> bool {
        self.migrated > 0 || self.generated > 0
    }
}

/// Moves every OPEN or PUSHED task dated before `today` onto `today` as PUSHED.
///
/// CLOSED tasks are untouched. The original date is not kept. Returns how
/// many tasks moved; a second run on the same day returns 0.
pub fn migrate_stale_open_tasks<S>(store: &S, today: NaiveDate) -> Result<usize, StoreError>
where
    S: TaskStore + ?Sized,
{
    let moved = store.push_incomplete_tasks(today)?;
    if moved > 0 {
        tracing::info!(moved, %today, "pushed incomplete tasks forward");
    }
    Ok(moved)
}

/// Creates today's task for every active rule that fires on `today`,
/// unless the rule already has a task today.
///
/// Run after [`migrate_stale_open_tasks`] for the same day, so a pushed
/// instance from an earlier day counts as today's. A duplicate insert
/// caused by a concurrent caller counts as already generated.
/// Returns how many tasks were created.
pub fn generate_due_tasks_for_today<S>(store: &S, today: NaiveDate) -> Result<usize, StoreError>
where
    S: TaskStore + RuleStore + ?Sized,
{
    let mut generated = 0;
    for rule in store.load_active_rules()? {
        if !fires(&rule, today) {
            continue;
        }
        if store.find_generated_task(today, rule.id)?.is_some() {
            continue;
        }
        match store.insert_task(&NewTask::generated(&rule, today)) {
            Ok(task) => {
                tracing::debug!(rule_id = rule.id, task_id = task.id, %today, "generated recurring task");
                generated += 1;
            }
            Err(StoreError::Duplicate { .. }) => {
                tracing::debug!(rule_id = rule.id, %today, "recurring task generated concurrently");
            }
            Err(e) => return Err(e),
        }
    }
    if generated > 0 {
        tracing::info!(generated, %today, "generated recurring tasks");
    }
    Ok(generated)
}

/// Migration followed by generation, for a day-view activation.
pub fn refresh_day<S>(store: &S, today: NaiveDate) -> Result<RefreshReport, StoreError>
where
    S: TaskStore + RuleStore + ?Sized,
{
    let migrated = migrate_stale_open_tasks(store, today)?;
    let generated = generate_due_tasks_for_today(store, today)?;
    Ok(RefreshReport { migrated, generated })
}
