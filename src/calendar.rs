//! Calendar ranges, per-day counts and the day summary shown on a widget.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

use crate::dates::{epoch_day, last_day_of_month};
use crate::error::StoreError;
use crate::migration::{refresh_day, RefreshReport};
use crate::models::{Aspiration, Task};
use crate::storage::{AspirationStore, RuleStore, TaskStore};

/// Span of days a calendar view covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Day,
    Week,
    Month,
}

/// First and last day (inclusive) visible around `date`.
///
/// Weeks run Monday to Sunday. A week that crosses the edge of the
/// representable calendar is cut off at `NaiveDate::MIN` or `NaiveDate::MAX`.
pub fn visible_range(date: NaiveDate, mode: ViewMode) -> (NaiveDate, NaiveDate) {
    match mode {
        ViewMode::Day => (date, date),
        ViewMode::Week => {
            let back = Days::new(u64::from(date.weekday().num_days_from_monday()));
            let forward = Days::new(u64::from(6 - date.weekday().num_days_from_monday()));
            let monday = date.checked_sub_days(back).unwrap_or(NaiveDate::MIN);
            let sunday = date.checked_add_days(forward).unwrap_or(NaiveDate::MAX);
            (monday, sunday)
        }
        ViewMode::Month => {
            let first = date.with_day(1).unwrap_or(date);
            let last = last_day_of_month(date.year(), date.month()).unwrap_or(date);
            (first, last)
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCounts {
    /// OPEN and PUSHED.
    pub open: usize,
    pub closed: usize,
}

/// Open/closed counts per date. Dates without tasks are absent.
pub fn task_counts(tasks: &[Task]) -> BTreeMap<NaiveDate, TaskCounts> {
    let mut counts: BTreeMap<NaiveDate, TaskCounts> = BTreeMap::new();
    for task in tasks {
        let entry = counts.entry(task.date).or_default();
        if task.status.is_incomplete() {
            entry.open += 1;
        } else {
            entry.closed += 1;
        }
    }
    counts
}

/// One aspiration per day, rotating through the list in creation order.
pub fn aspiration_of_the_day(aspirations: &[Aspiration], today: NaiveDate) -> Option<&Aspiration> {
    if aspirations.is_empty() {
        return None;
    }
    let index = epoch_day(today).rem_euclid(aspirations.len() as i64) as usize;
    aspirations.get(index)
}

/// Everything a glance at "today" needs.
#[derive(Serialize, Debug, Clone)]
pub struct DaySummary {
    pub date: NaiveDate,
    /// Today's tasks that are not closed, in creation order.
    pub open_tasks: Vec<Task>,
    pub aspiration: Option<Aspiration>,
    /// `None` when the refresh failed; the summary then shows stored state.
    pub refresh: Option<RefreshReport>,
}

/// Refreshes the day, then collects today's open tasks and aspiration.
///
/// A failed refresh is logged and does not fail the summary; it is retried
/// on the next call.
pub fn day_summary<S>(store: &S, today: NaiveDate) -> Result<DaySummary, StoreError>
where
    S: TaskStore + RuleStore + AspirationStore + ?Sized,
{
    let refresh = match refresh_day(store, today) {
        Ok(report) => Some(report),
        Err(e) => {
            tracing::warn!(error = %e, %today, "day refresh failed");
            None
        }
    };
    let open_tasks = store
        .load_tasks_on(today)?
        .into_iter()
        .filter(|t| t.status.is_incomplete())
        .collect();
    let aspirations = store.load_aspirations()?;
    let aspiration = aspiration_of_the_day(&aspirations, today).cloned();
    Ok(DaySummary {
        date: today,
        open_tasks,
        aspiration,
        refresh,
    })
}
