//! Human-readable schedule labels.
//!
//! The label is derived from the same `Schedule` the evaluator matches on,
//! so the two cannot drift apart.

use std::fmt;

use chrono::Weekday;

use crate::models::RecurringTask;
use crate::recurrence::{Ordinal, Schedule};

/// Label for a rule's schedule, e.g. "Monthly on the last Friday".
pub fn describe(rule: &RecurringTask) -> String {
    match &rule.schedule {
        Some(schedule) => schedule.to_string(),
        None => "Unscheduled".to_string(),
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Schedule::Daily => f.write_str("Daily"),
            Schedule::Weekly { weekday } => write!(f, "Weekly on {}", weekday_name(weekday)),
            Schedule::MonthlyOnDay { day } => write!(f, "Monthly on the {}", ordinal(day.get())),
            Schedule::MonthlyOnWeekday { ordinal: o, weekday } => {
                write!(f, "Monthly on the {} {}", ordinal_word(o), weekday_name(weekday))
            }
        }
    }
}

/// `1` -> "1st", `12` -> "12th", `22` -> "22nd".
pub fn ordinal(n: u32) -> String {
    let suffix = match (n % 100, n % 10) {
        (11..=13, _) => "th",
        (_, 1) => "st",
        (_, 2) => "nd",
        (_, 3) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

fn ordinal_word(o: Ordinal) -> String {
    match o.nth() {
        Some(n) => ordinal(u32::from(n)),
        None => "last".to_string(),
    }
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
