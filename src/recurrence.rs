//! Recurrence rule evaluation.
//!
//! Pure functions over a rule and a calendar date. Rules for days 29-31
//! skip months that are too short, and "Nth weekday" rules skip months
//! without an Nth occurrence. Nothing clamps or wraps into the next month.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::dates::{days_in_month, last_day_of_month};
use crate::error::{ScheduleError, StoreError};
use crate::models::RecurringTask;

/// Coarse rule frequency, as persisted.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DAILY" => Ok(Frequency::Daily),
            "WEEKLY" => Ok(Frequency::Weekly),
            "MONTHLY" => Ok(Frequency::Monthly),
            other => Err(StoreError::UnknownFrequency(other.to_string())),
        }
    }
}

/// A day of the month in `1..=31`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(try_from = "i64", into = "i64")]
pub struct DayOfMonth(u8);

impl DayOfMonth {
    pub fn new(day: i64) -> Result<Self, ScheduleError> {
        match u8::try_from(day) {
            Ok(d @ 1..=31) => Ok(DayOfMonth(d)),
            _ => Err(ScheduleError::DayOfMonth(day)),
        }
    }

    pub fn get(self) -> u32 {
        u32::from(self.0)
    }
}

impl TryFrom<i64> for DayOfMonth {
    type Error = ScheduleError;

    fn try_from(day: i64) -> Result<Self, Self::Error> {
        DayOfMonth::new(day)
    }
}

impl From<DayOfMonth> for i64 {
    fn from(day: DayOfMonth) -> i64 {
        i64::from(day.0)
    }
}

/// Which occurrence of a weekday within a month.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Ordinal {
    First,
    Second,
    Third,
    Fourth,
    Last,
}

impl Ordinal {
    /// Persisted form: 1..=4, or -1 for last.
    pub fn from_i64(n: i64) -> Result<Self, ScheduleError> {
        match n {
            1 => Ok(Ordinal::First),
            2 => Ok(Ordinal::Second),
            3 => Ok(Ordinal::Third),
            4 => Ok(Ordinal::Fourth),
            -1 => Ok(Ordinal::Last),
            other => Err(ScheduleError::Ordinal(other)),
        }
    }

    pub fn as_i64(self) -> i64 {
        match self {
            Ordinal::First => 1,
            Ordinal::Second => 2,
            Ordinal::Third => 3,
            Ordinal::Fourth => 4,
            Ordinal::Last => -1,
        }
    }

    /// 1-based occurrence counted from the start of the month, `None` for last.
    pub fn nth(self) -> Option<u8> {
        match self {
            Ordinal::Last => None,
            other => u8::try_from(other.as_i64()).ok(),
        }
    }
}

impl FromStr for Ordinal {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "1" | "1st" | "first" => Ok(Ordinal::First),
            "2" | "2nd" | "second" => Ok(Ordinal::Second),
            "3" | "3rd" | "third" => Ok(Ordinal::Third),
            "4" | "4th" | "fourth" => Ok(Ordinal::Fourth),
            "-1" | "last" => Ok(Ordinal::Last),
            _ => Err(ScheduleError::OrdinalName(s.to_string())),
        }
    }
}

/// When a rule fires. One variant per scheduling mode.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Schedule {
    Daily,
    Weekly {
        weekday: Weekday,
    },
    MonthlyOnDay {
        day: DayOfMonth,
    },
    MonthlyOnWeekday {
        ordinal: Ordinal,
        weekday: Weekday,
    },
}

/// Flat column layout of a schedule, as stored in `recurring_tasks`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScheduleColumns {
    pub day_of_week: Option<i64>,
    pub day_of_month: Option<i64>,
    pub monthly_ordinal: Option<i64>,
    pub monthly_week_day: Option<i64>,
}

impl Schedule {
    pub fn frequency(&self) -> Frequency {
        match self {
            Schedule::Daily => Frequency::Daily,
            Schedule::Weekly { .. } => Frequency::Weekly,
            Schedule::MonthlyOnDay { .. } | Schedule::MonthlyOnWeekday { .. } => Frequency::Monthly,
        }
    }

    /// Whether this schedule fires on `date`.
    pub fn matches(&self, date: NaiveDate) -> bool {
        match *self {
            Schedule::Daily => true,
            Schedule::Weekly { weekday } => date.weekday() == weekday,
            Schedule::MonthlyOnDay { day } => {
                day.get() <= days_in_month(date.year(), date.month()) && date.day() == day.get()
            }
            Schedule::MonthlyOnWeekday { ordinal, weekday } => {
                occurrence_in_month(date.year(), date.month(), ordinal, weekday) == Some(date)
            }
        }
    }

    /// First date on or after `from` this schedule fires, looking at most
    /// about a year ahead.
    pub fn next_on_or_after(&self, from: NaiveDate) -> Option<NaiveDate> {
        from.iter_days().take(LOOKAHEAD_DAYS).find(|d| self.matches(*d))
    }

    /// Rebuilds a schedule from its stored columns.
    ///
    /// Exactly one mode's fields may be set for the given frequency.
    pub fn from_columns(frequency: Frequency, cols: ScheduleColumns) -> Result<Self, ScheduleError> {
        let ScheduleColumns {
            day_of_week,
            day_of_month,
            monthly_ordinal,
            monthly_week_day,
        } = cols;
        match (frequency, day_of_week, day_of_month, monthly_ordinal, monthly_week_day) {
            (Frequency::Daily, None, None, None, None) => Ok(Schedule::Daily),
            (Frequency::Weekly, Some(dow), None, None, None) => Ok(Schedule::Weekly {
                weekday: iso_weekday(dow)?,
            }),
            (Frequency::Monthly, None, Some(dom), None, None) => Ok(Schedule::MonthlyOnDay {
                day: DayOfMonth::new(dom)?,
            }),
            (Frequency::Monthly, None, None, Some(ord), Some(wd)) => Ok(Schedule::MonthlyOnWeekday {
                ordinal: Ordinal::from_i64(ord)?,
                weekday: iso_weekday(wd)?,
            }),
            (f, ..) => Err(ScheduleError::Mixed(f.as_str())),
        }
    }

    pub fn to_columns(&self) -> ScheduleColumns {
        match *self {
            Schedule::Daily => ScheduleColumns::default(),
            Schedule::Weekly { weekday } => ScheduleColumns {
                day_of_week: Some(i64::from(weekday.number_from_monday())),
                ..Default::default()
            },
            Schedule::MonthlyOnDay { day } => ScheduleColumns {
                day_of_month: Some(day.into()),
                ..Default::default()
            },
            Schedule::MonthlyOnWeekday { ordinal, weekday } => ScheduleColumns {
                monthly_ordinal: Some(ordinal.as_i64()),
                monthly_week_day: Some(i64::from(weekday.number_from_monday())),
                ..Default::default()
            },
        }
    }
}

const LOOKAHEAD_DAYS: usize = 400;

/// Whether `rule` should produce a task on `date`.
///
/// Inactive rules and rules whose stored fields are inconsistent never fire.
pub fn fires(rule: &RecurringTask, date: NaiveDate) -> bool {
    rule.is_active && rule.schedule.is_some_and(|s| s.matches(date))
}

/// The date of the `ordinal` `weekday` in the given month, if the month has one.
pub fn occurrence_in_month(year: i32, month: u32, ordinal: Ordinal, weekday: Weekday) -> Option<NaiveDate> {
    match ordinal.nth() {
        Some(n) => NaiveDate::from_weekday_of_month_opt(year, month, weekday, n),
        None => {
            let last = last_day_of_month(year, month)?;
            let back = (7 + last.weekday().num_days_from_monday() - weekday.num_days_from_monday()) % 7;
            last.checked_sub_days(Days::new(u64::from(back)))
        }
    }
}

/// ISO weekday number, 1 = Monday through 7 = Sunday.
pub fn iso_weekday(n: i64) -> Result<Weekday, ScheduleError> {
    match n {
        1 => Ok(Weekday::Mon),
        2 => Ok(Weekday::Tue),
        3 => Ok(Weekday::Wed),
        4 => Ok(Weekday::Thu),
        5 => Ok(Weekday::Fri),
        6 => Ok(Weekday::Sat),
        7 => Ok(Weekday::Sun),
        other => Err(ScheduleError::Weekday(other)),
    }
}

/// Accepts weekday names ("monday", "Mon") or ISO numbers ("1".."7").
pub fn parse_weekday(s: &str) -> Result<Weekday, ScheduleError> {
    if let Ok(n) = s.parse::<i64>() {
        return iso_weekday(n);
    }
    s.parse::<Weekday>()
        .map_err(|_| ScheduleError::WeekdayName(s.to_string()))
}
