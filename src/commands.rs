//! Bodies of the `nib` subcommands.

use std::io::{self, Write};

use chrono::NaiveDate;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::calendar::{day_summary, task_counts, visible_range, ViewMode};
use crate::config::{config_path, Config};
use crate::dates::{format_date, parse_date};
use crate::describe::describe;
use crate::error::{NibError, Result, StoreError};
use crate::models::{BulletType, NewAspiration, NewRule, NewTask, RecurringTask, Task, TaskEdit};
use crate::recurrence::{fires, parse_weekday, DayOfMonth, Ordinal, Schedule};
use crate::status::{Action, TaskStatus};
use crate::storage::{AspirationStore, RuleStore, SqliteStore, TaskStore};

/// Parses a `YYYY-MM-DD` argument.
pub fn parse_cli_date(s: &str) -> Result<NaiveDate> {
    parse_date(s).map_err(|_| NibError::Input(format!("Invalid date '{}'. Use YYYY-MM-DD.", s)))
}

/// Builds a schedule from the mutually exclusive `rule add` flags.
///
/// `monthly` is `[ordinal, weekday]`, e.g. `["last", "friday"]`.
pub fn schedule_from_args(
    daily: bool,
    weekly: Option<&str>,
    monthly_day: Option<i64>,
    monthly: Option<&[String]>,
) -> Result<Schedule> {
    let schedule = match (daily, weekly, monthly_day, monthly) {
        (true, None, None, None) => Schedule::Daily,
        (false, Some(day), None, None) => Schedule::Weekly {
            weekday: parse_weekday(day)?,
        },
        (false, None, Some(day), None) => Schedule::MonthlyOnDay {
            day: DayOfMonth::new(day)?,
        },
        (false, None, None, Some([ordinal, weekday])) => Schedule::MonthlyOnWeekday {
            ordinal: ordinal.parse::<Ordinal>()?,
            weekday: parse_weekday(weekday)?,
        },
        _ => {
            return Err(NibError::Input(
                "Pick exactly one of --daily, --weekly <DAY>, --monthly-day <N>, --monthly <ORDINAL> <DAY>."
                    .into(),
            ))
        }
    };
    Ok(schedule)
}

/// Refreshes the day and prints today's open tasks with the aspiration of the day.
pub fn cmd_today(store: &SqliteStore, today: NaiveDate, json: bool) -> Result<()> {
    let summary = day_summary(store, today)?;
    if json {
        print_json(&summary);
        return Ok(());
    }

    println!("{}", today.format("%A, %B %-d"));
    if let Some(a) = &summary.aspiration {
        println!("✦ {}", a.title);
    }
    if summary.open_tasks.is_empty() {
        println!("Nothing open today.");
    } else {
        println!("{}", task_table(&summary.open_tasks, today));
    }
    Ok(())
}

/// Adds a new entry. Defaults to a task for today.
pub fn cmd_add(
    store: &SqliteStore,
    content: &str,
    date: Option<&str>,
    bullet_type: BulletType,
    today: NaiveDate,
) -> Result<Task> {
    let content = content.trim();
    if content.is_empty() {
        return Err(NibError::Input("Entry text cannot be empty.".into()));
    }
    let date = match date {
        Some(d) => parse_cli_date(d)?,
        None => today,
    };
    let task = store.insert_task(&NewTask::new(content, bullet_type, date))?;
    println!("Added {} {} on {}", bullet_type.as_str().to_lowercase(), task.id, task.date);
    Ok(task)
}

/// Marks a task done, or reopens it if it is already done.
pub fn cmd_toggle(store: &SqliteStore, id: i64) -> Result<TaskStatus> {
    let mut task = load_task_or_not_found(store, id)?;
    let status = store.set_status(id, task.toggle()?)?.status;
    match status {
        TaskStatus::Closed => println!("Task {} done.", id),
        _ => println!("Task {} reopened.", id),
    }
    Ok(status)
}

/// Applies an explicit status action to a task.
pub fn cmd_set_status(store: &SqliteStore, id: i64, action: Action) -> Result<TaskStatus> {
    let mut task = load_task_or_not_found(store, id)?;
    let status = store.set_status(id, task.apply(action)?)?.status;
    println!("Task {} is now {}.", id, status);
    Ok(status)
}

/// Edits an entry's text and/or date. Fields not given keep their stored values.
pub fn cmd_edit(store: &SqliteStore, id: i64, content: Option<&str>, date: Option<&str>) -> Result<Task> {
    let mut edit = TaskEdit::default();
    if let Some(c) = content {
        let c = c.trim();
        if c.is_empty() {
            return Err(NibError::Input("Entry text cannot be empty.".into()));
        }
        edit.content = Some(c.to_string());
    }
    if let Some(d) = date {
        edit.date = Some(parse_cli_date(d)?);
    }
    let task = store.edit_task(id, &edit)?;
    println!("Entry {} updated.", id);
    Ok(task)
}

/// Removes an entry by ID.
pub fn cmd_remove(store: &SqliteStore, id: i64) -> Result<()> {
    store.delete_task(id)?;
    println!("Entry {} removed.", id);
    Ok(())
}

/// Lists entries for a day, or day-by-day counts plus entries for the
/// week or month around `date`.
pub fn cmd_list(store: &SqliteStore, date: NaiveDate, mode: ViewMode, today: NaiveDate, json: bool) -> Result<()> {
    let (from, to) = visible_range(date, mode);
    let tasks = store.load_tasks_between(from, to)?;
    if json {
        print_json(&tasks);
        return Ok(());
    }
    if tasks.is_empty() {
        println!("No entries between {} and {}.", from, to);
        return Ok(());
    }

    if mode != ViewMode::Day {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_header(vec!["Date", "Open", "Done"]);
        for (day, counts) in task_counts(&tasks) {
            table.add_row(vec![
                Cell::new(day.format("%a %Y-%m-%d")),
                Cell::new(counts.open).fg(if counts.open > 0 { Color::Yellow } else { Color::Reset }),
                Cell::new(counts.closed).fg(Color::Green),
            ]);
        }
        println!("{table}");
    }
    println!("{}", task_table(&tasks, today));
    Ok(())
}

/// Lists everything scheduled after today.
pub fn cmd_future(store: &SqliteStore, today: NaiveDate, json: bool) -> Result<()> {
    let tasks = store.load_tasks_after(today)?;
    if json {
        print_json(&tasks);
    } else if tasks.is_empty() {
        println!("Nothing scheduled after {}.", today);
    } else {
        println!("{}", task_table(&tasks, today));
    }
    Ok(())
}

pub fn cmd_rule_add(store: &SqliteStore, title: &str, schedule: Schedule) -> Result<RecurringTask> {
    let title = title.trim();
    if title.is_empty() {
        return Err(NibError::Input("Rule title cannot be empty.".into()));
    }
    let rule = store.insert_rule(&NewRule {
        title: title.to_string(),
        schedule,
    })?;
    println!("Rule {} added: {}", rule.id, describe(&rule));
    Ok(rule)
}

/// Lists all rules with their schedule and next firing date.
pub fn cmd_rule_list(store: &SqliteStore, today: NaiveDate) -> Result<()> {
    let rules = store.load_rules()?;
    if rules.is_empty() {
        println!("No recurring tasks.");
        return Ok(());
    }
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Title").add_attribute(Attribute::Bold),
            Cell::new("Schedule").add_attribute(Attribute::Bold),
            Cell::new("Next").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
        ]);
    for rule in rules {
        let next = match (rule.is_active, rule.schedule) {
            (true, Some(s)) => s.next_on_or_after(today).map(format_date).unwrap_or_else(|| "-".into()),
            _ => "-".into(),
        };
        let (status, color) = if rule.is_active {
            ("Active", Color::Green)
        } else {
            ("Paused", Color::Grey)
        };
        table.add_row(vec![
            Cell::new(rule.id),
            Cell::new(&rule.title),
            Cell::new(describe(&rule)),
            Cell::new(next),
            Cell::new(status).fg(color),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Pauses or resumes a rule.
pub fn cmd_rule_set_active(store: &SqliteStore, id: i64, active: bool) -> Result<()> {
    let mut rule = store
        .load_rule(id)?
        .ok_or(StoreError::NotFound { kind: "rule", id })?;
    rule.is_active = active;
    store.update_rule(&rule)?;
    println!("Rule {} {}.", id, if active { "resumed" } else { "paused" });
    Ok(())
}

/// Removes a rule. Tasks it already generated stay in the journal.
pub fn cmd_rule_remove(store: &SqliteStore, id: i64) -> Result<()> {
    store.delete_rule(id)?;
    println!("Rule {} removed.", id);
    Ok(())
}

/// Reports whether a rule fires on a date.
pub fn cmd_rule_check(store: &SqliteStore, id: i64, date: &str) -> Result<bool> {
    let date = parse_cli_date(date)?;
    let rule = store
        .load_rule(id)?
        .ok_or(StoreError::NotFound { kind: "rule", id })?;
    let hit = fires(&rule, date);
    println!(
        "{} ({}) {} on {}",
        rule.title,
        describe(&rule),
        if hit { "fires" } else { "does not fire" },
        date.format("%a %Y-%m-%d")
    );
    Ok(hit)
}

pub fn cmd_aspire_add(store: &SqliteStore, title: &str, note: Option<&str>) -> Result<()> {
    let title = title.trim();
    if title.is_empty() {
        return Err(NibError::Input("Aspiration title cannot be empty.".into()));
    }
    let a = store.insert_aspiration(&NewAspiration {
        title: title.to_string(),
        note: note.unwrap_or_default().trim().to_string(),
    })?;
    println!("Aspiration {} added.", a.id);
    Ok(())
}

pub fn cmd_aspire_list(store: &SqliteStore) -> Result<()> {
    let aspirations = store.load_aspirations()?;
    if aspirations.is_empty() {
        println!("No aspirations yet.");
        return Ok(());
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["ID", "Title", "Note"]);
    for a in aspirations {
        table.add_row(vec![a.id.to_string(), a.title, a.note]);
    }
    println!("{table}");
    Ok(())
}

pub fn cmd_aspire_remove(store: &SqliteStore, id: i64) -> Result<()> {
    store.delete_aspiration(id)?;
    println!("Aspiration {} removed.", id);
    Ok(())
}

/// Prints the effective configuration.
pub fn cmd_config(config: &Config) {
    match config_path() {
        Some(p) => println!("Config file: {}", p.display()),
        None => println!("Config file: (no config directory)"),
    }
    println!("Database:    {}", config.database_path().display());
    println!("Log filter:  {}", config.log_filter());
}

/// Deletes every entry, rule and aspiration.
pub fn cmd_reset(store: &SqliteStore, force: bool) -> Result<()> {
    if !force {
        print!("Delete all entries, recurring tasks and aspirations? This cannot be undone. [y/N] ");
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if input.trim().to_lowercase() != "y" {
            println!("Aborted.");
            return Ok(());
        }
    }
    store.clear()?;
    println!("Journal reset.");
    Ok(())
}

fn load_task_or_not_found(store: &SqliteStore, id: i64) -> Result<Task> {
    let task = store
        .load_task(id)?
        .ok_or(StoreError::NotFound { kind: "task", id })?;
    Ok(task)
}

fn task_table(tasks: &[Task], today: NaiveDate) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("").add_attribute(Attribute::Bold),
            Cell::new("Entry").add_attribute(Attribute::Bold),
            Cell::new("Date").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
        ]);

    for t in tasks {
        let glyph = match t.bullet_type {
            BulletType::Task => t.status.glyph(),
            BulletType::Note => "–",
            BulletType::Event => "○",
        };
        let status_color = match t.status {
            TaskStatus::Open => Color::Yellow,
            TaskStatus::Pushed => Color::Magenta,
            TaskStatus::Closed => Color::Green,
        };
        let date = if t.date == today {
            "Today".to_string()
        } else {
            format_date(t.date)
        };
        let mut entry = Cell::new(&t.content);
        if t.status == TaskStatus::Closed {
            entry = entry.add_attribute(Attribute::CrossedOut);
        }
        table.add_row(vec![
            Cell::new(t.id),
            Cell::new(glyph),
            entry,
            Cell::new(date),
            Cell::new(t.status).fg(status_color),
        ]);
    }
    table
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => tracing::error!(error = %e, "failed to serialize output"),
    }
}
