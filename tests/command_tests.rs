use chrono::{NaiveDate, Weekday};
use nib::calendar::ViewMode;
use nib::commands::*;
use nib::error::{NibError, StoreError, TransitionError};
use nib::models::BulletType;
use nib::recurrence::{DayOfMonth, Ordinal, Schedule};
use nib::status::{Action, TaskStatus};
use nib::storage::{AspirationStore, RuleStore, SqliteStore, TaskStore};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// Each test gets its own database file in a fresh temp directory.
fn with_test_db<F>(f: F)
where
    F: FnOnce(&SqliteStore),
{
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nib.db");
    let store = SqliteStore::open(&db_path).unwrap();
    assert_eq!(store.path(), Some(db_path.as_path()));
    f(&store);
}

#[test]
fn test_add_defaults_to_today() {
    with_test_db(|store| {
        let today = date(2025, 12, 1);
        let task = cmd_add(store, "  Buy milk  ", None, BulletType::Task, today).unwrap();
        assert_eq!(task.content, "Buy milk");
        assert_eq!(task.date, today);
        assert_eq!(task.status, TaskStatus::Open);

        let tasks = store.load_tasks_on(today).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, task.id);
    });
}

#[test]
fn test_add_with_date_and_type() {
    with_test_db(|store| {
        let task = cmd_add(store, "Dentist", Some("2025-12-24"), BulletType::Event, date(2025, 12, 1)).unwrap();
        assert_eq!(task.date, date(2025, 12, 24));
        assert_eq!(task.bullet_type, BulletType::Event);
    });
}

#[test]
fn test_add_rejects_blank_text_and_bad_dates() {
    with_test_db(|store| {
        let today = date(2025, 12, 1);
        assert!(matches!(
            cmd_add(store, "   ", None, BulletType::Task, today),
            Err(NibError::Input(_))
        ));
        assert!(matches!(
            cmd_add(store, "Task", Some("12/24/2025"), BulletType::Task, today),
            Err(NibError::Input(_))
        ));
        assert!(store.load_tasks().unwrap().is_empty());
    });
}

#[test]
fn test_toggle_completes_and_reopens() {
    with_test_db(|store| {
        let task = cmd_add(store, "Write report", None, BulletType::Task, date(2025, 12, 1)).unwrap();

        assert_eq!(cmd_toggle(store, task.id).unwrap(), TaskStatus::Closed);
        assert_eq!(store.load_task(task.id).unwrap().unwrap().status, TaskStatus::Closed);

        assert_eq!(cmd_toggle(store, task.id).unwrap(), TaskStatus::Open);
        assert_eq!(store.load_task(task.id).unwrap().unwrap().status, TaskStatus::Open);
    });
}

#[test]
fn test_toggle_pushed_task_closes_it() {
    with_test_db(|store| {
        let task = cmd_add(store, "Old task", Some("2025-11-30"), BulletType::Task, date(2025, 12, 1)).unwrap();
        store.push_incomplete_tasks(date(2025, 12, 1)).unwrap();
        assert_eq!(store.load_task(task.id).unwrap().unwrap().status, TaskStatus::Pushed);

        assert_eq!(cmd_toggle(store, task.id).unwrap(), TaskStatus::Closed);
    });
}

#[test]
fn test_done_and_reopen_reject_invalid_edges() {
    with_test_db(|store| {
        let task = cmd_add(store, "Call mom", None, BulletType::Task, date(2025, 12, 1)).unwrap();

        assert!(matches!(
            cmd_set_status(store, task.id, Action::Reopen),
            Err(NibError::Transition(TransitionError::Invalid { .. }))
        ));
        assert_eq!(cmd_set_status(store, task.id, Action::Complete).unwrap(), TaskStatus::Closed);
        assert!(matches!(
            cmd_set_status(store, task.id, Action::Complete),
            Err(NibError::Transition(TransitionError::Invalid {
                from: TaskStatus::Closed,
                to: TaskStatus::Closed
            }))
        ));
        assert_eq!(cmd_set_status(store, task.id, Action::Reopen).unwrap(), TaskStatus::Open);
        assert_eq!(store.load_task(task.id).unwrap().unwrap().status, TaskStatus::Open);
    });
}

#[test]
fn test_toggle_rejects_notes() {
    with_test_db(|store| {
        let note = cmd_add(store, "Idea", None, BulletType::Note, date(2025, 12, 1)).unwrap();
        assert!(matches!(
            cmd_toggle(store, note.id),
            Err(NibError::Transition(TransitionError::NotActionable(id))) if id == note.id
        ));
    });
}

#[test]
fn test_toggle_missing_task() {
    with_test_db(|store| {
        assert!(matches!(
            cmd_toggle(store, 42),
            Err(NibError::Store(StoreError::NotFound { kind: "task", id: 42 }))
        ));
    });
}

#[test]
fn test_edit_content_and_date() {
    with_test_db(|store| {
        let task = cmd_add(store, "Draft", None, BulletType::Task, date(2025, 12, 1)).unwrap();

        let edited = cmd_edit(store, task.id, Some(" Final draft "), Some("2025-12-05")).unwrap();
        assert_eq!(edited.content, "Final draft");
        assert_eq!(edited.date, date(2025, 12, 5));

        let stored = store.load_task(task.id).unwrap().unwrap();
        assert_eq!(stored.content, "Final draft");
        assert_eq!(stored.date, date(2025, 12, 5));
        assert_eq!(stored.status, TaskStatus::Open);

        assert!(matches!(cmd_edit(store, task.id, Some(""), None), Err(NibError::Input(_))));
        assert_eq!(store.load_task(task.id).unwrap().unwrap().content, "Final draft");
    });
}

#[test]
fn test_remove_task() {
    with_test_db(|store| {
        let task = cmd_add(store, "Temp", None, BulletType::Task, date(2025, 12, 1)).unwrap();
        cmd_remove(store, task.id).unwrap();
        assert!(store.load_task(task.id).unwrap().is_none());
        assert!(matches!(
            cmd_remove(store, task.id),
            Err(NibError::Store(StoreError::NotFound { .. }))
        ));
    });
}

#[test]
fn test_today_migrates_and_generates() {
    with_test_db(|store| {
        let today = date(2025, 12, 1);
        cmd_add(store, "Leftover", Some("2025-11-28"), BulletType::Task, today).unwrap();
        cmd_rule_add(store, "Stand-up", Schedule::Daily).unwrap();
        cmd_rule_add(store, "Review", Schedule::Weekly { weekday: Weekday::Fri }).unwrap();

        cmd_today(store, today, true).unwrap();
        let tasks = store.load_tasks_on(today).unwrap();
        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().any(|t| t.content == "Leftover" && t.status == TaskStatus::Pushed));
        assert!(tasks.iter().any(|t| t.content == "Stand-up" && t.status == TaskStatus::Open));

        // Running it again changes nothing.
        cmd_today(store, today, false).unwrap();
        assert_eq!(store.load_tasks_on(today).unwrap().len(), 2);
    });
}

#[test]
fn test_rule_add_pause_resume() {
    with_test_db(|store| {
        let rule = cmd_rule_add(store, "  Water plants ", Schedule::Daily).unwrap();
        assert_eq!(rule.title, "Water plants");
        assert!(rule.is_active);

        cmd_rule_set_active(store, rule.id, false).unwrap();
        assert!(store.load_active_rules().unwrap().is_empty());
        cmd_today(store, date(2025, 12, 1), true).unwrap();
        assert!(store.load_tasks_on(date(2025, 12, 1)).unwrap().is_empty());

        cmd_rule_set_active(store, rule.id, true).unwrap();
        assert_eq!(store.load_active_rules().unwrap().len(), 1);

        assert!(matches!(cmd_rule_add(store, " ", Schedule::Daily), Err(NibError::Input(_))));
        assert!(matches!(
            cmd_rule_set_active(store, 999, true),
            Err(NibError::Store(StoreError::NotFound { kind: "rule", .. }))
        ));
    });
}

#[test]
fn test_rule_remove_keeps_generated_tasks() {
    with_test_db(|store| {
        let today = date(2025, 12, 1);
        let rule = cmd_rule_add(store, "Journal", Schedule::Daily).unwrap();
        cmd_today(store, today, true).unwrap();

        cmd_rule_remove(store, rule.id).unwrap();
        assert!(store.load_rules().unwrap().is_empty());
        let tasks = store.load_tasks_on(today).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].content, "Journal");
    });
}

#[test]
fn test_rule_check() {
    with_test_db(|store| {
        let rule = cmd_rule_add(
            store,
            "Pay rent",
            Schedule::MonthlyOnDay {
                day: DayOfMonth::new(31).unwrap(),
            },
        )
        .unwrap();
        assert!(cmd_rule_check(store, rule.id, "2025-12-31").unwrap());
        assert!(!cmd_rule_check(store, rule.id, "2025-11-30").unwrap());
        assert!(matches!(cmd_rule_check(store, rule.id, "tomorrow"), Err(NibError::Input(_))));
    });
}

#[test]
fn test_schedule_from_args() {
    assert_eq!(schedule_from_args(true, None, None, None).unwrap(), Schedule::Daily);
    assert_eq!(
        schedule_from_args(false, Some("wednesday"), None, None).unwrap(),
        Schedule::Weekly { weekday: Weekday::Wed }
    );
    assert_eq!(
        schedule_from_args(false, None, Some(15), None).unwrap(),
        Schedule::MonthlyOnDay {
            day: DayOfMonth::new(15).unwrap()
        }
    );
    let monthly = vec!["last".to_string(), "friday".to_string()];
    assert_eq!(
        schedule_from_args(false, None, None, Some(&monthly)).unwrap(),
        Schedule::MonthlyOnWeekday {
            ordinal: Ordinal::Last,
            weekday: Weekday::Fri
        }
    );
}

#[test]
fn test_schedule_from_args_rejects_bad_input() {
    assert!(matches!(schedule_from_args(false, None, None, None), Err(NibError::Input(_))));
    assert!(matches!(
        schedule_from_args(true, Some("monday"), None, None),
        Err(NibError::Input(_))
    ));
    assert!(matches!(
        schedule_from_args(false, None, Some(32), None),
        Err(NibError::Schedule(_))
    ));
    assert!(matches!(
        schedule_from_args(false, Some("someday"), None, None),
        Err(NibError::Schedule(_))
    ));
    let fifth = vec!["5th".to_string(), "monday".to_string()];
    assert!(matches!(
        schedule_from_args(false, None, None, Some(&fifth)),
        Err(NibError::Schedule(_))
    ));
}

#[test]
fn test_list_at_the_edges_of_the_calendar() {
    with_test_db(|store| {
        let today = date(2025, 12, 1);
        for edge in [NaiveDate::MIN, NaiveDate::MAX] {
            let typed = parse_cli_date(&edge.format("%Y-%m-%d").to_string()).unwrap();
            assert_eq!(typed, edge);
            cmd_list(store, typed, ViewMode::Week, today, false).unwrap();
            cmd_list(store, typed, ViewMode::Month, today, true).unwrap();
        }
    });
}

#[test]
fn test_aspirations() {
    with_test_db(|store| {
        cmd_aspire_add(store, "Run a marathon", Some("by spring")).unwrap();
        cmd_aspire_add(store, "Learn piano", None).unwrap();
        assert!(matches!(cmd_aspire_add(store, "", None), Err(NibError::Input(_))));

        let aspirations = store.load_aspirations().unwrap();
        assert_eq!(aspirations.len(), 2);
        assert_eq!(aspirations[0].note, "by spring");
        assert_eq!(aspirations[1].note, "");
        cmd_aspire_list(store).unwrap();

        cmd_aspire_remove(store, aspirations[0].id).unwrap();
        assert_eq!(store.load_aspirations().unwrap().len(), 1);
    });
}

#[test]
fn test_reset_with_force() {
    with_test_db(|store| {
        cmd_add(store, "Task", None, BulletType::Task, date(2025, 12, 1)).unwrap();
        cmd_rule_add(store, "Rule", Schedule::Daily).unwrap();
        cmd_aspire_add(store, "Dream", None).unwrap();

        cmd_reset(store, true).unwrap();
        assert!(store.load_tasks().unwrap().is_empty());
        assert!(store.load_rules().unwrap().is_empty());
        assert!(store.load_aspirations().unwrap().is_empty());
    });
}
