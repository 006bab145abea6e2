use daybook::commands::*;
use daybook::models::{Priority, Schedule};
use daybook::storage::load_index;
use std::env;
use std::fs;
use std::sync::Mutex;

use chrono::NaiveDate;

// Use a mutex to ensure tests run serially since they modify the environment variable
static TEST_MUTEX: Mutex<()> = Mutex::new(());

fn with_test_db<F>(test_name: &str, f: F)
where
    F: FnOnce(),
{
    let _guard = TEST_MUTEX.lock().unwrap();

    let mut db_path = env::temp_dir();
    db_path.push(format!("daybook_test_{}.json", test_name));

    env::set_var("DAYBOOK_DB", db_path.to_str().unwrap());
    // Commands must run purely locally here.
    env::remove_var("DAYBOOK_API_URL");
    env::remove_var("DAYBOOK_API_TOKEN");

    if db_path.exists() {
        fs::remove_file(&db_path).unwrap();
    }

    f();

    if db_path.exists() {
        fs::remove_file(&db_path).unwrap();
    }
    env::remove_var("DAYBOOK_DB");
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[test]
fn add_and_query_a_day() {
    with_test_db("add_query", || {
        cmd_add(
            "Water the plants".into(),
            None,
            Priority::Medium,
            Some("2025-12-01".into()),
            None,
            None,
            None,
            true,
        );

        let index = load_index();
        assert_eq!(index.len(), 1);
        let occurrences = index.tasks_for_date(date("2025-12-01"));
        assert_eq!(occurrences.len(), 1);
        assert_eq!(occurrences[0].task.title, "Water the plants");
        assert!(!occurrences[0].task.is_series());
    });
}

#[test]
fn add_with_until_makes_a_repeating_task() {
    with_test_db("add_repeating", || {
        cmd_add(
            "Standup".into(),
            None,
            Priority::Low,
            Some("2025-12-01".into()),
            Some("09:30".into()),
            None,
            Some("2025-12-03".into()),
            true,
        );

        let index = load_index();
        assert_eq!(index.len(), 1);
        for day in ["2025-12-01", "2025-12-02", "2025-12-03"] {
            assert_eq!(index.tasks_for_date(date(day)).len(), 1, "missing on {day}");
        }
        assert!(index.tasks_for_date(date("2025-12-04")).is_empty());
    });
}

#[test]
fn add_rejects_a_malformed_date() {
    with_test_db("add_bad_date", || {
        cmd_add(
            "Broken".into(),
            None,
            Priority::Medium,
            Some("12/01/2025".into()),
            None,
            None,
            None,
            true,
        );

        assert!(load_index().is_empty());
    });
}

#[test]
fn add_rejects_a_repetition_end_before_the_start() {
    with_test_db("add_bad_range", || {
        cmd_add(
            "Backwards".into(),
            None,
            Priority::Medium,
            Some("2025-12-10".into()),
            None,
            None,
            Some("2025-12-01".into()),
            true,
        );

        assert!(load_index().is_empty());
    });
}

#[test]
fn done_toggles_completion() {
    with_test_db("done_toggle", || {
        cmd_add(
            "Pay rent".into(),
            None,
            Priority::High,
            Some("2025-12-01".into()),
            None,
            None,
            None,
            true,
        );
        let id = load_index().tasks().next().unwrap().id.clone();

        cmd_done(id.clone(), true);
        assert!(load_index().find(&id).unwrap().completed);

        cmd_done(id.clone(), true);
        assert!(!load_index().find(&id).unwrap().completed);
    });
}

#[test]
fn commands_accept_a_unique_id_prefix() {
    with_test_db("id_prefix", || {
        cmd_add(
            "Pay rent".into(),
            None,
            Priority::Medium,
            Some("2025-12-01".into()),
            None,
            None,
            None,
            true,
        );
        let id = load_index().tasks().next().unwrap().id.clone();

        cmd_done(id[..8].to_string(), true);
        assert!(load_index().find(&id).unwrap().completed);
    });
}

#[test]
fn move_relocates_a_single_task() {
    with_test_db("move_single", || {
        cmd_add(
            "Dentist".into(),
            None,
            Priority::Medium,
            Some("2025-02-01".into()),
            None,
            None,
            None,
            true,
        );
        let id = load_index().tasks().next().unwrap().id.clone();

        cmd_move(id.clone(), "2025-02-05".into(), false, true);

        let index = load_index();
        assert!(index.tasks_for_date(date("2025-02-01")).is_empty());
        match index.find(&id).unwrap().schedule {
            Schedule::Single {
                date: due,
                original_due_date,
                rescheduled,
            } => {
                assert_eq!(due, date("2025-02-05"));
                assert_eq!(original_due_date, Some(date("2025-02-01")));
                assert!(rescheduled);
            }
            Schedule::Series { .. } => panic!("moved task should stay single"),
        }
    });
}

#[test]
fn move_detaches_one_day_from_a_repeating_task() {
    with_test_db("move_detach", || {
        cmd_add(
            "Standup".into(),
            None,
            Priority::Medium,
            Some("2025-12-01".into()),
            None,
            None,
            Some("2025-12-05".into()),
            true,
        );
        let id = load_index().tasks().next().unwrap().id.clone();

        cmd_move(id.clone(), "2025-12-20".into(), false, true);

        let index = load_index();
        assert_eq!(index.len(), 2, "parent series plus detached instance");
        assert!(index.tasks_for_date(date("2025-12-01")).is_empty());
        assert_eq!(index.tasks_for_date(date("2025-12-02")).len(), 1);
        let moved = index.tasks_for_date(date("2025-12-20"));
        assert_eq!(moved.len(), 1);
        assert!(!moved[0].task.is_series());
    });
}

#[test]
fn move_with_no_mark_does_not_flag_the_task() {
    with_test_db("move_no_mark", || {
        cmd_add(
            "Dentist".into(),
            None,
            Priority::Medium,
            Some("2025-02-01".into()),
            None,
            None,
            None,
            true,
        );
        let id = load_index().tasks().next().unwrap().id.clone();

        cmd_move(id.clone(), "2025-02-05".into(), true, true);

        match load_index().find(&id).unwrap().schedule {
            Schedule::Single { rescheduled, .. } => assert!(!rescheduled),
            Schedule::Series { .. } => panic!("moved task should stay single"),
        }
    });
}

#[test]
fn edit_changes_fields_in_place() {
    with_test_db("edit_fields", || {
        cmd_add(
            "Dentist".into(),
            None,
            Priority::Medium,
            Some("2025-02-01".into()),
            None,
            None,
            None,
            true,
        );
        let id = load_index().tasks().next().unwrap().id.clone();

        cmd_edit(
            id.clone(),
            Some("Dentist (new office)".into()),
            Some("Ask about the crown".into()),
            Some(Priority::High),
            Some("2025-02-03".into()),
            Some("14:00".into()),
            None,
            None,
            false,
            true,
        );

        let index = load_index();
        assert!(index.tasks_for_date(date("2025-02-01")).is_empty());
        let task = index.find(&id).unwrap();
        assert_eq!(task.title, "Dentist (new office)");
        assert_eq!(task.description.as_deref(), Some("Ask about the crown"));
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.storage_key(), date("2025-02-03"));
    });
}

#[test]
fn edit_with_once_stops_a_repeating_task() {
    with_test_db("edit_once", || {
        cmd_add(
            "Standup".into(),
            None,
            Priority::Medium,
            Some("2025-12-01".into()),
            None,
            None,
            Some("2025-12-05".into()),
            true,
        );
        let id = load_index().tasks().next().unwrap().id.clone();

        cmd_edit(
            id.clone(),
            None,
            None,
            None,
            None,
            None,
            None,
            None,
            true,
            true,
        );

        let index = load_index();
        let task = index.find(&id).unwrap();
        assert!(!task.is_series());
        assert!(index.tasks_for_date(date("2025-12-02")).is_empty());
        assert_eq!(index.tasks_for_date(date("2025-12-01")).len(), 1);
    });
}

#[test]
fn remove_deletes_the_task() {
    with_test_db("remove", || {
        cmd_add(
            "Dentist".into(),
            None,
            Priority::Medium,
            Some("2025-02-01".into()),
            None,
            None,
            None,
            true,
        );
        let id = load_index().tasks().next().unwrap().id.clone();

        cmd_remove(id, true);
        assert!(load_index().is_empty());
    });
}

#[test]
fn remove_of_a_missing_id_changes_nothing() {
    with_test_db("remove_missing", || {
        cmd_add(
            "Dentist".into(),
            None,
            Priority::Medium,
            Some("2025-02-01".into()),
            None,
            None,
            None,
            true,
        );
        let before = load_index();

        cmd_remove("does-not-exist".into(), true);

        assert_eq!(load_index(), before);
    });
}
