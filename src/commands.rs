use std::collections::BTreeSet;

use chrono::{Local, NaiveTime};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::error::Error;
use crate::index::{Occurrence, TaskIndex};
use crate::models::{new_task_id, parse_date, parse_time, Priority, Schedule, Task};
use crate::remote::{HttpTaskService, TaskPatch, TaskService};
use crate::storage::{load_index, save_index};

/// Adds a new task for a date (default today).
///
/// `until` turns the task into a series repeating on every day from its
/// date through `until` inclusive. When a remote store is configured the
/// task is also created there, and the store's canonical record replaces
/// the local draft on success.
pub fn cmd_add(
    title: String,
    description: Option<String>,
    priority: Priority,
    date: Option<String>,
    from: Option<String>,
    to: Option<String>,
    until: Option<String>,
    silent: bool,
) {
    let date = match date.as_deref().map(parse_date).transpose() {
        Ok(d) => d.unwrap_or_else(|| Local::now().date_naive()),
        Err(e) => {
            if !silent { eprintln!("{e}."); }
            return;
        }
    };
    let (time_start, time_end) = match parse_times(from.as_deref(), to.as_deref()) {
        Ok(times) => times,
        Err(msg) => {
            if !silent { eprintln!("{msg}."); }
            return;
        }
    };
    let schedule = match until.as_deref().map(parse_date).transpose() {
        Ok(Some(end_date)) => {
            if end_date < date {
                if !silent {
                    eprintln!("Repetition end {end_date} precedes start {date}.");
                }
                return;
            }
            Schedule::Series {
                start_date: date,
                end_date,
                exceptions: BTreeSet::new(),
            }
        }
        Ok(None) => Schedule::Single {
            date,
            original_due_date: None,
            rescheduled: false,
        },
        Err(e) => {
            if !silent { eprintln!("{e}."); }
            return;
        }
    };

    let task = Task {
        id: new_task_id(),
        title,
        description,
        priority,
        time_start,
        time_end,
        completed: false,
        schedule,
    };

    let mut index = load_index();
    index.insert(task.clone());

    let mut stored_id = task.id.clone();
    if let Some(remote) = HttpTaskService::from_env() {
        match remote.create(&task) {
            Ok(canonical) => {
                index.delete(&task.id);
                stored_id = canonical.id.clone();
                index.insert(canonical);
            }
            Err(e) => {
                if !silent { eprintln!("Task kept locally; remote create failed: {e}"); }
            }
        }
    }

    if let Err(e) = save_index(&index) {
        if !silent { eprintln!("Failed to save tasks: {e}"); }
    } else if !silent {
        println!("Task added ({}).", short_id(&stored_id));
    }
}

/// Prints the agenda for a date (default today): all-day items first, then
/// timed items in start-time order.
pub fn cmd_agenda(date: Option<String>) {
    let date = match date.as_deref().map(parse_date).transpose() {
        Ok(d) => d.unwrap_or_else(|| Local::now().date_naive()),
        Err(e) => {
            eprintln!("{e}.");
            return;
        }
    };

    let index = load_index();
    let occurrences = index.tasks_for_date(date);
    if occurrences.is_empty() {
        println!("Nothing planned for {date}.");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Time").add_attribute(Attribute::Bold),
            Cell::new("Title").add_attribute(Attribute::Bold),
            Cell::new("Priority").add_attribute(Attribute::Bold),
            Cell::new("Schedule").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
        ]);

    for occ in &occurrences {
        let t = &occ.task;
        let priority_color = if t.completed {
            Color::Grey
        } else {
            match t.priority {
                Priority::High => Color::Red,
                Priority::Medium => Color::Yellow,
                Priority::Low => Color::Green,
            }
        };
        let status = if t.completed { "Done" } else { "Planned" };
        let status_color = if t.completed { Color::Green } else { Color::Yellow };

        table.add_row(vec![
            Cell::new(short_id(&t.id)),
            Cell::new(time_span(t)),
            Cell::new(&t.title),
            Cell::new(t.priority.to_string()).fg(priority_color),
            Cell::new(schedule_note(occ)),
            Cell::new(status).fg(status_color),
        ]);
    }

    println!("{table}");
}

/// Lists incomplete tasks left behind on past dates, oldest first.
pub fn cmd_overdue() {
    let index = load_index();
    let today = Local::now().date_naive();
    let overdue = index.overdue_tasks(today);
    if overdue.is_empty() {
        println!("No overdue tasks.");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Due").add_attribute(Attribute::Bold),
            Cell::new("Late").add_attribute(Attribute::Bold),
            Cell::new("Title").add_attribute(Attribute::Bold),
            Cell::new("Priority").add_attribute(Attribute::Bold),
        ]);

    for occ in &overdue {
        let days_late = (today - occ.date).num_days();
        table.add_row(vec![
            Cell::new(short_id(&occ.task.id)),
            Cell::new(occ.date),
            Cell::new(format!("{days_late}d")).fg(Color::Red),
            Cell::new(&occ.task.title),
            Cell::new(occ.task.priority.to_string()),
        ]);
    }

    println!("{table}");
    println!("Use `daybook done <id>` or `daybook move <id> <date>` to clear them.");
}

/// Toggles a task between done and pending.
pub fn cmd_done(id: String, silent: bool) {
    let mut index = load_index();
    let id = match index.resolve_id(&id) {
        Ok(id) => id,
        Err(e) => {
            if !silent { eprintln!("{e}."); }
            return;
        }
    };
    let completed = match index.toggle_completed(&id) {
        Ok(c) => c,
        Err(e) => {
            if !silent { eprintln!("{e}."); }
            return;
        }
    };

    if let Some(remote) = HttpTaskService::from_env() {
        let patch = TaskPatch {
            completed: Some(completed),
            ..TaskPatch::default()
        };
        if let Err(e) = remote.update(&id, &patch) {
            if !silent { eprintln!("Change kept locally; remote update failed: {e}"); }
        }
    }

    if let Err(e) = save_index(&index) {
        if !silent { eprintln!("Failed to save tasks: {e}"); }
    } else if !silent {
        println!(
            "Task {} marked as {}.",
            short_id(&id),
            if completed { "done" } else { "pending" }
        );
    }
}

/// Moves a task to another date.
///
/// A repeating task is not moved wholesale: the one occurrence is detached
/// into an independent task on the new date and the series skips its old
/// day. `no_mark` leaves the rescheduled flag as it was, for moves the user
/// does not want called out later.
pub fn cmd_move(id: String, date: String, no_mark: bool, silent: bool) {
    let new_date = match parse_date(&date) {
        Ok(d) => d,
        Err(e) => {
            if !silent { eprintln!("{e}."); }
            return;
        }
    };

    let mut index = load_index();
    let id = match index.resolve_id(&id) {
        Ok(id) => id,
        Err(e) => {
            if !silent { eprintln!("{e}."); }
            return;
        }
    };
    let was_series = index.find(&id).map(Task::is_series).unwrap_or(false);
    if let Err(e) = index.reschedule(&id, new_date, !no_mark) {
        if !silent { eprintln!("{e}."); }
        return;
    }

    if let Some(remote) = HttpTaskService::from_env() {
        let result = if was_series {
            // The detached instance is a brand-new row for the store; the
            // next sync reconciles ids.
            let detached = index
                .tasks()
                .find(|t| t.id == id && !t.is_series() && t.storage_key() == new_date)
                .cloned();
            match detached {
                Some(task) => remote.create(&task).map(|_| ()),
                None => Ok(()),
            }
        } else {
            let patch = TaskPatch {
                date: Some(new_date),
                ..TaskPatch::default()
            };
            remote.update(&id, &patch).map(|_| ())
        };
        if let Err(e) = result {
            if !silent { eprintln!("Move kept locally; remote sync failed: {e}"); }
        }
    }

    if let Err(e) = save_index(&index) {
        if !silent { eprintln!("Failed to save tasks: {e}"); }
    } else if !silent {
        println!("Task {} moved to {new_date}.", short_id(&id));
    }
}

/// Edits a task's details. Only the provided fields change.
///
/// `until` extends the task into a repeating series (or moves an existing
/// series' end date); `once` drops repetition and pins the task to a single
/// day.
#[allow(clippy::too_many_arguments)]
pub fn cmd_edit(
    id: String,
    title: Option<String>,
    description: Option<String>,
    priority: Option<Priority>,
    date: Option<String>,
    from: Option<String>,
    to: Option<String>,
    until: Option<String>,
    once: bool,
    silent: bool,
) {
    let new_date = match date.as_deref().map(parse_date).transpose() {
        Ok(d) => d,
        Err(e) => {
            if !silent { eprintln!("{e}."); }
            return;
        }
    };
    let new_until = match until.as_deref().map(parse_date).transpose() {
        Ok(d) => d,
        Err(e) => {
            if !silent { eprintln!("{e}."); }
            return;
        }
    };
    let (time_start, time_end) = match parse_times(from.as_deref(), to.as_deref()) {
        Ok(times) => times,
        Err(msg) => {
            if !silent { eprintln!("{msg}."); }
            return;
        }
    };

    let mut index = load_index();
    let id = match index.resolve_id(&id) {
        Ok(id) => id,
        Err(e) => {
            if !silent { eprintln!("{e}."); }
            return;
        }
    };
    let Some(stored) = index.find(&id).cloned() else {
        return;
    };

    let mut task = stored.clone();
    if let Some(t) = title {
        task.title = t;
    }
    if let Some(d) = description {
        task.description = Some(d);
    }
    if let Some(p) = priority {
        task.priority = p;
    }
    if let Some(t) = time_start {
        task.time_start = Some(t);
    }
    if let Some(t) = time_end {
        task.time_end = Some(t);
    }

    task.schedule = match (stored.schedule, once, new_until) {
        (
            Schedule::Single {
                date,
                original_due_date,
                rescheduled,
            },
            _,
            None,
        )
        | (
            Schedule::Single {
                date,
                original_due_date,
                rescheduled,
            },
            true,
            Some(_),
        ) => Schedule::Single {
            date: new_date.unwrap_or(date),
            original_due_date,
            rescheduled,
        },
        (Schedule::Single { date, .. }, false, Some(end_date)) => Schedule::Series {
            start_date: new_date.unwrap_or(date),
            end_date,
            exceptions: BTreeSet::new(),
        },
        (Schedule::Series { start_date, .. }, true, _) => Schedule::Single {
            date: new_date.unwrap_or(start_date),
            original_due_date: None,
            rescheduled: false,
        },
        (
            Schedule::Series {
                start_date,
                end_date,
                exceptions,
            },
            false,
            maybe_end,
        ) => Schedule::Series {
            start_date: new_date.unwrap_or(start_date),
            end_date: maybe_end.unwrap_or(end_date),
            exceptions,
        },
    };
    if let Schedule::Series {
        start_date,
        end_date,
        ..
    } = task.schedule
    {
        if end_date < start_date {
            if !silent {
                eprintln!("Repetition end {end_date} precedes start {start_date}.");
            }
            return;
        }
    }

    match index.update(task) {
        Ok(()) => {
            if let Err(e) = save_index(&index) {
                if !silent { eprintln!("Failed to save tasks: {e}"); }
            } else if !silent {
                println!("Task {} updated.", short_id(&id));
            }
        }
        Err(e) => {
            if !silent { eprintln!("{e}."); }
        }
    }
}

/// Removes a task. Removing an id that matches nothing is not an error.
pub fn cmd_remove(id: String, silent: bool) {
    let mut index = load_index();
    let id = match index.resolve_id(&id) {
        Ok(id) => id,
        Err(Error::NotFound(_)) => {
            if !silent { println!("No task matching `{id}`; nothing removed."); }
            return;
        }
        Err(e) => {
            if !silent { eprintln!("{e}."); }
            return;
        }
    };

    index.delete(&id);

    if let Some(remote) = HttpTaskService::from_env() {
        if let Err(e) = remote.delete(&id) {
            if !silent { eprintln!("Removed locally; remote delete failed: {e}"); }
        }
    }

    if let Err(e) = save_index(&index) {
        if !silent { eprintln!("Failed to save tasks: {e}"); }
    } else if !silent {
        println!("Task {} removed.", short_id(&id));
    }
}

/// Replaces the local snapshot with the remote store's current state.
///
/// A failed fetch leaves the local tasks exactly as they were.
pub fn cmd_sync(silent: bool) {
    let Some(remote) = HttpTaskService::from_env() else {
        if !silent {
            eprintln!("No remote store configured (set DAYBOOK_API_URL).");
        }
        return;
    };
    match remote.fetch_all() {
        Ok(tasks) => {
            let index = TaskIndex::from_tasks(tasks);
            if let Err(e) = save_index(&index) {
                if !silent { eprintln!("Failed to save tasks: {e}"); }
            } else if !silent {
                println!("Synced {} tasks.", index.len());
            }
        }
        Err(e) => {
            if !silent { eprintln!("Sync failed, local tasks untouched: {e}"); }
        }
    }
}

/// First characters of an id, enough to resolve it back as a prefix.
fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn parse_times(
    from: Option<&str>,
    to: Option<&str>,
) -> Result<(Option<NaiveTime>, Option<NaiveTime>), String> {
    let time_start = from
        .map(parse_time)
        .transpose()
        .map_err(|e| e.to_string())?;
    let time_end = to.map(parse_time).transpose().map_err(|e| e.to_string())?;
    Ok((time_start, time_end))
}

fn time_span(task: &Task) -> String {
    match (task.time_start, task.time_end) {
        (Some(start), Some(end)) => {
            format!("{}-{}", start.format("%H:%M"), end.format("%H:%M"))
        }
        (Some(start), None) => start.format("%H:%M").to_string(),
        _ => "all day".to_string(),
    }
}

fn schedule_note(occ: &Occurrence) -> String {
    match &occ.task.schedule {
        Schedule::Series { end_date, .. } => format!("repeats until {end_date}"),
        Schedule::Single {
            original_due_date: Some(moved_from),
            rescheduled: true,
            ..
        } => format!("moved from {moved_from}"),
        Schedule::Single { .. } => String::new(),
    }
}
