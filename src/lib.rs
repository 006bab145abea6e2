//! # Daybook
//!
//! A terminal day planner written in Rust. Daybook pins tasks to calendar dates, expands repeating tasks across their date range, and keeps you honest about the ones you left behind.
//!
//! ## Features
//!
//! *   **Per-day agenda**: See exactly what is due on any date, all-day items first, timed items in order.
//! *   **Repeating tasks**: A task can repeat on every day of an inclusive date range; occurrences are computed on the fly, never duplicated in storage.
//! *   **Detach on move**: Moving one occurrence of a repeating task turns that day into an independent task and leaves the rest of the series alone.
//! *   **Overdue review**: Incomplete tasks on past dates are collected for triage, oldest first.
//! *   **Remote sync**: Optional, best-effort sync against an authenticated HTTP task store; local data is always the source of truth.
//! *   **Data persistence**: Tasks are stored in standard XDG data directories (JSON format).
//!
//! ## Installation
//!
//! ```bash
//! cargo install --path .
//! ```
//!
//! ## Usage
//!
//! **Adding tasks**
//! ```bash
//! # For today, all day
//! daybook add "Water the plants"
//!
//! # Timed, on a specific date
//! daybook add "Dentist" --date 2025-12-01 --from 09:00 --to 10:00 --priority high
//!
//! # Repeating every day through a date
//! daybook add "Standup" --from 09:30 --until 2025-12-19
//! ```
//!
//! **Viewing**
//! ```bash
//! # Today's agenda (also the default when run with no command)
//! daybook agenda
//!
//! # Any other day
//! daybook agenda 2025-12-01
//!
//! # What you left behind
//! daybook overdue
//! ```
//!
//! **Managing tasks**
//! ```bash
//! # Toggle done/pending; ids may be abbreviated to a unique prefix
//! daybook done 3f2a
//!
//! # Move to another date (detaches a single day from a repeating task)
//! daybook move 3f2a 2025-12-05
//!
//! # Edit fields in place
//! daybook edit 3f2a --title "Dentist (rescheduled)" --priority low
//!
//! # Remove
//! daybook remove 3f2a
//! ```
//!
//! **Remote sync**
//! ```bash
//! export DAYBOOK_API_URL=https://tasks.example.com
//! export DAYBOOK_API_TOKEN=...
//! daybook sync
//! ```
//!
//! ## Data storage
//!
//! Tasks are saved in your local data directory:
//! *   Linux: `~/.local/share/daybook/tasks.json`
//! *   macOS: `~/Library/Application Support/daybook/tasks.json`
//! *   Windows: `%APPDATA%\daybook\tasks.json`
//!
//! You can override this by setting the `DAYBOOK_DB` environment variable.
//! The file is a plain JSON object keyed by calendar date; repeating tasks
//! appear once, under their start date.

pub mod commands;
pub mod error;
pub mod index;
pub mod models;
pub mod remote;
pub mod storage;
