use std::collections::BTreeSet;
use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// How important a task is. A display and sort hint only; it never affects
/// which date a task is due on.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

/// When a task occurs: pinned to one calendar day, or repeating on every day
/// of an inclusive date range.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Schedule {
    /// One occurrence on one day.
    Single {
        date: NaiveDate,
        /// The day this task was first moved away from. Set once, by the
        /// first reschedule, and never overwritten afterwards.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        original_due_date: Option<NaiveDate>,
        #[serde(default)]
        rescheduled: bool,
    },
    /// Occurs on every day of `[start_date, end_date]`, minus the listed
    /// exceptions (days whose occurrence was detached via reschedule).
    Series {
        start_date: NaiveDate,
        end_date: NaiveDate,
        #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
        exceptions: BTreeSet<NaiveDate>,
    },
}

/// A single task in the planner.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Opaque unique identifier, stable across edits and reschedules.
    pub id: String,
    /// The task title.
    pub title: String,
    /// Optional rich-text description, passed through as an opaque blob.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    /// Start time of day. Absent means the task is an all-day item.
    #[serde(default, with = "hhmm", skip_serializing_if = "Option::is_none")]
    pub time_start: Option<NaiveTime>,
    /// End time of day.
    #[serde(default, with = "hhmm", skip_serializing_if = "Option::is_none")]
    pub time_end: Option<NaiveTime>,
    /// Whether the task has been completed. Toggled independently of dates.
    #[serde(default)]
    pub completed: bool,
    /// When the task occurs. Flattened on the wire under a `kind` tag.
    #[serde(flatten)]
    pub schedule: Schedule,
}

impl Task {
    /// The calendar date this task is physically stored under: its due date,
    /// or the series start date for repeating tasks.
    pub fn storage_key(&self) -> NaiveDate {
        match self.schedule {
            Schedule::Single { date, .. } => date,
            Schedule::Series { start_date, .. } => start_date,
        }
    }

    /// Whether this task is a repeating series.
    pub fn is_series(&self) -> bool {
        matches!(self.schedule, Schedule::Series { .. })
    }
}

/// Mints a fresh opaque task id. The remote store may replace it with its
/// own on create.
pub fn new_task_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Parses a calendar date in `YYYY-MM-DD` form.
///
/// The planner is timezone-naive: a date is a calendar day, nothing more.
pub fn parse_date(s: &str) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| Error::MalformedDate(s.to_string()))
}

/// Parses a 24-hour `HH:MM` time of day.
pub fn parse_time(s: &str) -> Result<NaiveTime, Error> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|_| Error::MalformedTime(s.to_string()))
}

/// Times cross the wire and the snapshot file as `HH:MM` (24-hour) or null.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(t) => serializer.serialize_str(&t.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| NaiveTime::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom))
            .transpose()
    }
}
