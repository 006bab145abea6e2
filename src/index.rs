use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::models::{Schedule, Task};

/// One day's materialization of a task: a single task on its own date, or
/// one day out of a repeating series' range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    /// The date this occurrence is shown under.
    pub date: NaiveDate,
    /// For series expansions, the true series start date, so callers can
    /// tell a displayed instance from the stored definition. `None` for
    /// physically stored single tasks.
    pub series_start: Option<NaiveDate>,
    pub task: Task,
}

/// The date-bucketed task collection.
///
/// Tasks are stored once, under their storage key (due date, or series start
/// date for repeating tasks). Repeating tasks are expanded into virtual
/// occurrences on every read, never stored per day: with task counts in the
/// tens to low hundreds, recomputing beats bookkeeping.
///
/// Serializes transparently as the bucket map, so the snapshot file is the
/// plain date-to-tasks object.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct TaskIndex {
    buckets: BTreeMap<NaiveDate, Vec<Task>>,
}

impl TaskIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds an index from a flat task list, e.g. a remote fetch result.
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        let mut index = Self::new();
        for task in tasks {
            index.insert(task);
        }
        index
    }

    /// Inserts a task under its storage key. An existing row with the same
    /// id in that bucket is replaced; otherwise the task is appended.
    pub fn insert(&mut self, task: Task) {
        let bucket = self.buckets.entry(task.storage_key()).or_default();
        if let Some(existing) = bucket.iter_mut().find(|t| t.id == task.id) {
            *existing = task;
        } else {
            bucket.push(task);
        }
    }

    /// Every occurrence due on `date`, deduplicated and ordered.
    ///
    /// Single tasks come straight out of the `date` bucket. Repeating tasks
    /// anywhere in the collection contribute a virtual occurrence when
    /// `date` falls inside their inclusive range and is not one of their
    /// exceptions.
    ///
    /// Two occurrences sharing `(id, date)` are duplicates and only the
    /// first survives, so a detached instance shadows its parent series on
    /// days where both would show. Ordering: all-day tasks first, then timed
    /// tasks ascending by start time; ties keep insertion order.
    pub fn tasks_for_date(&self, date: NaiveDate) -> Vec<Occurrence> {
        let mut occurrences = Vec::new();

        if let Some(bucket) = self.buckets.get(&date) {
            for task in bucket.iter().filter(|t| !t.is_series()) {
                occurrences.push(Occurrence {
                    date,
                    series_start: None,
                    task: task.clone(),
                });
            }
        }

        for bucket in self.buckets.values() {
            for task in bucket {
                if let Schedule::Series {
                    start_date,
                    end_date,
                    ref exceptions,
                } = task.schedule
                {
                    if start_date <= date && date <= end_date && !exceptions.contains(&date) {
                        occurrences.push(Occurrence {
                            date,
                            series_start: Some(start_date),
                            task: task.clone(),
                        });
                    }
                }
            }
        }

        let mut seen = HashSet::new();
        occurrences.retain(|occ| seen.insert((occ.task.id.clone(), occ.date)));

        occurrences.sort_by(|a, b| match (a.task.time_start, b.task.time_start) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(x), Some(y)) => x.cmp(&y),
        });

        occurrences
    }

    /// Every incomplete single task stored strictly before `today`, oldest
    /// first.
    ///
    /// Repeating tasks never count: a still-active series is not overdue as
    /// a whole, and per-day completion is only tracked for detached
    /// instances.
    pub fn overdue_tasks(&self, today: NaiveDate) -> Vec<Occurrence> {
        let mut overdue = Vec::new();
        for (&date, bucket) in self.buckets.range(..today) {
            for task in bucket {
                if !task.is_series() && !task.completed {
                    overdue.push(Occurrence {
                        date,
                        series_start: None,
                        task: task.clone(),
                    });
                }
            }
        }
        overdue
    }

    /// Looks up a stored task by exact id. When a detached instance and its
    /// parent series share an id, the row in the earliest bucket wins.
    pub fn find(&self, id: &str) -> Option<&Task> {
        self.locate(id).map(|(date, pos)| &self.buckets[&date][pos])
    }

    /// Resolves a full id or a unique id prefix to the stored id. An exact
    /// match always wins over prefix matches.
    pub fn resolve_id(&self, prefix: &str) -> Result<String, Error> {
        let mut matches = Vec::new();
        for bucket in self.buckets.values() {
            for task in bucket {
                if task.id == prefix {
                    return Ok(task.id.clone());
                }
                if task.id.starts_with(prefix) && !matches.contains(&task.id) {
                    matches.push(task.id.clone());
                }
            }
        }
        match matches.len() {
            0 => Err(Error::NotFound(prefix.to_string())),
            1 => Ok(matches.remove(0)),
            _ => Err(Error::AmbiguousId(prefix.to_string())),
        }
    }

    /// Replaces the stored task with `updated`, moving it between buckets
    /// when its storage key changed and pruning the bucket it left behind.
    ///
    /// An `original_due_date` already present on the stored row is kept when
    /// the incoming row has none; one is never invented here. Only
    /// [`reschedule`](Self::reschedule) sets it.
    pub fn update(&mut self, updated: Task) -> Result<(), Error> {
        let Some((old_key, pos)) = self.locate(&updated.id) else {
            return Err(Error::NotFound(updated.id));
        };

        let stored_original = match self.buckets[&old_key][pos].schedule {
            Schedule::Single {
                original_due_date, ..
            } => original_due_date,
            Schedule::Series { .. } => None,
        };
        let mut updated = updated;
        if let Schedule::Single {
            original_due_date, ..
        } = &mut updated.schedule
        {
            if original_due_date.is_none() {
                *original_due_date = stored_original;
            }
        }

        let new_key = updated.storage_key();
        if new_key == old_key {
            if let Some(bucket) = self.buckets.get_mut(&old_key) {
                bucket[pos] = updated;
            }
        } else {
            self.remove_at(old_key, pos);
            self.insert(updated);
        }
        Ok(())
    }

    /// Moves the task with `id` to `new_date`.
    ///
    /// A single task changes bucket; its `original_due_date` is set to the
    /// date it is leaving the first time this happens and kept as-is on
    /// later moves. A repeating task is split instead: the stored series
    /// stays, the detached day joins its exception set, and an independent
    /// single task with the same id lands under `new_date` with
    /// `original_due_date` pointing at the series start. Nothing ever
    /// re-attaches a detached instance.
    ///
    /// `mark_rescheduled` controls whether the moved row is flagged as
    /// rescheduled; when false an already-set flag is kept. Moving a task
    /// onto the date it is already stored under changes nothing.
    pub fn reschedule(
        &mut self,
        id: &str,
        new_date: NaiveDate,
        mark_rescheduled: bool,
    ) -> Result<(), Error> {
        let Some((old_key, pos)) = self.locate(id) else {
            return Err(Error::NotFound(id.to_string()));
        };
        if old_key == new_date {
            return Ok(());
        }

        let source = self.buckets[&old_key][pos].clone();
        match source.schedule.clone() {
            Schedule::Series { start_date, .. } => {
                if let Some(bucket) = self.buckets.get_mut(&old_key) {
                    if let Schedule::Series { exceptions, .. } = &mut bucket[pos].schedule {
                        exceptions.insert(old_key);
                    }
                }
                self.insert(Task {
                    schedule: Schedule::Single {
                        date: new_date,
                        original_due_date: Some(start_date),
                        rescheduled: mark_rescheduled,
                    },
                    ..source
                });
            }
            Schedule::Single {
                original_due_date,
                rescheduled,
                ..
            } => {
                self.remove_at(old_key, pos);
                self.insert(Task {
                    schedule: Schedule::Single {
                        date: new_date,
                        original_due_date: original_due_date.or(Some(old_key)),
                        rescheduled: mark_rescheduled || rescheduled,
                    },
                    ..source
                });
            }
        }
        Ok(())
    }

    /// Flips the completion flag and returns the new state.
    pub fn toggle_completed(&mut self, id: &str) -> Result<bool, Error> {
        let Some((date, pos)) = self.locate(id) else {
            return Err(Error::NotFound(id.to_string()));
        };
        if let Some(bucket) = self.buckets.get_mut(&date) {
            let task = &mut bucket[pos];
            task.completed = !task.completed;
            return Ok(task.completed);
        }
        Err(Error::NotFound(id.to_string()))
    }

    /// Removes every row with `id`, pruning emptied buckets. Deleting an id
    /// that is not stored is not an error and leaves the collection
    /// untouched; returns whether anything was removed.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.len();
        for bucket in self.buckets.values_mut() {
            bucket.retain(|t| t.id != id);
        }
        self.buckets.retain(|_, bucket| !bucket.is_empty());
        self.len() < before
    }

    /// Number of stored rows (series count once, unexpanded).
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// All stored rows in bucket order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.buckets.values().flatten()
    }

    fn locate(&self, id: &str) -> Option<(NaiveDate, usize)> {
        for (&date, bucket) in &self.buckets {
            if let Some(pos) = bucket.iter().position(|t| t.id == id) {
                return Some((date, pos));
            }
        }
        None
    }

    fn remove_at(&mut self, date: NaiveDate, pos: usize) {
        if let Some(bucket) = self.buckets.get_mut(&date) {
            bucket.remove(pos);
            if bucket.is_empty() {
                self.buckets.remove(&date);
            }
        }
    }
}
