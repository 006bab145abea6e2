use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::PathBuf;

use crate::index::TaskIndex;

/// Returns the path to the snapshot file (`tasks.json`).
///
/// The path is determined in the following order:
/// 1. `DAYBOOK_DB` environment variable.
/// 2. `~/.local/share/daybook/tasks.json` (on Linux).
/// 3. `./tasks.json` (fallback).
fn db_path() -> PathBuf {
    std::env::var("DAYBOOK_DB").map(PathBuf::from).unwrap_or_else(|_| {
        let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        p.push("daybook");
        if !p.exists() {
            let _ = fs::create_dir_all(&p);
        }
        p.push("tasks.json");
        p
    })
}

/// Loads the task index from the snapshot file.
///
/// Returns an empty index if the file does not exist or cannot be read; the
/// snapshot is a cache, never a reason to fail a command.
pub fn load_index() -> TaskIndex {
    let path = db_path();
    if !path.exists() {
        return TaskIndex::new();
    }
    let mut f = match OpenOptions::new().read(true).open(&path) {
        Ok(f) => f,
        Err(_) => return TaskIndex::new(),
    };
    let mut s = String::new();
    if f.read_to_string(&mut s).is_err() {
        return TaskIndex::new();
    }
    serde_json::from_str(&s).unwrap_or_else(|_| TaskIndex::new())
}

/// Writes the full bucket map to the snapshot file.
///
/// Overwrites the existing file. A failed write leaves the in-memory index
/// untouched; the caller decides how loudly to report it.
pub fn save_index(index: &TaskIndex) -> std::io::Result<()> {
    let path = db_path();
    let s = serde_json::to_string_pretty(index).unwrap();
    let mut f = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&path)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}
