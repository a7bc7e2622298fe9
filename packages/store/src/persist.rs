//! Persistence of the selected date across sessions.
//!
//! The date lives under a single key (`selected_date`) in a small JSON
//! state file. A missing file, a missing key or an unparseable value all
//! rehydrate as "no saved date", and the store falls back to today.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::NaiveDate;
use thiserror::Error;

/// Key under which the selected date is stored.
pub const SELECTED_DATE_KEY: &str = "selected_date";

/// Default state file location.
pub const DEFAULT_STATE_PATH: &str = "data/state.json";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors from writing persisted state.
#[derive(Debug, Error)]
pub enum PersistError {
    /// The state file could not be written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The state could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Storage for the selected date.
pub trait DateStore: Send + Sync {
    /// The saved date, or `None` if absent or unparseable.
    fn load(&self) -> Option<NaiveDate>;

    /// Saves `date`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError`] if the value cannot be written.
    fn save(&self, date: NaiveDate) -> Result<(), PersistError>;
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let parsed = NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok();
    if parsed.is_none() {
        log::warn!("Ignoring unparseable saved date {raw:?}");
    }
    parsed
}

/// A JSON state file on disk.
pub struct FileDateStore {
    path: PathBuf,
}

impl FileDateStore {
    /// Uses the state file at `path`. The file is created on first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Uses `BLACKOUT_MAP_STATE`, or [`DEFAULT_STATE_PATH`] when unset.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(
            std::env::var("BLACKOUT_MAP_STATE").unwrap_or_else(|_| DEFAULT_STATE_PATH.to_string()),
        )
    }

    /// The state file location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_object(&self) -> serde_json::Map<String, serde_json::Value> {
        std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|text| serde_json::from_str::<serde_json::Value>(&text).ok())
            .and_then(|value| match value {
                serde_json::Value::Object(map) => Some(map),
                _ => None,
            })
            .unwrap_or_default()
    }
}

impl DateStore for FileDateStore {
    fn load(&self) -> Option<NaiveDate> {
        let object = self.read_object();
        let raw = object.get(SELECTED_DATE_KEY)?.as_str()?;
        parse_date(raw)
    }

    fn save(&self, date: NaiveDate) -> Result<(), PersistError> {
        let mut object = self.read_object();
        object.insert(
            SELECTED_DATE_KEY.to_string(),
            serde_json::Value::String(date.format(DATE_FORMAT).to_string()),
        );

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(&serde_json::Value::Object(object))?;
        std::fs::write(&self.path, text)?;
        Ok(())
    }
}

/// In-process storage holding the raw saved string.
#[derive(Default)]
pub struct MemoryDateStore {
    raw: Mutex<Option<String>>,
}

impl MemoryDateStore {
    /// Starts with `raw` already saved, parseable or not.
    #[must_use]
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Mutex::new(Some(raw.into())),
        }
    }

    /// The raw saved string.
    #[must_use]
    pub fn raw(&self) -> Option<String> {
        self.raw
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DateStore for MemoryDateStore {
    fn load(&self) -> Option<NaiveDate> {
        self.raw().as_deref().and_then(parse_date)
    }

    fn save(&self, date: NaiveDate) -> Result<(), PersistError> {
        *self.raw.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(date.format(DATE_FORMAT).to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("blackout_map_persist_{}_{name}", std::process::id()))
            .join("state.json")
    }

    #[test]
    fn file_round_trip_keeps_other_keys() {
        let path = temp_path("round_trip");
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"theme": "dark"}"#).unwrap();

        let store = FileDateStore::new(&path);
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        store.save(date).unwrap();

        assert_eq!(store.load(), Some(date));
        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["theme"], "dark");
        assert_eq!(saved[SELECTED_DATE_KEY], "2024-02-29");

        std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn missing_file_loads_nothing() {
        let store = FileDateStore::new(temp_path("missing"));
        assert_eq!(store.load(), None);
    }

    #[test]
    fn corrupt_file_loads_nothing() {
        let path = temp_path("corrupt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();

        assert_eq!(FileDateStore::new(&path).load(), None);

        std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn unparseable_memory_value_loads_nothing() {
        assert_eq!(MemoryDateStore::with_raw("Invalid Date").load(), None);
        assert_eq!(
            MemoryDateStore::with_raw("2024-01-15").load(),
            NaiveDate::from_ymd_opt(2024, 1, 15)
        );
    }
}
