//! Key-value preference storage for the last sleep mode
//!
//! The controller only talks to the [`PersistentStore`] trait. Production code
//! uses [`TomlStore`], a flat TOML table kept next to the config file; tests use
//! [`MemoryStore`].

use crate::constants::APP_DIR_NAME;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use toml::{Table, Value};

/// Minimal string/number preference store
pub trait PersistentStore {
    fn get_string(&self, key: &str) -> Option<String>;
    fn get_f64(&self, key: &str) -> Option<f64>;
    fn set_string(&mut self, key: &str, value: &str) -> Result<()>;
    fn set_f64(&mut self, key: &str, value: f64) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;

    /// Apply several changes as one update
    ///
    /// File-backed stores override this to write the record once.
    fn apply_changes(&mut self, changes: &[StoreChange<'_>]) -> Result<()> {
        for change in changes {
            match *change {
                StoreChange::SetString(key, value) => self.set_string(key, value)?,
                StoreChange::SetF64(key, value) => self.set_f64(key, value)?,
                StoreChange::Remove(key) => self.remove(key)?,
            }
        }
        Ok(())
    }
}

/// One mutation in a batched [`PersistentStore::apply_changes`] call
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StoreChange<'a> {
    SetString(&'a str, &'a str),
    SetF64(&'a str, f64),
    Remove(&'a str),
}

#[derive(Debug, Clone, PartialEq)]
enum StoredValue {
    Text(String),
    Number(f64),
}

/// In-memory store, nothing survives the process
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, StoredValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

impl PersistentStore for MemoryStore {
    fn get_string(&self, key: &str) -> Option<String> {
        match self.values.get(key) {
            Some(StoredValue::Text(text)) => Some(text.clone()),
            _ => None,
        }
    }

    fn get_f64(&self, key: &str) -> Option<f64> {
        match self.values.get(key) {
            Some(StoredValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    fn set_string(&mut self, key: &str, value: &str) -> Result<()> {
        self.values
            .insert(key.to_string(), StoredValue::Text(value.to_string()));
        Ok(())
    }

    fn set_f64(&mut self, key: &str, value: f64) -> Result<()> {
        self.values.insert(key.to_string(), StoredValue::Number(value));
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// File-backed store holding a flat TOML table
///
/// Every mutation rewrites the whole file. A missing or unreadable file opens
/// as an empty store so a corrupt state file never blocks startup.
#[derive(Debug)]
pub struct TomlStore {
    path: PathBuf,
    table: Table,
}

impl TomlStore {
    /// Get the standard state file path
    ///
    /// - macOS: `~/Library/Application Support/sleeplock/state.toml`
    /// - Linux: `~/.config/sleeplock/state.toml`
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join(APP_DIR_NAME);

        Ok(config_dir.join("state.toml"))
    }

    /// Open the store at the standard location
    pub fn open_default() -> Result<Self> {
        Ok(Self::open(Self::default_path()?))
    }

    /// Open the store at `path`, starting empty if the file is absent or malformed
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let table = match Self::read_table(&path) {
            Ok(table) => table,
            Err(e) => {
                if path.exists() {
                    log::warn!("Ignoring unreadable state file {}: {:#}", path.display(), e);
                } else {
                    log::debug!("No state file at {}, starting empty", path.display());
                }
                Table::new()
            }
        };

        Self { path, table }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_table(path: &Path) -> Result<Table> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;
        toml::from_str::<Table>(&contents).context("Failed to parse state file")
    }

    /// Table change for one mutation; returns false when nothing changed
    fn update_table(&mut self, change: StoreChange<'_>) -> bool {
        match change {
            StoreChange::SetString(key, value) => {
                self.table
                    .insert(key.to_string(), Value::String(value.to_string()));
                true
            }
            StoreChange::SetF64(key, value) => {
                self.table.insert(key.to_string(), Value::Float(value));
                true
            }
            StoreChange::Remove(key) => self.table.remove(key).is_some(),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Write the whole table to a sibling temp file, then rename it over the state file
    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create state directory")?;
        }

        let contents = toml::to_string_pretty(&self.table).context("Failed to serialize state")?;
        let temp = self.temp_path();
        fs::write(&temp, contents)
            .with_context(|| format!("Failed to write state file: {}", temp.display()))?;
        fs::rename(&temp, &self.path)
            .with_context(|| format!("Failed to replace state file: {}", self.path.display()))?;

        log::debug!("State saved to: {}", self.path.display());
        Ok(())
    }
}

impl PersistentStore for TomlStore {
    fn get_string(&self, key: &str) -> Option<String> {
        self.table
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn get_f64(&self, key: &str) -> Option<f64> {
        match self.table.get(key)? {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    fn set_string(&mut self, key: &str, value: &str) -> Result<()> {
        self.apply_changes(&[StoreChange::SetString(key, value)])
    }

    fn set_f64(&mut self, key: &str, value: f64) -> Result<()> {
        self.apply_changes(&[StoreChange::SetF64(key, value)])
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.apply_changes(&[StoreChange::Remove(key)])
    }

    fn apply_changes(&mut self, changes: &[StoreChange<'_>]) -> Result<()> {
        let mut changed = false;
        for change in changes {
            changed |= self.update_table(*change);
        }
        if changed {
            self.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_state_path() -> PathBuf {
        use std::thread;
        use std::time::{SystemTime, UNIX_EPOCH};

        let mut base = std::env::temp_dir();
        base.push("sleeplock_tests");
        base.push("store");

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let tid = format!("{:?}", thread::current().id());
        base.push(format!("t_{nanos}_{tid}"));

        base.join("state.toml")
    }

    #[test]
    fn test_memory_store_types_are_separate() {
        let mut store = MemoryStore::new();
        store.set_string("mode.kind", "off").unwrap();
        store.set_f64("mode.end", 12.5).unwrap();

        assert_eq!(store.get_string("mode.kind").as_deref(), Some("off"));
        assert_eq!(store.get_f64("mode.end"), Some(12.5));
        // Reading with the wrong type yields nothing rather than a coerced value
        assert_eq!(store.get_f64("mode.kind"), None);
        assert_eq!(store.get_string("mode.end"), None);
    }

    #[test]
    fn test_toml_store_persists_across_reopen() {
        let path = temp_state_path();

        {
            let mut store = TomlStore::open(&path);
            store.set_string("mode.kind", "keepAwakeUntil").unwrap();
            store.set_f64("mode.end", 1_700_000_000.25).unwrap();
        }

        let reopened = TomlStore::open(&path);
        assert_eq!(
            reopened.get_string("mode.kind").as_deref(),
            Some("keepAwakeUntil")
        );
        assert_eq!(reopened.get_f64("mode.end"), Some(1_700_000_000.25));

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_toml_store_remove_clears_key_on_disk() {
        let path = temp_state_path();

        let mut store = TomlStore::open(&path);
        store.set_string("mode.kind", "allowSleepAfter").unwrap();
        store.set_f64("mode.end", 99.0).unwrap();
        store.remove("mode.end").unwrap();

        let reopened = TomlStore::open(&path);
        assert_eq!(reopened.get_f64("mode.end"), None);
        assert!(reopened.get_string("mode.kind").is_some());

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_toml_store_batch_replaces_whole_record() {
        let path = temp_state_path();

        let mut store = TomlStore::open(&path);
        store
            .apply_changes(&[
                StoreChange::SetString("mode.kind", "allowSleepAfter"),
                StoreChange::SetF64("mode.end", 99.0),
            ])
            .unwrap();
        store
            .apply_changes(&[
                StoreChange::SetString("mode.kind", "keepAwakeInfinite"),
                StoreChange::Remove("mode.end"),
            ])
            .unwrap();

        let on_disk = fs::read_to_string(&path).unwrap();
        assert!(on_disk.contains("keepAwakeInfinite"));
        assert!(!on_disk.contains("mode.end"), "Stale end must not survive: {}", on_disk);
        assert!(!store.temp_path().exists(), "Temp file is renamed away");

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_memory_store_batch_uses_single_key_operations() {
        let mut store = MemoryStore::new();
        store.set_f64("mode.end", 5.0).unwrap();
        store
            .apply_changes(&[
                StoreChange::SetString("mode.kind", "off"),
                StoreChange::Remove("mode.end"),
            ])
            .unwrap();

        assert_eq!(store.get_string("mode.kind").as_deref(), Some("off"));
        assert!(!store.contains("mode.end"));
    }

    #[test]
    fn test_toml_store_malformed_file_opens_empty() {
        let path = temp_state_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "this is = = not toml").unwrap();

        let store = TomlStore::open(&path);
        assert_eq!(store.get_string("mode.kind"), None);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_toml_store_integer_end_is_accepted() {
        let path = temp_state_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "\"mode.kind\" = \"keepAwakeUntil\"\n\"mode.end\" = 1700000000\n")
            .unwrap();

        let store = TomlStore::open(&path);
        assert_eq!(store.get_f64("mode.end"), Some(1_700_000_000.0));

        fs::remove_file(&path).ok();
    }
}
