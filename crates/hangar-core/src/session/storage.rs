//! Durable client-side key/value storage.
//!
//! `FileStorage` keeps every key in one JSON object at
//! `<HANGAR_HOME>/storage.json`, written with restricted permissions (0600).
//! Values are never logged.

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};

use crate::config::paths;

/// Key/value storage backing the session and preferences.
pub trait Storage: Send + Sync {
    /// Returns the value for `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`.
    ///
    /// # Errors
    /// Returns an error if the value could not be persisted.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    /// Returns an error if the removal could not be persisted.
    fn remove(&self, key: &str) -> Result<()>;

    /// Removes `key` only while it still holds `expected`.
    ///
    /// Returns whether the key was removed. The check and the removal happen
    /// under one lock.
    ///
    /// # Errors
    /// Returns an error if the removal could not be persisted.
    fn remove_if(&self, key: &str, expected: &str) -> Result<bool>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// File-backed storage (one JSON object per file).
///
/// Several processes may share one file. Every change re-reads the file
/// under an exclusive lock on a sibling `.lock` file, applies the single-key
/// change and writes the result, so a change never discards keys another
/// process wrote in the meantime. Reads go to disk too and fall back to the
/// last known entries when the file cannot be read.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

fn read_entries(path: &Path) -> Result<BTreeMap<String, String>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read storage from {}", path.display()))?;
    if contents.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse storage from {}", path.display()))
}

impl FileStorage {
    /// Opens the storage file at the default location.
    ///
    /// # Errors
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn open_default() -> Result<Self> {
        Self::open(paths::storage_path())
    }

    /// Opens the storage file at `path`. A missing file is an empty store.
    ///
    /// # Errors
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = read_entries(&path)?;

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Returns the path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Takes the cross-process write lock; released when the file drops.
    fn lock_file(&self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let lock_path = self.path.with_extension("json.lock");
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .with_context(|| format!("Failed to open {}", lock_path.display()))?;
        file.lock()
            .with_context(|| format!("Failed to lock {}", lock_path.display()))?;
        Ok(file)
    }

    /// Applies `change` to the current on-disk entries.
    ///
    /// `change` returns its outcome and whether it modified the map. The
    /// cached entries are replaced only once the write has succeeded.
    fn update<T>(
        &self,
        change: impl FnOnce(&mut BTreeMap<String, String>) -> (T, bool),
    ) -> Result<T> {
        let mut cached = lock(&self.entries);
        let _file_lock = self.lock_file()?;

        let mut entries = read_entries(&self.path)?;
        let (outcome, changed) = change(&mut entries);
        if changed {
            self.persist(&entries)?;
        }
        *cached = entries;
        Ok(outcome)
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let contents =
            serde_json::to_string_pretty(entries).context("Failed to serialize storage")?;
        let tmp_path = self.path.with_extension("json.tmp");

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&tmp_path)
                .with_context(|| format!("Failed to open {} for writing", tmp_path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", tmp_path.display()))?;
        }

        #[cfg(not(unix))]
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&tmp_path)
                .with_context(|| format!("Failed to open {} for writing", tmp_path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", tmp_path.display()))?;
        }

        fs::rename(&tmp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                self.path.display()
            )
        })
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        let mut cached = lock(&self.entries);
        match read_entries(&self.path) {
            Ok(entries) => *cached = entries,
            Err(e) => tracing::warn!(error = %e, "using last known storage entries"),
        }
        cached.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|entries| {
            let changed = entries.get(key).is_none_or(|current| current != value);
            entries.insert(key.to_string(), value.to_string());
            ((), changed)
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|entries| ((), entries.remove(key).is_some()))
    }

    fn remove_if(&self, key: &str, expected: &str) -> Result<bool> {
        self.update(|entries| {
            let matches = entries.get(key).is_some_and(|v| v == expected);
            if matches {
                entries.remove(key);
            }
            (matches, matches)
        })
    }
}

/// In-process storage; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        lock(&self.entries).remove(key);
        Ok(())
    }

    fn remove_if(&self, key: &str, expected: &str) -> Result<bool> {
        let mut entries = lock(&self.entries);
        if entries.get(key).is_some_and(|v| v == expected) {
            entries.remove(key);
            return Ok(true);
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn file_storage_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let storage = FileStorage::open(&path).unwrap();
        storage.set("hangar_token", "abc").unwrap();
        storage.set("lang", "en").unwrap();
        drop(storage);

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get("hangar_token").as_deref(), Some("abc"));
        assert_eq!(reopened.get("lang").as_deref(), Some("en"));
    }

    #[test]
    fn file_storage_remove_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("storage.json");

        let storage = FileStorage::open(&path).unwrap();
        storage.set("hangar_token", "abc").unwrap();
        storage.remove("hangar_token").unwrap();
        storage.remove("never-set").unwrap();

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get("hangar_token"), None);
    }

    #[cfg(unix)]
    #[test]
    fn file_storage_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let storage = FileStorage::open(&path).unwrap();
        storage.set("hangar_token", "abc").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn file_storage_rejects_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "{not json").unwrap();

        let err = FileStorage::open(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse storage"));
    }

    #[test]
    fn instances_sharing_a_file_keep_each_others_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("storage.json");
        FileStorage::open(&path)
            .unwrap()
            .set("hangar_token", "T")
            .unwrap();

        let first = FileStorage::open(&path).unwrap();
        let second = FileStorage::open(&path).unwrap();

        second.set("lang", "en").unwrap();
        assert_eq!(first.get("lang").as_deref(), Some("en"));
        assert!(first.remove_if("hangar_token", "T").unwrap());

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get("lang").as_deref(), Some("en"));
        assert_eq!(reopened.get("hangar_token"), None);
        assert_eq!(second.get("hangar_token"), None);
    }

    #[test]
    fn remove_if_sees_token_written_by_another_instance() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("storage.json");

        let stale = FileStorage::open(&path).unwrap();
        let fresh = FileStorage::open(&path).unwrap();
        stale.set("hangar_token", "old").unwrap();
        fresh.set("hangar_token", "new").unwrap();

        assert!(!stale.remove_if("hangar_token", "old").unwrap());
        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get("hangar_token").as_deref(), Some("new"));
    }

    #[test]
    fn failed_write_leaves_entries_unchanged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let storage = FileStorage::open(&path).unwrap();
        storage.set("lang", "en").unwrap();

        // A directory where the temp file goes makes every write fail.
        fs::create_dir(path.with_extension("json.tmp")).unwrap();

        assert!(storage.set("hangar_token", "abc").is_err());
        assert_eq!(storage.get("hangar_token"), None);
        assert!(storage.remove("lang").is_err());
        assert_eq!(storage.get("lang").as_deref(), Some("en"));
    }

    #[test]
    fn remove_if_only_matches_expected_value() {
        let storage = MemoryStorage::new();
        storage.set("k", "one").unwrap();

        assert!(!storage.remove_if("k", "two").unwrap());
        assert_eq!(storage.get("k").as_deref(), Some("one"));
        assert!(storage.remove_if("k", "one").unwrap());
        assert!(!storage.remove_if("k", "one").unwrap());
    }
}
