//! File-backed key/value storage.
//!
//! Keeps every key in one JSON object on disk, rewritten on each change.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::KeyValueStore;
use crate::PortalError;

/// Durable storage in a single JSON file.
///
/// # Example
///
/// ```rust,ignore
/// use campusgate::storage::FileStore;
///
/// let durable = FileStore::new("/var/lib/portal/durable.json")?;
/// ```
pub struct FileStore {
    path: PathBuf,
    // serialises read-modify-write cycles within the process
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Creates the parent directory if it doesn't exist. The file itself is
    /// created on first write.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, PortalError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                PortalError::StorageError(format!("Failed to create storage directory: {e}"))
            })?;
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// A file that doesn't parse reads as empty; the next write replaces it.
    fn read_all(&self) -> Result<BTreeMap<String, String>, PortalError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| PortalError::StorageError(format!("Failed to read storage file: {e}")))?;

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        match serde_json::from_str(&content) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                log::warn!(
                    target: "campusgate",
                    "msg=\"malformed storage file, reading as empty\", path=\"{}\", error=\"{e}\"",
                    self.path.display()
                );
                Ok(BTreeMap::new())
            }
        }
    }

    /// Writes a sibling temp file and renames it over the target, so readers
    /// see either the old or the new contents.
    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), PortalError> {
        let content = serde_json::to_string_pretty(entries)?;
        let tmp_path = self.tmp_path();

        if let Err(e) = std::fs::write(&tmp_path, content) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(PortalError::StorageError(format!(
                "Failed to write storage file: {e}"
            )));
        }

        if let Err(e) = rename_over(&tmp_path, &self.path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(PortalError::StorageError(format!(
                "Failed to replace storage file: {e}"
            )));
        }
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn modify<F>(&self, f: F) -> Result<(), PortalError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| PortalError::StorageError("Lock poisoned".to_owned()))?;

        let mut entries = self.read_all()?;
        f(&mut entries);
        self.write_all(&entries)
    }
}

#[cfg(windows)]
fn rename_over(from: &Path, to: &Path) -> std::io::Result<()> {
    // rename fails on Windows when the target exists
    match std::fs::remove_file(to) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    std::fs::rename(from, to)
}

#[cfg(not(windows))]
fn rename_over(from: &Path, to: &Path) -> std::io::Result<()> {
    std::fs::rename(from, to)
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PortalError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PortalError> {
        self.modify(|entries| {
            entries.insert(key.to_owned(), value.to_owned());
        })
    }

    fn remove(&self, key: &str) -> Result<(), PortalError> {
        self.modify(|entries| {
            entries.remove(key);
        })
    }
}
