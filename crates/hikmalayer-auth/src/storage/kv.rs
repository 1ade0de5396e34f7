/*
[INPUT]:  String keys and values from the auth layer
[OUTPUT]: In-memory and JSON-file key-value stores
[POS]:    Storage layer - persistence backends
[UPDATE]: When adding store backends or changing the file format
*/

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tempfile::NamedTempFile;

use crate::http::{AuthError, Result};

/// Small persisted key-value interface
///
/// Never used for secrets: tokens, nonces and signatures stay in memory.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory store, for tests and hosts without persistence
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock().remove(key);
        Ok(())
    }
}

/// Store persisted as one JSON object in a file
///
/// Writes go through a temporary file in the same directory and are
/// renamed into place, so a crash never leaves a half-written file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within the process.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&self.path).map_err(storage_error)?;
        serde_json::from_str(&contents)
            .map_err(|e| AuthError::Storage(format!("corrupt store {}: {e}", self.path.display())))
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let parent_dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent_dir).map_err(storage_error)?;

        let mut temp_file = NamedTempFile::new_in(parent_dir).map_err(storage_error)?;
        let json_str = serde_json::to_string_pretty(entries)?;
        temp_file
            .write_all(json_str.as_bytes())
            .map_err(storage_error)?;
        temp_file.flush().map_err(storage_error)?;
        temp_file
            .persist(&self.path)
            .map_err(|e| storage_error(e.error))?;
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_all()?;
        f(&mut entries);
        self.write_all(&entries)
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        self.update(|entries| {
            entries.remove(key);
        })
    }
}

fn storage_error(err: std::io::Error) -> AuthError {
    AuthError::Storage(err.to_string())
}
