//! Key/value storage backing the quote book.
//!
//! Two scopes exist, mirroring what a browser offers a page:
//!
//! - *durable* storage survives restarts and holds the collection and the
//!   last selected category
//! - *session* storage holds the last shown quote and is expected to be
//!   cleared when the session ends
//!
//! Values are opaque strings; callers serialize to JSON themselves.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};

/// Durable key holding the full collection as a JSON array.
pub const QUOTES_KEY: &str = "quotes";
/// Session key holding the last shown quote as a JSON object.
pub const LAST_QUOTE_KEY: &str = "lastQuote";
/// Durable key holding the last selected category filter.
pub const LAST_CATEGORY_KEY: &str = "lastCategory";

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-process storage. Clones share the same entries, which lets a test hand
/// one copy to a store and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries().remove(key);
        Ok(())
    }
}

/// Storage persisted as a single JSON object file.
///
/// The file is re-read on every access so that several processes sharing it
/// see each other's writes; the last writer wins.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        let contents = match fs_err::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(Error::Storage {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };

        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        Ok(serde_json::from_str(&contents)?)
    }

    /// Like `read_all`, but an unparsable file counts as empty so the next
    /// write replaces it instead of failing forever.
    fn read_for_update(&self) -> Result<BTreeMap<String, String>> {
        match self.read_all() {
            Err(Error::Json(e)) => {
                tracing::warn!(
                    path = %self.path.display(),
                    "storage file is not valid JSON, overwriting: {e}"
                );
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let storage_err = |source: std::io::Error| Error::Storage {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs_err::create_dir_all(&dir).map_err(storage_err)?;

        // Write next to the target and rename, so readers never see half a file
        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(storage_err)?;
        serde_json::to_writer_pretty(&mut tmp, entries)?;
        tmp.flush().map_err(storage_err)?;
        tmp.persist(&self.path).map_err(|e| storage_err(e.error))?;

        Ok(())
    }
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.read_for_update()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let mut entries = self.read_for_update()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn memory_storage_clones_share_entries() {
        let mut a = MemoryStorage::new();
        let b = a.clone();

        a.set(QUOTES_KEY, "[]").unwrap();
        assert_eq!(b.get(QUOTES_KEY).unwrap().as_deref(), Some("[]"));

        a.remove(QUOTES_KEY).unwrap();
        assert_eq!(b.get(QUOTES_KEY).unwrap(), None);
    }

    #[test]
    fn file_storage_missing_file_reads_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(tmp.path().join("nope.json"));

        assert_eq!(storage.get(QUOTES_KEY).unwrap(), None);
    }

    #[test]
    fn file_storage_persists_across_instances() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("storage.json");

        let mut first = FileStorage::new(&path);
        first.set(QUOTES_KEY, r#"[{"text":"a","category":"b"}]"#).unwrap();
        first.set(LAST_CATEGORY_KEY, "Life").unwrap();

        let second = FileStorage::new(&path);
        assert_eq!(
            second.get(LAST_CATEGORY_KEY).unwrap().as_deref(),
            Some("Life")
        );
        assert_eq!(
            second.get(QUOTES_KEY).unwrap().as_deref(),
            Some(r#"[{"text":"a","category":"b"}]"#)
        );

        first.remove(LAST_CATEGORY_KEY).unwrap();
        assert_eq!(second.get(LAST_CATEGORY_KEY).unwrap(), None);
    }

    #[test]
    fn file_storage_rejects_garbage() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("storage.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(FileStorage::new(&path).get(QUOTES_KEY).is_err());
    }

    #[test]
    fn file_storage_overwrites_garbage_on_write() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("storage.json");
        std::fs::write(&path, "garbage").unwrap();

        let mut storage = FileStorage::new(&path);
        storage.set(LAST_CATEGORY_KEY, "Life").unwrap();

        assert_eq!(
            storage.get(LAST_CATEGORY_KEY).unwrap().as_deref(),
            Some("Life")
        );
        assert_eq!(storage.get(QUOTES_KEY).unwrap(), None);
    }

    #[test]
    fn file_storage_remove_tolerates_garbage() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("session.json");
        std::fs::write(&path, "{ half").unwrap();

        FileStorage::new(&path).remove(LAST_QUOTE_KEY).unwrap();
    }
}
