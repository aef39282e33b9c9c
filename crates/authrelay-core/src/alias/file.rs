use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::Duration;
use tracing::{debug, warn};

use super::store::{AliasEntry, AliasStore, MemoryAliasStore};
use crate::api::{ClientError, Result};
use crate::config::APP_NAME;

/// Alias file name in the cache directory
const ALIAS_FILE: &str = "aliases.json";

/// Alias store that survives restarts by mirroring itself to a JSON file.
///
/// Writers are serialized from the in-memory update through the file
/// replace, so the file always holds the latest complete snapshot.
#[derive(Debug)]
pub struct FileAliasStore {
    path: PathBuf,
    inner: MemoryAliasStore,
    persist_lock: Mutex<()>,
}

impl FileAliasStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>, ttl: Option<Duration>) -> Result<Self> {
        let path = path.into();
        let entries = Self::load(&path)?;
        debug!(path = %path.display(), count = entries.len(), "Loaded alias file");
        Ok(Self {
            path,
            inner: MemoryAliasStore::from_entries(entries, ttl),
            persist_lock: Mutex::new(()),
        })
    }

    /// Open the store at `<cache dir>/authrelay/aliases.json`.
    pub fn open_default(ttl: Option<Duration>) -> Result<Self> {
        Self::open(Self::default_path()?, ttl)
    }

    pub fn default_path() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir().ok_or_else(|| {
            ClientError::InvalidConfiguration("Could not find cache directory".to_string())
        })?;
        Ok(cache_dir.join(APP_NAME).join(ALIAS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove every alias and delete the backing file.
    pub fn clear(&self) -> std::io::Result<()> {
        let _guard = self.persist_guard();
        self.inner.clear();
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    fn load(path: &Path) -> Result<HashMap<String, AliasEntry>> {
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ClientError::InvalidConfiguration(format!(
                "Failed to read alias file {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Replace the file with the current entries. Readers see either the
    /// old file or the new one, never a partial write.
    fn save(&self) -> std::io::Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)?;
        let contents = serde_json::to_string_pretty(&self.inner.entries())?;

        let mut staged = tempfile::NamedTempFile::new_in(parent)?;
        staged.write_all(contents.as_bytes())?;
        staged.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    // Nothing the lock guards can be left half-done by a panic
    fn persist_guard(&self) -> MutexGuard<'_, ()> {
        self.persist_lock.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl AliasStore for FileAliasStore {
    fn lookup_many(&self, names: &[&str]) -> Vec<Option<String>> {
        self.inner.lookup_many(names)
    }

    fn set_aliases(&self, entries: &[(&str, &str)]) {
        let _guard = self.persist_guard();
        self.inner.set_aliases(entries);
        if let Err(e) = self.save() {
            warn!(path = %self.path.display(), error = %e, "Failed to persist aliases");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_empty_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(ALIAS_FILE);
        let store = FileAliasStore::open(&path, None).unwrap();
        assert!(!store.has_alias("authToken"));
        assert!(!path.exists());
    }

    #[test]
    fn test_aliases_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(ALIAS_FILE);
        {
            let store = FileAliasStore::open(&path, None).unwrap();
            store.set_aliases(&[("authToken", "tok"), ("userUuid", "uuid")]);
        }
        let reopened = FileAliasStore::open(&path, None).unwrap();
        assert_eq!(reopened.get_alias("authToken").unwrap(), "tok");
        assert_eq!(reopened.resolve("{userUuid}").unwrap(), "uuid");

        reopened.clear().unwrap();
        assert!(!path.exists());
        assert!(!reopened.has_alias("authToken"));
    }

    #[test]
    fn test_corrupt_file_fails_to_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(ALIAS_FILE);
        std::fs::write(&path, "not json").unwrap();

        let err = FileAliasStore::open(&path, None).unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[test]
    fn test_concurrent_writers_leave_latest_complete_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(ALIAS_FILE);
        let store = Arc::new(FileAliasStore::open(&path, None).unwrap());

        let writers: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for j in 0..20 {
                        let token = format!("token-{}-{}", i, j);
                        let uuid = format!("uuid-{}-{}", i, j);
                        store.set_aliases(&[
                            ("authToken", token.as_str()),
                            ("userUuid", uuid.as_str()),
                        ]);
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let reopened = FileAliasStore::open(&path, None).unwrap();
        assert_eq!(reopened.lookup("authToken"), store.lookup("authToken"));
        assert_eq!(reopened.lookup("userUuid"), store.lookup("userUuid"));

        // Both aliases always come from the same write
        let token = reopened.get_alias("authToken").unwrap();
        let uuid = reopened.get_alias("userUuid").unwrap();
        assert_eq!(token.trim_start_matches("token-"), uuid.trim_start_matches("uuid-"));

        // No staging files are left next to the alias file
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
