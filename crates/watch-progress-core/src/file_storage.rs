use std::path::{Path, PathBuf};
use tracing::{debug, info};
use crate::error::{StorageError, StorageResult};
use crate::storage::{is_valid_key, StorageBackend};

/// Durable storage keeping one file per key
///
/// Values are written atomically (temp file, then rename) so a crash never
/// leaves a half-written payload behind. Separate processes sharing the
/// directory get last-write-wins semantics and no change notifications.
pub struct FileStorage {
    dir: PathBuf,
    max_value_bytes: Option<usize>,
}

impl FileStorage {
    pub fn new(dir: &Path) -> StorageResult<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            max_value_bytes: None,
        })
    }

    /// Cap the size of any single value.
    pub fn with_quota(mut self, max_value_bytes: usize) -> Self {
        self.max_value_bytes = Some(max_value_bytes);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn value_path(&self, key: &str) -> StorageResult<PathBuf> {
        if !is_valid_key(key) {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl StorageBackend for FileStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.value_path(key)?;
        if !path.exists() {
            debug!("Storage miss: {} (file does not exist)", key);
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(&path)?))
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.value_path(key)?;

        if let Some(limit) = self.max_value_bytes {
            if value.len() > limit {
                return Err(StorageError::QuotaExceeded {
                    needed: value.len(),
                    available: limit,
                });
            }
        }

        let start = std::time::Instant::now();

        // Atomic write: write to temp file, then rename
        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, value)?;
        std::fs::rename(&temp_path, &path)?;

        debug!("Saved {} ({} bytes) in {:?}", key, value.len(), start.elapsed());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let path = self.value_path(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!("Removed stored value {:?}", path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let storage = FileStorage::new(dir.path()).unwrap();
            storage.set("watchHistory", "[]").unwrap();
        }

        let reopened = FileStorage::new(dir.path()).unwrap();
        assert_eq!(reopened.get("watchHistory").unwrap(), Some("[]".to_string()));
    }

    #[test]
    fn test_overwrite_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        storage.set("k", "first").unwrap();
        storage.set("k", "second").unwrap();

        assert_eq!(storage.get("k").unwrap(), Some("second".to_string()));
        assert!(!dir.path().join("k.tmp").exists());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        storage.set("k", "v").unwrap();
        storage.remove("k").unwrap();
        storage.remove("k").unwrap();
        assert_eq!(storage.get("k").unwrap(), None);
    }

    #[test]
    fn test_quota_and_key_validation() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap().with_quota(4);

        assert!(matches!(
            storage.set("k", "too long"),
            Err(StorageError::QuotaExceeded { needed: 8, available: 4 })
        ));
        assert!(matches!(storage.get("../k"), Err(StorageError::InvalidKey(_))));
        assert!(storage.subscribe().is_none());
    }
}
