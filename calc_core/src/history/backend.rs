//! # History Backends
//!
//! The store only needs two capabilities from its persistence collaborator:
//! `load() -> blob` and `save(blob)`. The embedding application picks the
//! backend and hands it to [`HistoryStore`](crate::history::HistoryStore).
//!
//! - [`MemoryBackend`] - key-value blob map under a fixed key (tests, WASM hosts)
//! - [`FileBackend`] - `<dir>/<key>.json` with OS-level locking and atomic saves

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::config::DEFAULT_STORAGE_KEY;
use crate::errors::CoreResult;

/// Persistence collaborator for the history store.
#[async_trait]
pub trait HistoryBackend: Send + Sync {
    /// Read the stored blob. `Ok(None)` means nothing has been saved yet.
    async fn load(&self) -> CoreResult<Option<String>>;

    /// Replace the stored blob.
    async fn save(&self, blob: &str) -> CoreResult<()>;
}

/// In-process key-value store.
#[derive(Debug)]
pub struct MemoryBackend {
    key: String,
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_key(DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(key: impl Into<String>) -> Self {
        MemoryBackend {
            key: key.into(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Start with a blob already stored under the key
    pub fn seeded(key: impl Into<String>, blob: impl Into<String>) -> Self {
        let key = key.into();
        let entries = HashMap::from([(key.clone(), blob.into())]);
        MemoryBackend {
            key,
            entries: Mutex::new(entries),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryBackend for MemoryBackend {
    async fn load(&self) -> CoreResult<Option<String>> {
        Ok(self.entries.lock().await.get(&self.key).cloned())
    }

    async fn save(&self, blob: &str) -> CoreResult<()> {
        self.entries.lock().await.insert(self.key.clone(), blob.to_string());
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileBackend;

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use std::fs::{self, File, OpenOptions};
    use std::io::{ErrorKind, Read, Write};
    use std::path::{Path, PathBuf};

    use async_trait::async_trait;
    use fs2::FileExt;

    use super::HistoryBackend;
    use crate::errors::{CalcError, CoreResult};

    /// Blob stored as `<dir>/<key>.json`.
    ///
    /// Saves write to a `.tmp` sibling, fsync, then rename, so an interrupted
    /// save never leaves a half-written file. Both load and save hold an
    /// exclusive lock on `<key>.json.lock` for their duration; if another
    /// process holds it the call fails with `FileLocked` instead of waiting.
    #[derive(Debug, Clone)]
    pub struct FileBackend {
        path: PathBuf,
    }

    impl FileBackend {
        pub fn new(dir: impl AsRef<Path>, key: &str) -> Self {
            FileBackend {
                path: dir.as_ref().join(format!("{}.json", key)),
            }
        }

        /// Path of the stored blob
        pub fn path(&self) -> &Path {
            &self.path
        }
    }

    #[async_trait]
    impl HistoryBackend for FileBackend {
        async fn load(&self) -> CoreResult<Option<String>> {
            let path = self.path.clone();
            tokio::task::spawn_blocking(move || read_blob(&path))
                .await
                .map_err(|e| CalcError::Internal { message: e.to_string() })?
        }

        async fn save(&self, blob: &str) -> CoreResult<()> {
            let path = self.path.clone();
            let blob = blob.to_string();
            tokio::task::spawn_blocking(move || write_blob(&path, &blob))
                .await
                .map_err(|e| CalcError::Internal { message: e.to_string() })?
        }
    }

    /// Exclusive OS lock held until dropped
    struct FileLock {
        file: File,
    }

    impl FileLock {
        fn acquire(path: &Path) -> CoreResult<Self> {
            let lock_path = lock_path_for(path);
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(false)
                .open(&lock_path)
                .map_err(|e| CalcError::file_error("create lock", lock_path.display().to_string(), e.to_string()))?;

            file.try_lock_exclusive().map_err(|e| {
                if e.kind() == fs2::lock_contended_error().kind() {
                    CalcError::FileLocked {
                        path: path.display().to_string(),
                        locked_by: "another process".to_string(),
                    }
                } else {
                    CalcError::file_error("lock", lock_path.display().to_string(), e.to_string())
                }
            })?;

            Ok(FileLock { file })
        }
    }

    impl Drop for FileLock {
        fn drop(&mut self) {
            let _ = self.file.unlock();
        }
    }

    fn lock_path_for(path: &Path) -> PathBuf {
        let mut lock_path = path.to_path_buf();
        let extension = lock_path
            .extension()
            .map(|e| format!("{}.lock", e.to_string_lossy()))
            .unwrap_or_else(|| "lock".to_string());
        lock_path.set_extension(extension);
        lock_path
    }

    fn ensure_parent(path: &Path) -> CoreResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| CalcError::file_error("create dir", parent.display().to_string(), e.to_string()))?;
            }
        }
        Ok(())
    }

    fn read_blob(path: &Path) -> CoreResult<Option<String>> {
        if !path.exists() {
            return Ok(None);
        }
        let _lock = FileLock::acquire(path)?;

        let mut file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CalcError::file_error("open", path.display().to_string(), e.to_string())),
        };

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| CalcError::file_error("read", path.display().to_string(), e.to_string()))?;
        Ok(Some(contents))
    }

    fn write_blob(path: &Path, blob: &str) -> CoreResult<()> {
        ensure_parent(path)?;
        let _lock = FileLock::acquire(path)?;

        let tmp_path = path.with_extension("json.tmp");

        let mut tmp_file = File::create(&tmp_path)
            .map_err(|e| CalcError::file_error("create temp file", tmp_path.display().to_string(), e.to_string()))?;

        tmp_file
            .write_all(blob.as_bytes())
            .map_err(|e| CalcError::file_error("write temp file", tmp_path.display().to_string(), e.to_string()))?;

        tmp_file
            .sync_all()
            .map_err(|e| CalcError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string()))?;

        fs::rename(&tmp_path, path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            CalcError::file_error("rename to final", path.display().to_string(), e.to_string())
        })?;

        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_lock_path_generation() {
            let lock_path = lock_path_for(Path::new("/data/history.json"));
            assert_eq!(lock_path, Path::new("/data/history.json.lock"));
        }

        #[test]
        fn test_contended_lock_reports_file_locked() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("history.json");

            let _held = FileLock::acquire(&path).unwrap();
            let err = FileLock::acquire(&path).err().unwrap();
            assert_eq!(err.error_code(), "FILE_LOCKED");
        }

        #[test]
        fn test_lock_released_on_drop() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("history.json");

            drop(FileLock::acquire(&path).unwrap());
            assert!(FileLock::acquire(&path).is_ok());
        }

        #[tokio::test]
        async fn test_missing_file_loads_none() {
            let dir = tempfile::tempdir().unwrap();
            let backend = FileBackend::new(dir.path(), "history");
            assert_eq!(backend.load().await.unwrap(), None);
        }

        #[tokio::test]
        async fn test_save_and_load_roundtrip() {
            let dir = tempfile::tempdir().unwrap();
            let backend = FileBackend::new(dir.path().join("nested"), "history");

            backend.save("{\"items\":[]}").await.unwrap();
            assert_eq!(backend.load().await.unwrap().as_deref(), Some("{\"items\":[]}"));

            backend.save("[]").await.unwrap();
            assert_eq!(backend.load().await.unwrap().as_deref(), Some("[]"));
        }

        #[tokio::test]
        async fn test_atomic_save_leaves_no_tmp_file() {
            let dir = tempfile::tempdir().unwrap();
            let backend = FileBackend::new(dir.path(), "history");
            backend.save("[]").await.unwrap();

            assert!(backend.path().exists());
            assert!(!backend.path().with_extension("json.tmp").exists());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backend_starts_empty() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.key(), DEFAULT_STORAGE_KEY);
        assert_eq!(backend.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_backend_save_replaces() {
        let backend = MemoryBackend::seeded("k", "old");
        assert_eq!(backend.load().await.unwrap().as_deref(), Some("old"));
        backend.save("new").await.unwrap();
        assert_eq!(backend.load().await.unwrap().as_deref(), Some("new"));
    }
}
