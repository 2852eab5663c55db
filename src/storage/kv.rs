//! Key-value stores
//!
//! The ledger is persisted through a small async key-value capability. Two
//! implementations are provided: [`FileStore`] keeps every key in a single
//! JSON object file replaced atomically on each write, and [`MemoryStore`]
//! keeps values in process memory.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use tracing::debug;

use super::file_io::{read_json, write_json_atomic};
use crate::error::{LedgerError, LedgerResult};

/// Async get/set over string keys and values
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a key, `None` if it was never written
    async fn get(&self, key: &str) -> LedgerResult<Option<String>>;

    /// Write a single key
    async fn set(&self, key: &str, value: String) -> LedgerResult<()>;

    /// Write several keys
    ///
    /// The default writes them one by one in order; stores that can commit
    /// a batch in one step should override this.
    async fn set_many(&self, entries: Vec<(String, String)>) -> LedgerResult<()> {
        for (key, value) in entries {
            self.set(&key, value).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    async fn get(&self, key: &str) -> LedgerResult<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: String) -> LedgerResult<()> {
        (**self).set(key, value).await
    }

    async fn set_many(&self, entries: Vec<(String, String)>) -> LedgerResult<()> {
        (**self).set_many(entries).await
    }
}

fn lock_error(e: impl std::fmt::Display) -> LedgerError {
    LedgerError::PersistenceFailure(format!("Failed to acquire store lock: {}", e))
}

/// File-backed store: all keys live in one JSON object
///
/// The I/O is synchronous and short; it runs inline on the calling task.
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn read_all(&self) -> LedgerResult<BTreeMap<String, String>> {
        read_json(&self.path)
    }

    fn update(&self, entries: Vec<(String, String)>) -> LedgerResult<()> {
        let _guard = self.write_lock.lock().map_err(lock_error)?;
        let mut data = self.read_all()?;
        for (key, value) in entries {
            data.insert(key, value);
        }
        debug!(path = %self.path.display(), keys = data.len(), "writing store file");
        write_json_atomic(&self.path, &data)
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> LedgerResult<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    async fn set(&self, key: &str, value: String) -> LedgerResult<()> {
        self.update(vec![(key.to_string(), value)])
    }

    async fn set_many(&self, entries: Vec<(String, String)>) -> LedgerResult<()> {
        self.update(entries)
    }
}

/// In-memory store
///
/// Writes can be made to fail on demand, which is how callers exercise the
/// degraded persistence paths.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<BTreeMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with raw values
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let data = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            data: RwLock::new(data),
            ..Self::default()
        }
    }

    /// Make subsequent reads fail
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent writes fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `set` calls so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Read a raw value synchronously
    pub fn raw(&self, key: &str) -> Option<String> {
        self.data.read().ok().and_then(|data| data.get(key).cloned())
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> LedgerResult<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(LedgerError::PersistenceFailure(format!(
                "read of '{}' rejected",
                key
            )));
        }
        let data = self.data.read().map_err(lock_error)?;
        Ok(data.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> LedgerResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(LedgerError::PersistenceFailure(format!(
                "write of '{}' rejected",
                key
            )));
        }
        let mut data = self.data.write().map_err(lock_error)?;
        data.insert(key.to_string(), value);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_get_set() {
        let store = MemoryStore::new();
        block_on(async {
            assert_eq!(store.get("balance").await.unwrap(), None);
            store.set("balance", "1.00".into()).await.unwrap();
            assert_eq!(store.get("balance").await.unwrap(), Some("1.00".into()));
        });
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn test_memory_store_failures() {
        let store = MemoryStore::new();
        store.set_fail_writes(true);
        let err = block_on(store.set("balance", "1.00".into())).unwrap_err();
        assert!(err.is_persistence());
        assert_eq!(store.raw("balance"), None);

        store.set_fail_reads(true);
        assert!(block_on(store.get("balance")).unwrap_err().is_persistence());
    }

    #[test]
    fn test_default_set_many_writes_in_order() {
        let store = MemoryStore::new();
        block_on(store.set_many(vec![
            ("a".into(), "1".into()),
            ("b".into(), "2".into()),
        ]))
        .unwrap();
        assert_eq!(store.raw("a"), Some("1".into()));
        assert_eq!(store.raw("b"), Some("2".into()));
        assert_eq!(store.write_count(), 2);
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data").join("store.json");

        let store = FileStore::new(path.clone());
        block_on(store.set_many(vec![
            ("transactions".into(), "[]".into()),
            ("balance".into(), "0.00".into()),
        ]))
        .unwrap();

        let reopened = FileStore::new(path);
        assert_eq!(
            block_on(reopened.get("balance")).unwrap(),
            Some("0.00".into())
        );
        assert_eq!(
            block_on(reopened.get("transactions")).unwrap(),
            Some("[]".into())
        );
    }

    #[test]
    fn test_file_store_missing_file_reads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().join("store.json"));
        assert_eq!(block_on(store.get("transactions")).unwrap(), None);
    }

    #[test]
    fn test_file_store_corrupt_file_is_persistence_failure() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        std::fs::write(&path, "{ truncated").unwrap();

        let store = FileStore::new(path);
        assert!(block_on(store.get("transactions")).unwrap_err().is_persistence());
    }
}
