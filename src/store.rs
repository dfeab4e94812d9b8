//! Durable key-value persistence and the trigger bookkeeping kept in it.

use crate::error::{CadenceError, Result};
use crate::notifier::TriggerId;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

/// Durable string key-value store provided by the host.
pub trait KeyValueStore: Send + Sync {
    /// Read a value; `None` when the key was never written.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Volatile store for tests and hosts without storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.lock().unwrap_or_else(|p| p.into_inner());
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(|p| p.into_inner());
        values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// Store backed by one JSON object on disk.
///
/// Writes go through a temp file and a rename, so a crash mid-write leaves
/// the previous contents intact.
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    /// Store at the default location (`<data dir>/triggers.json`).
    #[must_use]
    pub fn at_default_path() -> Self {
        Self::new(crate::cadence_dirs::store_file())
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(CadenceError::Persistence(format!(
                    "cannot read {}: {e}",
                    self.path.display()
                )));
            }
        };
        serde_json::from_slice(&bytes).map_err(|e| {
            CadenceError::Persistence(format!("cannot parse {}: {e}", self.path.display()))
        })
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CadenceError::Persistence(format!("cannot create store directory: {e}"))
            })?;
        }

        let tmp_path = self.path.with_extension("tmp");
        let json = serde_json::to_vec_pretty(values)
            .map_err(|e| CadenceError::Persistence(format!("cannot serialize store: {e}")))?;
        std::fs::write(&tmp_path, json)
            .map_err(|e| CadenceError::Persistence(format!("cannot write store temp file: {e}")))?;
        std::fs::rename(&tmp_path, &self.path)
            .map_err(|e| CadenceError::Persistence(format!("cannot finalize store file: {e}")))?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());
        let mut values = self.read_all()?;
        values.insert(key.to_owned(), value.to_owned());
        self.write_all(&values)
    }
}

/// Persisted trigger bookkeeping: tracked ids per category plus the last
/// applied schedule signature.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerStore {
    /// Category id → trigger ids registered for it by the last full pass.
    pub ids: BTreeMap<String, Vec<TriggerId>>,
    pub last_signature: Option<String>,
}

impl TriggerStore {
    /// Key holding the JSON id list for `category`.
    #[must_use]
    pub fn ids_key(prefix: &str, category: &str) -> String {
        format!("{prefix}.ids.{category}")
    }

    /// Key holding the last applied signature.
    #[must_use]
    pub fn signature_key(prefix: &str) -> String {
        format!("{prefix}.signature")
    }

    /// Read bookkeeping for `categories`.
    ///
    /// Never fails: unreadable or undecodable entries count as "no prior
    /// state", which forces a full pass.
    pub fn load<'a>(
        kv: &dyn KeyValueStore,
        prefix: &str,
        categories: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let mut store = Self::default();

        for category in categories {
            let key = Self::ids_key(prefix, category);
            let ids = match kv.get(&key) {
                Ok(Some(raw)) => match serde_json::from_str::<Vec<TriggerId>>(&raw) {
                    Ok(ids) => ids,
                    Err(e) => {
                        warn!(category, "ignoring malformed tracked ids: {e}");
                        Vec::new()
                    }
                },
                Ok(None) => Vec::new(),
                Err(e) => {
                    warn!(category, "cannot read tracked ids, assuming none: {e}");
                    Vec::new()
                }
            };
            store.ids.insert(category.to_owned(), ids);
        }

        store.last_signature = match kv.get(&Self::signature_key(prefix)) {
            Ok(sig) => sig.filter(|s| !s.is_empty()),
            Err(e) => {
                warn!("cannot read schedule signature, assuming none: {e}");
                None
            }
        };

        store
    }

    /// Returns `true` when at least one category has a tracked id.
    #[must_use]
    pub fn has_tracked_ids(&self) -> bool {
        self.ids.values().any(|ids| !ids.is_empty())
    }

    /// Drop tracked ids the host no longer knows about.
    ///
    /// Returns the number of ids dropped. A non-zero count means a tracked
    /// trigger fired, was swept or was removed by the host.
    pub fn retain_live(&mut self, live: &HashSet<&TriggerId>) -> usize {
        let mut dropped = 0;
        for ids in self.ids.values_mut() {
            let before = ids.len();
            ids.retain(|id| live.contains(id));
            dropped += before - ids.len();
        }
        dropped
    }

    /// Tracked ids for `category` (empty when unknown).
    #[must_use]
    pub fn tracked(&self, category: &str) -> &[TriggerId] {
        self.ids.get(category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Persist the id list for one category.
    pub fn save_ids(
        kv: &dyn KeyValueStore,
        prefix: &str,
        category: &str,
        ids: &[TriggerId],
    ) -> Result<()> {
        let json = serde_json::to_string(ids)
            .map_err(|e| CadenceError::Persistence(format!("cannot encode trigger ids: {e}")))?;
        kv.set(&Self::ids_key(prefix, category), &json)
    }

    /// Persist the signature.
    pub fn save_signature(kv: &dyn KeyValueStore, prefix: &str, signature: &str) -> Result<()> {
        kv.set(&Self::signature_key(prefix), signature)
    }
}
