//! Durable key-value storage and the persisted city-name list kept in it.
//!
//! Only city names survive a restart; full [`City`](crate::model::City) data is
//! always fetched again from the provider.

use anyhow::{Context, Result};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

/// Key under which the ordered list of tracked city names is stored.
pub const CITIES_KEY: &str = "cities";

/// Minimal string key-value store.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Store that lives only as long as the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store backed by a single JSON object on disk, rewritten on every `set`.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read store file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse store file: {}", path.display()))?
        } else {
            BTreeMap::new()
        };

        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create store directory: {}", parent.display())
            })?;
        }

        let json =
            serde_json::to_string_pretty(entries).context("Failed to serialize store")?;

        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write store file: {}", self.path.display()))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.clone();
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)?;
        self.entries = entries;
        Ok(())
    }
}

/// Read the persisted name list. Absent, unreadable, or malformed entries
/// all yield an empty list.
pub fn load_names<S: KeyValueStore + ?Sized>(store: &S) -> Vec<String> {
    let raw = match store.get(CITIES_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(err) => {
            tracing::warn!(error = %err, "failed to read persisted city names");
            return Vec::new();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(names) => names,
        Err(err) => {
            tracing::warn!(error = %err, "ignoring malformed persisted city names");
            Vec::new()
        }
    }
}

/// Replace the persisted name list with `names`, in order.
pub fn save_names<S, N>(store: &mut S, names: &[N]) -> Result<()>
where
    S: KeyValueStore + ?Sized,
    N: AsRef<str>,
{
    let names: Vec<&str> = names.iter().map(AsRef::as_ref).collect();
    let json = serde_json::to_string(&names).context("Failed to serialize city names")?;
    store.set(CITIES_KEY, &json)
}
