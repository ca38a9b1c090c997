//! In-process key-value store.

use super::KeyValueStore;
use crate::error::{ProcmanError, Result};
use globset::Glob;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// A [`KeyValueStore`] living in this process's memory.
///
/// Clones share the same map, which makes it a stand-in for a shared store
/// when several managers run inside one process (tests, embedding).
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map().is_empty()
    }

    fn map(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.map().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.map().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.map().remove(key);
        Ok(())
    }

    fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let matcher = Glob::new(pattern)
            .map_err(|e| ProcmanError::storage(format!("invalid key pattern '{}'", pattern), e))?
            .compile_matcher();

        Ok(self
            .map()
            .keys()
            .filter(|key| matcher.is_match(key.as_str()))
            .cloned()
            .collect())
    }

    fn describe(&self) -> String {
        "in-memory store".to_string()
    }
}
