use std::{collections::HashMap, sync::Mutex};

use anyhow::Result;

use crate::KvStore;

/// In-memory store for tests and ephemeral runs. Not durable.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    data: Mutex<HashMap<String, HashMap<String, serde_json::Value>>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> std::sync::MutexGuard<'_, HashMap<String, HashMap<String, serde_json::Value>>> {
        self.data
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self
            .locked()
            .get(namespace)
            .and_then(|ns| ns.get(key).cloned()))
    }

    fn set(&self, namespace: &str, key: &str, value: serde_json::Value) -> Result<()> {
        self.locked()
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    fn keys(&self, namespace: &str) -> Result<Vec<String>> {
        Ok(self
            .locked()
            .get(namespace)
            .map(|ns| ns.keys().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let store = MemoryKvStore::new();
        store.set("ns", "k", serde_json::json!(42)).unwrap();
        assert_eq!(store.get("ns", "k").unwrap().unwrap(), 42);
        assert_eq!(store.keys("ns").unwrap(), vec!["k"]);
    }
}
