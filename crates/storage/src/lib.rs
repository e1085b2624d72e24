//! Durable namespaced key-value storage.
//!
//! The approval store and policy configuration both persist through this
//! contract; neither owns the backend. `FileKvStore` keeps one JSON object
//! file per namespace and replaces it atomically on write, so a reader in
//! another process sees either the old or the new value, never a torn one.

pub mod file;
pub mod memory;

use anyhow::Result;

/// Namespaced durable key-value contract.
///
/// Failures are loud: a write that cannot be persisted must surface as an
/// error, never be silently dropped.
pub trait KvStore: Send + Sync {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<serde_json::Value>>;
    fn set(&self, namespace: &str, key: &str, value: serde_json::Value) -> Result<()>;
    /// All keys currently present in a namespace, in unspecified order.
    fn keys(&self, namespace: &str) -> Result<Vec<String>>;
}

pub use file::FileKvStore;
pub use memory::MemoryKvStore;
