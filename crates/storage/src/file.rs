use std::{collections::HashMap, io::Write, path::PathBuf, sync::Mutex};

use anyhow::{Context, Result};
use tracing::debug;

use crate::KvStore;

/// File-backed store: one JSON object file per namespace at
/// `~/.local/share/steward/<namespace>.json` (or a custom directory).
///
/// Writes go through a uniquely named temp file in the same directory
/// followed by a rename, so concurrent readers never observe a partial
/// write. The read-modify-write cycle itself is guarded by an advisory
/// file lock per namespace: the gateway, its sweep task, and the CLI are
/// independent processes over the same files, and losing a write here
/// means losing an approval decision.
#[derive(Debug)]
pub struct FileKvStore {
    dir: PathBuf,
    // Serializes writers within this store instance; the file lock below
    // covers other instances and other processes.
    write_lock: Mutex<()>,
}

/// Default state directory (`~/.local/share/steward` on Linux).
pub fn steward_state_dir() -> PathBuf {
    directories::ProjectDirs::from("org", "steward", "steward")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".steward"))
}

impl FileKvStore {
    pub fn new() -> Self {
        Self::with_dir(steward_state_dir())
    }

    /// Create a store rooted at a specific directory (useful for testing).
    pub fn with_dir(dir: PathBuf) -> Self {
        Self {
            dir,
            write_lock: Mutex::new(()),
        }
    }

    fn namespace_path(&self, namespace: &str) -> PathBuf {
        self.dir.join(format!("{namespace}.json"))
    }

    /// Open (creating if needed) the advisory lock file for a namespace.
    fn namespace_lock(&self, namespace: &str) -> Result<fd_lock::RwLock<std::fs::File>> {
        let path = self.dir.join(format!("{namespace}.lock"));
        let file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&path)
            .with_context(|| format!("failed to open lock file {}", path.display()))?;
        Ok(fd_lock::RwLock::new(file))
    }

    fn read_namespace(&self, namespace: &str) -> Result<HashMap<String, serde_json::Value>> {
        let path = self.namespace_path(namespace);
        let data = match std::fs::read_to_string(&path) {
            Ok(d) => d,
            // A namespace that has never been written is empty, not an error.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()));
            },
        };
        serde_json::from_str(&data)
            .with_context(|| format!("corrupt store file {}", path.display()))
    }

    fn write_namespace(
        &self,
        namespace: &str,
        map: &HashMap<String, serde_json::Value>,
    ) -> Result<()> {
        let path = self.namespace_path(namespace);
        let data = serde_json::to_string_pretty(map)?;

        // Unique temp file per writer; a fixed sibling path would let one
        // writer's rename clobber another's in-flight write.
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)
            .with_context(|| format!("failed to create temp file in {}", self.dir.display()))?;
        tmp.write_all(data.as_bytes())
            .with_context(|| format!("failed to write {}", tmp.path().display()))?;

        // Keep store files private to the user.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }

        tmp.persist(&path)
            .with_context(|| format!("failed to replace {}", path.display()))?;
        Ok(())
    }
}

impl Default for FileKvStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore for FileKvStore {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.read_namespace(namespace)?.remove(key))
    }

    fn set(&self, namespace: &str, key: &str, value: serde_json::Value) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.display()))?;

        // Cross-process exclusion for the whole read-modify-write cycle.
        let mut lock = self.namespace_lock(namespace)?;
        let _ns_guard = lock
            .write()
            .with_context(|| format!("failed to lock namespace {namespace}"))?;

        let mut map = self.read_namespace(namespace)?;
        map.insert(key.to_string(), value);
        self.write_namespace(namespace, &map)?;
        debug!(namespace, key, "kv set");
        Ok(())
    }

    fn keys(&self, namespace: &str) -> Result<Vec<String>> {
        Ok(self.read_namespace(namespace)?.into_keys().collect())
    }
}
