use crate::error::CommonError;
use crate::result::CommonResult;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Single-device key/value storage used when no remote identity exists.
///
/// Values are whole documents: `set` replaces, it never merges.
pub trait KeyValueStorage: Send + Sync {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> CommonResult<Option<String>>;

    /// Replace the value stored under `key`
    fn set(&self, key: &str, value: &str) -> CommonResult<()>;

    /// Remove `key`; removing a missing key is not an error
    fn remove(&self, key: &str) -> CommonResult<()>;
}

/// File-backed storage: one file per key under a root directory
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", encode_key(key)))
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> CommonResult<Option<String>> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> CommonResult<()> {
        if self.root.exists() && !self.root.is_dir() {
            return Err(CommonError::NotADirectory(self.root.clone()));
        }
        std::fs::create_dir_all(&self.root)?;
        let path = self.path_for(key);
        // Write then rename so a crash never leaves a half-written deck
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), bytes = value.len(), "local value written");
        Ok(())
    }

    fn remove(&self, key: &str) -> CommonResult<()> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory storage for testing
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> CommonResult<Option<String>> {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> CommonResult<()> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> CommonResult<()> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.remove(key);
        Ok(())
    }
}

/// Percent-encode everything outside `[A-Za-z0-9._-]` so distinct keys map
/// to distinct file names.
fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'.' | b'_' | b'-' => out.push(byte as char),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_replace_and_remove() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("deck").unwrap(), None);

        storage.set("deck", "[1]").unwrap();
        storage.set("deck", "[2]").unwrap();
        assert_eq!(storage.get("deck").unwrap().as_deref(), Some("[2]"));
        assert_eq!(storage.len(), 1);

        storage.remove("deck").unwrap();
        storage.remove("deck").unwrap();
        assert!(storage.is_empty());
    }

    #[test]
    fn test_file_storage_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("decks"));

        assert_eq!(storage.get("slidedeck:presentation:abc").unwrap(), None);
        storage.set("slidedeck:presentation:abc", "[]").unwrap();
        assert_eq!(
            storage.get("slidedeck:presentation:abc").unwrap().as_deref(),
            Some("[]")
        );

        storage.remove("slidedeck:presentation:abc").unwrap();
        assert_eq!(storage.get("slidedeck:presentation:abc").unwrap(), None);
    }

    #[test]
    fn test_file_root_must_be_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain");
        std::fs::write(&file, "x").unwrap();

        let storage = FileStorage::new(&file);
        assert!(matches!(storage.set("deck", "[]"), Err(CommonError::NotADirectory(_))));
    }

    #[test]
    fn test_encoded_keys_do_not_collide() {
        assert_ne!(encode_key("a:b"), encode_key("a_b"));
        assert_eq!(encode_key("deck-1.v2"), "deck-1.v2");
        assert_eq!(encode_key("a b"), "a%20b");
    }
}
