use serde::{Deserialize, Serialize};
use slidedeck_editor::DEFAULT_HISTORY_CAPACITY;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_LOCAL_KEY_PREFIX: &str = "slidedeck:presentation:";

/// Session settings, loaded from `slidedeck.config.json` by the CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Retained undo/redo snapshots
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// How long a status message stays visible
    #[serde(default = "default_status_ttl_ms")]
    pub status_ttl_ms: u64,

    /// Upper bound on any single remote call
    #[serde(default = "default_remote_timeout_ms")]
    pub remote_timeout_ms: u64,

    /// Directory for fallback-mode decks
    #[serde(default = "default_storage_dir")]
    pub storage_dir: String,

    #[serde(default = "default_local_key_prefix")]
    pub local_key_prefix: String,

    /// Language hint handed to the writing assistant
    #[serde(default = "default_language")]
    pub default_language: String,
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

fn default_status_ttl_ms() -> u64 {
    4_000
}

fn default_remote_timeout_ms() -> u64 {
    10_000
}

fn default_storage_dir() -> String {
    ".slidedeck".to_string()
}

fn default_local_key_prefix() -> String {
    DEFAULT_LOCAL_KEY_PREFIX.to_string()
}

fn default_language() -> String {
    "en".to_string()
}

impl SessionConfig {
    pub fn status_ttl(&self) -> Duration {
        Duration::from_millis(self.status_ttl_ms)
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }

    /// Absolute path to the fallback storage directory
    pub fn storage_path(&self, cwd: &str) -> PathBuf {
        PathBuf::from(cwd).join(&self.storage_dir)
    }

    /// Local-storage key for a presentation
    pub fn local_key(&self, presentation: &str) -> String {
        format!("{}{}", self.local_key_prefix, presentation)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
            status_ttl_ms: default_status_ttl_ms(),
            remote_timeout_ms: default_remote_timeout_ms(),
            storage_dir: default_storage_dir(),
            local_key_prefix: default_local_key_prefix(),
            default_language: default_language(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_config() {
        let json = r#"{ "historyCapacity": 20, "storageDir": "decks" }"#;

        let config: SessionConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.history_capacity, 20);
        assert_eq!(config.storage_dir, "decks");
        assert_eq!(config.status_ttl_ms, 4_000);
        assert_eq!(config.local_key_prefix, DEFAULT_LOCAL_KEY_PREFIX);
    }

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.history_capacity, 50);
        assert_eq!(config.remote_timeout(), Duration::from_secs(10));
        assert_eq!(config.local_key("p-1"), "slidedeck:presentation:p-1");
    }
}
