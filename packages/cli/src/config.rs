use slidedeck_workspace::SessionConfig;
use std::path::PathBuf;
use tracing::debug;

pub const DEFAULT_CONFIG_NAME: &str = "slidedeck.config.json";

/// Environment variable holding the field encryption passphrase
pub const KEY_ENV: &str = "SLIDEDECK_KEY";

/// Load config from a directory
pub fn load(cwd: &str) -> anyhow::Result<SessionConfig> {
    let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        let config: SessionConfig = serde_json::from_str(&content)?;
        debug!(path = %config_path.display(), "config loaded");
        Ok(config)
    } else {
        // Return default config if none exists
        Ok(SessionConfig::default())
    }
}

/// Passphrase from `--key`, then `SLIDEDECK_KEY`
pub fn passphrase(flag: Option<String>) -> Option<String> {
    flag.or_else(|| std::env::var(KEY_ENV).ok())
        .filter(|key| !key.is_empty())
}
