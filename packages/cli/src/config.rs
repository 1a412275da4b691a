use metaconf_editor::{default_settings_document, Settings};
use serde_json::Value;
use std::path::PathBuf;

pub const DEFAULT_CONFIG_NAME: &str = "metaconf.settings.json";

/// Settings document the CLI starts from
#[derive(Debug, Clone)]
pub struct Config {
    /// Raw settings document, loaded into the session's settings store
    pub document: Value,
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let document: Value = serde_json::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Invalid {}: {}", config_path.display(), e))?;
            tracing::debug!("Loaded settings from {}", config_path.display());
            Ok(Config { document })
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    pub fn settings(&self) -> Settings {
        Settings::from_document(&self.document)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            document: default_settings_document(),
        }
    }
}
