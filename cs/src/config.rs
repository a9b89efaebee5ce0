//! Configuration for the chatstore CLI

use eyre::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the persisted chat logs
    #[serde(default = "default_chat_dir", rename = "chat-dir")]
    pub chat_dir: PathBuf,
}

/// Default chat log directory, shared with mcprepl
pub fn default_chat_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(crate::DEFAULT_APP_DIR)
        .join("chats")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chat_dir: default_chat_dir(),
        }
    }
}

impl Config {
    /// Load config from file, or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_yaml::from_str(&content)?;
            return Ok(config);
        }

        // Try default locations
        let default_paths = [
            dirs::config_dir().map(|p| p.join(crate::DEFAULT_APP_DIR).join("config.yml")),
            Some(PathBuf::from("mcprepl.yml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let config: Config = serde_yaml::from_str(&content)?;
                return Ok(config);
            }
        }

        Ok(Config::default())
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_chat_dir_ends_in_chats() {
        let config = Config::default();
        assert!(config.chat_dir.ends_with("chats"));
    }

    #[test]
    fn test_partial_yaml_uses_default() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.chat_dir, default_chat_dir());
    }

    #[test]
    fn test_explicit_chat_dir() {
        let config: Config = serde_yaml::from_str("chat-dir: /tmp/chats").unwrap();
        assert_eq!(config.chat_dir, PathBuf::from("/tmp/chats"));
    }
}
