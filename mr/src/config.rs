//! mcprepl configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main mcprepl configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Chat log storage configuration
    pub chat: ChatConfig,

    /// MCP servers to connect to at startup, in order
    pub servers: Vec<ServerConfig>,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks that required environment variables are set correctly.
    /// Call this early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        if std::env::var(&self.llm.api_key_env).is_err() {
            return Err(eyre::eyre!(
                "LLM API key not found. Set the {} environment variable.",
                self.llm.api_key_env
            ));
        }
        if self.servers.is_empty() {
            return Err(eyre::eyre!("No MCP servers configured. Add a `servers` list to the config file."));
        }
        Ok(())
    }

    /// Load configuration from an explicit file
    ///
    /// Server paths in the file are resolved relative to the config file's
    /// directory, so a config can be checked in next to the servers it
    /// launches.
    pub fn load(config_path: &Path) -> Result<Self> {
        let content = fs::read_to_string(config_path)
            .context(format!("Failed to read config file {}", config_path.display()))?;

        let mut config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        if let Some(base) = config_path.parent() {
            for server in &mut config.servers {
                server.resolve_relative_to(base);
            }
        }

        tracing::info!("Loaded config from: {}", config_path.display());
        Ok(config)
    }
}

/// One MCP server to connect to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the server script (.py or .js)
    pub path: PathBuf,

    /// Short name for display
    pub name: String,

    /// What this server provides
    #[serde(default)]
    pub description: String,
}

impl ServerConfig {
    fn resolve_relative_to(&mut self, base: &Path) {
        if self.path.is_relative() {
            self.path = base.join(&self.path);
        }
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl LlmConfig {
    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env)
            .context(format!("Environment variable {} not set", self.api_key_env))
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 4096,
            timeout_ms: 300_000,
        }
    }
}

/// Chat log storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Directory for persisted chat logs
    #[serde(rename = "chat-dir")]
    pub chat_dir: PathBuf,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            chat_dir: chatstore::config::default_chat_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.llm.model.contains("sonnet"));
        assert_eq!(config.llm.api_key_env, "ANTHROPIC_API_KEY");
        assert_eq!(config.llm.base_url, "https://api.anthropic.com");
        assert!(config.servers.is_empty());
    }

    #[test]
    fn test_validate_requires_servers() {
        // SAFETY: We're in a single-threaded test environment
        unsafe {
            std::env::set_var("MCPREPL_TEST_API_KEY", "test-key");
        }

        let mut config = Config::default();
        config.llm.api_key_env = "MCPREPL_TEST_API_KEY".to_string();

        let result = config.validate();

        unsafe {
            std::env::remove_var("MCPREPL_TEST_API_KEY");
        }

        assert!(result.is_err(), "Should fail with no servers configured");
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
llm:
  model: claude-opus-4
  api-key-env: MY_API_KEY
  max-tokens: 2048

servers:
  - path: servers/postgres_mcp.py
    name: postgres
    description: PostgreSQL queries
  - path: servers/redis_mcp.py
    name: redis
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.llm.model, "claude-opus-4");
        assert_eq!(config.llm.api_key_env, "MY_API_KEY");
        assert_eq!(config.llm.max_tokens, 2048);
        // Defaults for unspecified
        assert_eq!(config.llm.base_url, "https://api.anthropic.com");
        assert_eq!(config.servers.len(), 2);
        assert_eq!(config.servers[0].name, "postgres");
        assert_eq!(config.servers[1].description, "");
    }

    #[test]
    fn test_server_paths_resolved_relative_to_config() {
        let temp = tempfile::TempDir::new().unwrap();
        let config_path = temp.path().join("mcprepl.yml");
        std::fs::write(
            &config_path,
            "servers:\n  - path: servers/db.py\n    name: db\n",
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();

        assert_eq!(config.servers[0].path, temp.path().join("servers/db.py"));
    }
}
