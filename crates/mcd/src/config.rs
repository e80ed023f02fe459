//! Configuration management

use mccore::protocol::{DEFAULT_BACKLOG, DEFAULT_PORT};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
    pub backlog: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub root_path: PathBuf,
    /// Upload ceiling in bytes; `None` or 0 means unlimited
    #[serde(default)]
    pub max_upload_bytes: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Shared secret clients must present with AUTH; `None` or empty disables it
    #[serde(default)]
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Configured AUTH token, if authentication is enabled
    pub fn auth_token(&self) -> Option<&str> {
        self.security
            .auth_token
            .as_deref()
            .filter(|token| !token.is_empty())
    }

    /// Configured upload ceiling, if any
    pub fn upload_limit(&self) -> Option<u64> {
        self.storage.max_upload_bytes.filter(|&limit| limit > 0)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                address: "0.0.0.0".to_string(),
                port: DEFAULT_PORT,
                backlog: DEFAULT_BACKLOG,
            },
            storage: StorageConfig {
                root_path: PathBuf::from("./storage"),
                max_upload_bytes: None,
            },
            security: SecurityConfig { auth_token: None },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}
