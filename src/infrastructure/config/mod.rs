//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::application::errors::ConfigError;

/// Bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub bot: BotConfig,
    pub plugins: PluginConfig,
    pub storage: StorageConfig,
    pub limits: LimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BotConfig {
    pub name: String,
    /// Prefix character set, e.g. ".#!"
    pub prefixes: String,
    /// Owner identity for owner-gated plugins
    pub owner: String,
    /// Recipient of failure diagnostics
    pub admin_contact: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PluginConfig {
    pub directory: PathBuf,
    pub auto_load: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct StorageConfig {
    pub path: PathBuf,
    pub flush_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct LimitConfig {
    /// Allowance given to a sender on first use
    pub default_allowance: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                name: "gardu-bot".to_string(),
                prefixes: ".#!".to_string(),
                owner: "owner@local".to_string(),
                admin_contact: "owner@local".to_string(),
            },
            plugins: PluginConfig {
                directory: PathBuf::from("./plugins"),
                auto_load: true,
            },
            storage: StorageConfig {
                path: PathBuf::from("./database.json"),
                flush_seconds: 30,
            },
            limits: LimitConfig {
                default_allowance: 10,
            },
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))
    }

    pub fn load_env() -> Self {
        // Load from environment variables on top of the defaults
        let mut config = Config::default();

        if let Ok(prefixes) = std::env::var("GARDU_PREFIXES") {
            config.bot.prefixes = prefixes;
        }
        if let Ok(owner) = std::env::var("GARDU_OWNER") {
            config.bot.admin_contact = owner.clone();
            config.bot.owner = owner;
        }

        config
    }

    /// The prefix characters as consumed by the resolver.
    pub fn prefix_chars(&self) -> Vec<char> {
        self.bot.prefixes.chars().collect()
    }
}
