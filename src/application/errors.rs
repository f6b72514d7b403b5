//! Application layer errors

use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Plugin error: {0}")]
    Plugin(#[from] PluginError),

    #[error("Handler failed: {0}")]
    Handler(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why an authorized check turned an invocation away.
///
/// Denials are user-visible outcomes, not system errors; they are never
/// logged as failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The sender's remaining allowance is exhausted.
    QuotaExceeded,
    /// The plugin is restricted to the owner identity.
    Forbidden,
    /// The plugin needs a group chat and the event came from a direct chat.
    ContextMismatch,
}

impl DenyReason {
    /// The notice shown to the sender.
    pub fn user_notice(&self) -> &'static str {
        match self {
            DenyReason::QuotaExceeded => {
                "❌ Your daily limit is used up! Wait for the reset or upgrade to premium."
            }
            DenyReason::Forbidden => "❌ This command is owner-only!",
            DenyReason::ContextMismatch => "❌ This command only works inside a group!",
        }
    }
}

/// Plugin discovery/loading errors
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Load failed: {0}")]
    Load(String),

    #[error("Invalid matcher: {0}")]
    InvalidMatcher(String),

    #[error("Plugin not found: {0}")]
    NotFound(String),
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
