//! Plugin manifest definition

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::application::errors::PluginError;
use crate::domain::entities::PluginFlags;

/// Metadata a plugin unit ships next to its library (`plugin.yaml`).
///
/// A unit must declare a matcher: either a non-empty `commands` token list
/// or a single whole-token `pattern`. Units without one are skipped at
/// load time.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PluginManifest {
    /// Plugin name (required)
    pub name: String,

    /// Plugin version
    pub version: Option<String>,

    /// Plugin description
    pub description: Option<String>,

    /// Command category shown in listings
    pub category: Option<String>,

    /// Literal tokens this plugin answers to
    #[serde(default)]
    pub commands: Vec<String>,

    /// Whole-token pattern, alternative to `commands`
    pub pattern: Option<String>,

    /// Restriction flags; every flag defaults to false when absent
    #[serde(flatten)]
    pub flags: PluginFlags,

    /// Path to the shared library, relative to the plugin directory
    pub library: Option<PathBuf>,
}

impl PluginManifest {
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, PluginError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PluginError::Load(format!("Failed to read manifest: {}", e)))?;

        serde_yaml::from_str(&content)
            .map_err(|e| PluginError::Load(format!("Failed to parse manifest: {}", e)))
    }

    /// Whether the manifest declares any matcher at all.
    pub fn has_matcher(&self) -> bool {
        !self.commands.is_empty() || self.pattern.is_some()
    }
}
