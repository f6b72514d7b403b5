//! Plugin loader - Discovers plugin units from a directory of shared libraries

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use libloading::{Library, Symbol};

use crate::application::errors::{BotError, PluginError};
use crate::domain::entities::{ExecContext, IncomingEvent, Matcher, PluginDescriptor, PluginHandler};
use super::manifest::PluginManifest;
use super::registry::PluginSource;

/// Function signature a plugin library exports.
pub type PluginInitFn = extern "C" fn() -> *mut dyn PluginHandler;

/// Keeps the shared library alive for as long as its handler is reachable.
struct LoadedHandler {
    #[allow(dead_code)]
    library: Library,
    inner: Arc<dyn PluginHandler>,
}

#[async_trait]
impl PluginHandler for LoadedHandler {
    async fn invoke(&self, event: &IncomingEvent, ctx: &ExecContext) -> Result<(), BotError> {
        self.inner.invoke(event, ctx).await
    }
}

/// Discovers plugin units under a directory. Each unit is a subdirectory
/// with a `plugin.yaml` manifest and a shared library exporting
/// `gardu_plugin_init`. Invalid units are logged and skipped; discovery
/// itself never fails the load.
pub struct DirectorySource {
    plugin_dir: PathBuf,
}

impl DirectorySource {
    pub fn new(plugin_dir: impl Into<PathBuf>) -> Self {
        Self {
            plugin_dir: plugin_dir.into(),
        }
    }

    fn load_unit(&self, path: &Path) -> Result<PluginDescriptor, PluginError> {
        let manifest_path = path.join("plugin.yaml");
        if !manifest_path.exists() {
            return Err(PluginError::Load(format!(
                "Missing plugin.yaml in {}",
                path.display()
            )));
        }

        let manifest = PluginManifest::from_file(&manifest_path)?;

        // A unit becomes a descriptor only with both a matcher and a
        // handler capability.
        if !manifest.has_matcher() {
            return Err(PluginError::InvalidMatcher(format!(
                "{} declares neither commands nor a pattern",
                manifest.name
            )));
        }
        let matcher = if !manifest.commands.is_empty() {
            Matcher::tokens(manifest.commands.iter().cloned())
        } else {
            let pattern = manifest.pattern.as_deref().unwrap_or_default();
            Matcher::pattern(pattern)
                .map_err(|e| PluginError::InvalidMatcher(format!("{}: {}", manifest.name, e)))?
        };

        let library_path = match &manifest.library {
            Some(lib) => path.join(lib),
            None => path.join(format!("libgardu_{}.so", manifest.name)),
        };
        if !library_path.exists() {
            return Err(PluginError::Load(format!(
                "Library not found: {}",
                library_path.display()
            )));
        }

        let library = unsafe {
            Library::new(&library_path)
                .map_err(|e| PluginError::Load(format!("Failed to load library: {}", e)))?
        };

        let init_fn: Symbol<PluginInitFn> = unsafe {
            library
                .get(b"gardu_plugin_init")
                .map_err(|e| PluginError::Load(format!("Failed to find init function: {}", e)))?
        };

        let handler = unsafe {
            let handler_ptr = init_fn();
            if handler_ptr.is_null() {
                return Err(PluginError::Load("Plugin init returned null".to_string()));
            }
            Arc::from_raw(handler_ptr)
        };

        tracing::info!(
            "Loaded plugin: {} v{}",
            manifest.name,
            manifest.version.as_deref().unwrap_or("0")
        );

        Ok(PluginDescriptor::new(
            manifest.name.clone(),
            matcher,
            Arc::new(LoadedHandler {
                library,
                inner: handler,
            }),
        )
        .with_category(manifest.category.unwrap_or_else(|| "misc".to_string()))
        .with_flags(manifest.flags))
    }
}

impl PluginSource for DirectorySource {
    fn discover(&self) -> Vec<PluginDescriptor> {
        let mut descriptors = Vec::new();

        if !self.plugin_dir.exists() {
            tracing::warn!(
                "Plugin directory does not exist: {}",
                self.plugin_dir.display()
            );
            return descriptors;
        }

        let entries = match std::fs::read_dir(&self.plugin_dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(%e, "Failed to read plugin directory");
                return descriptors;
            }
        };

        // Sorted walk keeps load order, and thus match priority, stable
        // across reloads.
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| !n.starts_with('.'))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        for path in paths {
            match self.load_unit(&path) {
                Ok(descriptor) => descriptors.push(descriptor),
                Err(e) => {
                    tracing::warn!("Skipping plugin at {}: {}", path.display(), e);
                }
            }
        }

        descriptors
    }
}
