//! Plugin registry - Atomically swapped active descriptor set

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::entities::{CommandMode, PluginDescriptor};

/// Where plugin units come from. Discovery yields only fully-formed
/// descriptors; sources skip and log anything invalid.
pub trait PluginSource: Send + Sync {
    fn discover(&self) -> Vec<PluginDescriptor>;
}

/// A fixed descriptor list used for built-in commands and tests.
pub struct StaticSource {
    descriptors: Vec<PluginDescriptor>,
}

impl StaticSource {
    pub fn new(descriptors: Vec<PluginDescriptor>) -> Self {
        Self { descriptors }
    }
}

impl PluginSource for StaticSource {
    fn discover(&self) -> Vec<PluginDescriptor> {
        self.descriptors.clone()
    }
}

/// An immutable view of the active plugin set, captured once per dispatch.
/// A reload while the dispatch is in flight never changes what the
/// snapshot sees.
#[derive(Clone)]
pub struct RegistrySnapshot {
    descriptors: Arc<Vec<Arc<PluginDescriptor>>>,
}

impl RegistrySnapshot {
    /// First descriptor in load order that serves `mode` and whose
    /// matcher accepts `token`.
    pub fn find(&self, token: &str, mode: CommandMode) -> Option<Arc<PluginDescriptor>> {
        self.descriptors
            .iter()
            .find(|d| d.accepts(token, mode))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<PluginDescriptor>> {
        self.descriptors.iter()
    }
}

/// Holds the active plugin set. `reload` replaces the whole `Arc`-held
/// list in one step, so concurrent dispatches see either the fully-old or
/// fully-new set, never a mix.
pub struct PluginRegistry {
    source: Box<dyn PluginSource>,
    active: RwLock<Arc<Vec<Arc<PluginDescriptor>>>>,
}

impl PluginRegistry {
    pub fn new(source: Box<dyn PluginSource>) -> Self {
        Self {
            source,
            active: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Run discovery and install the result as the active set.
    pub fn load(&self) -> usize {
        let descriptors: Vec<Arc<PluginDescriptor>> =
            self.source.discover().into_iter().map(Arc::new).collect();
        let count = descriptors.len();
        *self.write_active() = Arc::new(descriptors);
        tracing::info!("Plugin registry loaded {} descriptors", count);
        count
    }

    /// Re-run discovery and atomically swap the active set.
    pub fn reload(&self) -> usize {
        let count = self.load();
        tracing::info!("Plugin registry reloaded");
        count
    }

    /// Capture the current active set.
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            descriptors: Arc::clone(&self.read_active()),
        }
    }

    /// Convenience lookup against the current set; dispatches that need a
    /// stable view across steps capture a snapshot instead.
    pub fn find(&self, token: &str, mode: CommandMode) -> Option<Arc<PluginDescriptor>> {
        self.snapshot().find(token, mode)
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    // The lock guards nothing but an Arc swap; a poisoned lock still holds
    // a consistent value, so recover it instead of failing dispatch.
    fn read_active(&self) -> RwLockReadGuard<'_, Arc<Vec<Arc<PluginDescriptor>>>> {
        self.active.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_active(&self) -> RwLockWriteGuard<'_, Arc<Vec<Arc<PluginDescriptor>>>> {
        self.active.write().unwrap_or_else(|e| e.into_inner())
    }
}
