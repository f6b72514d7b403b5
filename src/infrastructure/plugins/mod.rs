//! Plugin system for gardu-bot
//!
//! Plugin units are discovered by a `PluginSource` (directory of shared
//! libraries with `plugin.yaml` manifests, or a static list) and held as
//! an atomically swapped descriptor set in the `PluginRegistry`.

pub mod loader;
pub mod manifest;
pub mod registry;

pub use loader::DirectorySource;
pub use manifest::PluginManifest;
pub use registry::{PluginRegistry, PluginSource, RegistrySnapshot, StaticSource};
