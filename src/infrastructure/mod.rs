//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: configuration loading
//! - Storage: usage persistence
//! - Plugins: discovery, loading, registry
//! - Adapters: platform transports

pub mod adapters;
pub mod config;
pub mod plugins;
pub mod storage;
