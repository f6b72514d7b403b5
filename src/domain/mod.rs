//! Domain layer - Core routing types with no infrastructure concerns
//!
//! This layer contains:
//! - Entities: IncomingEvent, ResolvedCommand, PluginDescriptor, UsageData
//! - Traits: Transport and Persistence collaborator contracts

pub mod entities;
pub mod traits;
