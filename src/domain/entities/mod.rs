//! Domain entities - Core business objects of the routing engine

pub mod command;
pub mod event;
pub mod plugin;
pub mod usage;

pub use command::{CommandMode, ResolvedCommand};
pub use event::IncomingEvent;
pub use plugin::{ExecContext, Matcher, PluginDescriptor, PluginFlags, PluginHandler};
pub use usage::{SharedUsage, UsageData, UserQuotaRecord};
