//! Message handling - The resolve → match → authorize → execute pipeline

pub mod dispatcher;
pub mod reporter;
pub mod resolver;

#[cfg(test)]
mod tests;

pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use reporter::ErrorReporter;
pub use resolver::CommandResolver;
