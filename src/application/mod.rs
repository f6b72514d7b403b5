//! Application layer - Routing and authorization use cases
//!
//! This layer contains:
//! - Errors: the dispatch error taxonomy
//! - Messaging: resolver, dispatcher, error reporter

pub mod errors;
pub mod messaging;
