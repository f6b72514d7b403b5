//! Domain traits - Abstractions for the external collaborators

pub mod store;
pub mod transport;

pub use store::Persistence;
pub use transport::{GroupParticipant, Transport};
