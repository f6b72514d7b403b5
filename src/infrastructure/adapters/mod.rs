//! Platform adapters implementing the Transport trait

pub mod console;

pub use console::ConsoleTransport;
