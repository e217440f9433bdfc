// Discord layer - commands and event handlers.

#[path = "commands/command_catalog.rs"]
pub mod commands;
#[path = "ranks/message_events.rs"]
pub mod message_events;

// Re-export command types for convenience
pub use commands::ranks::{Context, Data, Error};
