//! Command interpreter and shell session.
//!
//! The terminal is a registry-based dispatch system. Commands implement the
//! `Command` trait and are registered by name and aliases. The registry
//! routes each input line either to a pending interactive tool or through
//! tokenization to a command, and never lets an error or panic escape.

pub mod archive_commands;
mod commands;
pub mod file_commands;
pub mod flag_commands;
mod interpreter;
pub mod network_commands;
pub mod oracle;
pub mod security_commands;
pub mod session;
pub mod tools;

/// Register the deep layer's command set into a registry.
pub use commands::register_deep;
/// Register the standard layer's command set into a registry.
pub use commands::register_standard;
/// A single executable command trait.
pub use interpreter::Command;
/// Output produced by a command (text or controller signal).
pub use interpreter::CommandOutput;
/// Registry of available commands with dispatch.
pub use interpreter::CommandRegistry;
/// Shared mutable environment passed to every command.
pub use interpreter::Environment;
pub use interpreter::tokenize;
pub use oracle::{FlagOracle, FlagVerdict, StaticFlagOracle};
pub use session::{Layer, Session};
pub use tools::ActiveTool;

#[cfg(test)]
pub(crate) mod test_support;
