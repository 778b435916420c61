//! deepshell game core.
//!
//! Owns the session, both filesystem layers, and the timed state machines
//! (shatter, countdown, layer switch). Everything runs on one thread
//! against a virtual millisecond clock that the front end advances with
//! [`GameController::tick`].

// Re-exports from the lower crates.
pub use deepshell_terminal as terminal;
pub use deepshell_types::config;
pub use deepshell_types::error;
pub use deepshell_vfs as vfs;

pub mod countdown;
pub mod game;
pub mod layer;
pub mod shatter;
pub mod store;
pub mod timer;
pub mod transcript;
pub mod world;

pub use game::GameController;
