//! Error types for deepshell.

use std::io;

/// Errors produced by the deepshell simulation.
///
/// Filesystem variants carry the offending path and render the way a Unix
/// shell would (`/etc/shadow: Permission denied`), so the dispatcher can
/// prefix them with the command name and print them as-is.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("{0}: No such file or directory")]
    NotFound(String),

    #[error("{0}: Permission denied")]
    PermissionDenied(String),

    #[error("{0}: Not a directory")]
    NotADirectory(String),

    #[error("{0}: Is a directory")]
    IsADirectory(String),

    #[error("{0}: File exists")]
    AlreadyExists(String),

    /// Bad arguments or any other user-facing command error.
    #[error("{0}")]
    Command(String),

    #[error("content oracle error: {0}")]
    Oracle(String),

    /// A configuration value the game cannot run with.
    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GameError {
    /// Whether this error is an ordinary user mistake (bad arguments,
    /// missing file, permission denied) rather than an internal fault.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::PermissionDenied(_)
                | Self::NotADirectory(_)
                | Self::IsADirectory(_)
                | Self::AlreadyExists(_)
                | Self::Command(_)
        )
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, GameError>;
