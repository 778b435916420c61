//! Foundation types for deepshell.
//!
//! Platform-agnostic types shared by every deepshell crate: the error enum
//! and the TOML-backed game configuration.

pub mod config;
pub mod error;
