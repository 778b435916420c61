//! Permissioned virtual filesystem for deepshell.
//!
//! The tree is an owned hierarchy of [`Node`]s. Every mutation takes the
//! acting user and is checked by the permission evaluator in [`perms`]
//! before anything is edited. Paths are resolved by the pure functions in
//! [`path`]; the tree itself only ever sees canonical absolute paths.

pub mod archive;
pub mod mode;
pub mod node;
pub mod oracle;
pub mod path;
pub mod perms;
pub mod tree;

pub use archive::{ARCHIVE_MAGIC, ArchiveEntry, parse_archive};
pub use mode::{Capability, Mode};
pub use node::{Directory, File, FileContent, Meta, Node};
pub use oracle::{ContentOracle, StaticContentOracle};
pub use path::{HOME_DIR, resolve_path};
pub use perms::{can_delete, has_permission};
pub use tree::{DirEntry, FsTree};
