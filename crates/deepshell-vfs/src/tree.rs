//! The filesystem tree.
//!
//! All paths taken by [`FsTree`] are canonical absolute paths as produced by
//! [`resolve_path`](crate::path::resolve_path). Every mutation validates
//! completely (existence, node kinds, permissions) before it edits the tree,
//! so a failed operation leaves the tree exactly as it was.

use deepshell_types::error::{GameError, Result};

use crate::mode::{Capability, Mode};
use crate::node::{Directory, File, FileContent, Meta, Node};
use crate::oracle::ContentOracle;
use crate::path::{join, parent_and_name, segments};
use crate::perms::{ROOT_USER, can_delete, has_permission};

/// One row of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
    pub meta: Meta,
    pub size: Option<u64>,
}

impl DirEntry {
    fn from_node(name: &str, node: &Node) -> Self {
        Self {
            name: name.to_string(),
            is_dir: node.is_dir(),
            meta: node.meta().clone(),
            size: match node {
                Node::Directory(_) => Some(4096),
                Node::File(f) => f.display_size(),
            },
        }
    }
}

/// An in-memory ownership tree rooted at a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsTree {
    root: Node,
}

fn require(meta: &Meta, user: &str, cap: Capability, path: &str) -> Result<()> {
    if has_permission(meta, user, cap) {
        Ok(())
    } else {
        Err(GameError::PermissionDenied(path.to_string()))
    }
}

/// Split off the parent; root has none and can never be created, removed
/// or renamed.
fn split(path: &str) -> Result<(&str, &str)> {
    parent_and_name(path).ok_or_else(|| GameError::PermissionDenied("/".to_string()))
}

impl FsTree {
    /// Create a tree whose root directory carries `meta`.
    pub fn new(meta: Meta) -> Self {
        Self {
            root: Node::Directory(Directory::new(meta)),
        }
    }

    /// Walk `path` segment by segment.
    pub fn lookup(&self, path: &str) -> Result<&Node> {
        let mut node = &self.root;
        for seg in segments(path) {
            let Node::Directory(dir) = node else {
                return Err(GameError::NotADirectory(path.to_string()));
            };
            node = dir
                .get(seg)
                .ok_or_else(|| GameError::NotFound(path.to_string()))?;
        }
        Ok(node)
    }

    fn lookup_mut(&mut self, path: &str) -> Result<&mut Node> {
        let mut node = &mut self.root;
        for seg in segments(path) {
            let Node::Directory(dir) = node else {
                return Err(GameError::NotADirectory(path.to_string()));
            };
            node = dir
                .get_mut(seg)
                .ok_or_else(|| GameError::NotFound(path.to_string()))?;
        }
        Ok(node)
    }

    fn dir(&self, path: &str) -> Result<&Directory> {
        match self.lookup(path)? {
            Node::Directory(d) => Ok(d),
            Node::File(_) => Err(GameError::NotADirectory(path.to_string())),
        }
    }

    fn dir_mut(&mut self, path: &str) -> Result<&mut Directory> {
        match self.lookup_mut(path)? {
            Node::Directory(d) => Ok(d),
            Node::File(_) => Err(GameError::NotADirectory(path.to_string())),
        }
    }

    pub fn exists(&self, path: &str) -> bool {
        self.lookup(path).is_ok()
    }

    pub fn is_dir(&self, path: &str) -> bool {
        self.lookup(path).is_ok_and(Node::is_dir)
    }

    /// Check that `user` may make `path` its working directory.
    pub fn enter(&self, path: &str, user: &str) -> Result<()> {
        let dir = self.dir(path)?;
        require(&dir.meta, user, Capability::Execute, path)
    }

    /// List a directory (or describe a single file).
    pub fn list(&self, path: &str, user: &str) -> Result<Vec<DirEntry>> {
        match self.lookup(path)? {
            Node::Directory(dir) => {
                require(&dir.meta, user, Capability::Read, path)?;
                Ok(dir
                    .children()
                    .map(|(name, node)| DirEntry::from_node(name, node))
                    .collect())
            },
            node @ Node::File(_) => {
                let name = parent_and_name(path).map_or(path, |(_, n)| n);
                Ok(vec![DirEntry::from_node(name, node)])
            },
        }
    }

    /// Read a file's text, resolving secure references through `oracle`.
    ///
    /// A secure reference costs exactly one oracle call per read.
    pub fn read_file(&self, path: &str, user: &str, oracle: &dyn ContentOracle) -> Result<String> {
        self.read_content(path, user)?.render(oracle)
    }

    /// Read a file's stored content without resolving it. Needs read
    /// permission like [`read_file`](Self::read_file).
    pub fn read_content(&self, path: &str, user: &str) -> Result<&FileContent> {
        match self.lookup(path)? {
            Node::Directory(_) => Err(GameError::IsADirectory(path.to_string())),
            Node::File(file) => {
                require(&file.meta, user, Capability::Read, path)?;
                Ok(&file.content)
            },
        }
    }

    /// Create a directory owned by `user`.
    pub fn mkdir(&mut self, path: &str, user: &str) -> Result<()> {
        let (parent, name) = parent_and_name(path)
            .ok_or_else(|| GameError::AlreadyExists(path.to_string()))?;
        let dir = self.dir_mut(parent)?;
        require(&dir.meta, user, Capability::Write, path)?;
        if dir.contains(name) {
            return Err(GameError::AlreadyExists(path.to_string()));
        }
        dir.insert(name, Node::dir(Mode::DIR_DEFAULT, user, user));
        Ok(())
    }

    /// Create an empty file owned by `user`. Existing nodes are untouched.
    pub fn touch(&mut self, path: &str, user: &str) -> Result<()> {
        if self.exists(path) {
            return Ok(());
        }
        let (parent, name) = split(path)?;
        let dir = self.dir_mut(parent)?;
        require(&dir.meta, user, Capability::Write, path)?;
        dir.insert(name, Node::text(Mode::FILE_DEFAULT, user, user, ""));
        Ok(())
    }

    /// Create or overwrite a file.
    ///
    /// A new file needs write on the parent and is owned by `user`; an
    /// existing file needs write on itself and keeps its metadata.
    pub fn write_file(&mut self, path: &str, content: FileContent, user: &str) -> Result<()> {
        let (parent, name) = split(path)?;
        let dir = self.dir_mut(parent)?;
        match dir.get_mut(name) {
            Some(Node::Directory(_)) => Err(GameError::IsADirectory(path.to_string())),
            Some(Node::File(file)) => {
                require(&file.meta, user, Capability::Write, path)?;
                file.content = content;
                file.size = None;
                Ok(())
            },
            None => {
                require(&dir.meta, user, Capability::Write, path)?;
                let meta = Meta::new(Mode::FILE_DEFAULT, user, user);
                dir.insert(name, Node::File(File::new(meta, content)));
                Ok(())
            },
        }
    }

    /// Remove a file, or a directory when `recursive` is set.
    pub fn remove(&mut self, path: &str, user: &str, recursive: bool) -> Result<()> {
        let (parent, name) = split(path)?;
        let dir = self.dir_mut(parent)?;
        let child = dir
            .get(name)
            .ok_or_else(|| GameError::NotFound(path.to_string()))?;
        if child.is_dir() && !recursive {
            return Err(GameError::IsADirectory(path.to_string()));
        }
        if !can_delete(dir, name, user) {
            return Err(GameError::PermissionDenied(path.to_string()));
        }
        dir.remove(name);
        Ok(())
    }

    /// Where a move or copy of `from` to `to` lands: inside `to` when it
    /// is an existing directory, at `to` otherwise.
    fn landing_path(&self, from: &str, to: &str) -> Result<String> {
        let (_, name) = split(from)?;
        if self.is_dir(to) {
            Ok(join(to, name))
        } else {
            Ok(to.to_string())
        }
    }

    /// Validate that `source` may land at `dest`, replacing whatever is
    /// there. `replace_check` decides whether an existing file may go.
    fn check_landing(
        &self,
        source: &Node,
        dest: &str,
        user: &str,
        replace_check: impl Fn(&Directory, &str) -> bool,
    ) -> Result<()> {
        let (dst_parent, dst_name) = split(dest)?;
        let dp = self.dir(dst_parent)?;
        require(&dp.meta, user, Capability::Write, dest)?;
        match dp.get(dst_name) {
            None => Ok(()),
            Some(Node::Directory(_)) => Err(GameError::AlreadyExists(dest.to_string())),
            Some(Node::File(_)) if source.is_dir() => {
                Err(GameError::NotADirectory(dest.to_string()))
            },
            Some(Node::File(_)) => {
                if replace_check(dp, dst_name) {
                    Ok(())
                } else {
                    Err(GameError::PermissionDenied(dest.to_string()))
                }
            },
        }
    }

    /// Move `from` to `to`. Returns the final path.
    pub fn rename(&mut self, from: &str, to: &str, user: &str) -> Result<String> {
        let (src_parent, src_name) = split(from)?;
        let source = self.lookup(from)?;
        let dest = self.landing_path(from, to)?;
        if dest == from {
            return Ok(dest);
        }
        if dest.starts_with(&format!("{from}/")) {
            return Err(GameError::Command(format!(
                "cannot move '{from}' to a subdirectory of itself, '{dest}'"
            )));
        }
        if !can_delete(self.dir(src_parent)?, src_name, user) {
            return Err(GameError::PermissionDenied(from.to_string()));
        }
        self.check_landing(source, &dest, user, |dir, name| can_delete(dir, name, user))?;

        let (dst_parent, dst_name) = split(&dest)?;
        let node = self
            .dir_mut(src_parent)?
            .remove(src_name)
            .ok_or_else(|| GameError::NotFound(from.to_string()))?;
        match self.dir_mut(dst_parent) {
            Ok(dir) => {
                dir.insert(dst_name, node);
                Ok(dest)
            },
            Err(e) => {
                // Unreachable after validation; put the node back regardless.
                if let Ok(dir) = self.dir_mut(src_parent) {
                    dir.insert(src_name, node);
                }
                Err(e)
            },
        }
    }

    /// Deep-copy `from` to `to`. Returns the final path.
    ///
    /// Directories need `recursive`. The copy is owned by `user` and shares
    /// nothing with the source.
    pub fn copy(&mut self, from: &str, to: &str, user: &str, recursive: bool) -> Result<String> {
        let source = self.lookup(from)?;
        require(source.meta(), user, Capability::Read, from)?;
        if source.is_dir() && !recursive {
            return Err(GameError::Command(format!(
                "-r not specified; omitting directory '{from}'"
            )));
        }
        let dest = self.landing_path(from, to)?;
        if dest == from || (source.is_dir() && dest.starts_with(&format!("{from}/"))) {
            return Err(GameError::Command(format!(
                "cannot copy '{from}' into itself, '{dest}'"
            )));
        }
        self.check_landing(source, &dest, user, |dir, name| {
            dir.get(name)
                .is_some_and(|n| has_permission(n.meta(), user, Capability::Write))
        })?;

        let mut clone = source.clone();
        clone.chown_recursive(user);
        let (dst_parent, dst_name) = split(&dest)?;
        self.dir_mut(dst_parent)?.insert(dst_name, clone);
        Ok(dest)
    }

    /// Change a node's permission string. Only the owner and root may.
    pub fn chmod(&mut self, path: &str, spec: &str, user: &str) -> Result<Mode> {
        let node = self.lookup_mut(path)?;
        let mode = node
            .meta()
            .mode
            .apply(spec)
            .ok_or_else(|| GameError::Command(format!("invalid mode: '{spec}'")))?;
        if user != ROOT_USER && node.meta().owner != user {
            return Err(GameError::Command(format!(
                "changing permissions of '{path}': Operation not permitted"
            )));
        }
        node.meta_mut().mode = mode;
        Ok(mode)
    }

    /// Insert a node without any permission check. Used to seed worlds.
    pub fn insert(&mut self, parent: &str, name: &str, node: Node) -> Result<()> {
        self.dir_mut(parent)?.insert(name, node);
        Ok(())
    }
}
