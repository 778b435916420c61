//! Filesystem nodes.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};
use deepshell_types::error::Result;
use indexmap::IndexMap;

use crate::archive::{ArchiveEntry, render_archive};
use crate::mode::Mode;
use crate::oracle::ContentOracle;

/// Ownership and permission metadata shared by both node kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meta {
    pub mode: Mode,
    pub owner: String,
    pub group: String,
}

impl Meta {
    pub fn new(mode: Mode, owner: &str, group: &str) -> Self {
        Self {
            mode,
            owner: owner.to_string(),
            group: group.to_string(),
        }
    }
}

/// What a file holds.
///
/// Only the world builder creates the non-inline variants. Anything a
/// player writes is inline text, whatever it looks like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    /// Plain text stored in the tree.
    Inline(String),
    /// Identifier to be resolved by the secure-content oracle.
    Secure(String),
    /// base64 of the secure content with this identifier. Decoding it
    /// yields [`FileContent::Secure`] with the same identifier.
    Encoded(String),
    /// Packed files, unpacked by `unzip`.
    Archive(Vec<ArchiveEntry>),
}

impl FileContent {
    /// Text as a reader sees it. Costs one oracle call per secure
    /// reference involved.
    pub fn render(&self, oracle: &dyn ContentOracle) -> Result<String> {
        match self {
            Self::Inline(text) => Ok(text.clone()),
            Self::Secure(id) => oracle.resolve(id),
            Self::Encoded(id) => Ok(BASE64_STANDARD.encode(oracle.resolve(id)?.as_bytes())),
            Self::Archive(entries) => render_archive(entries, oracle),
        }
    }
}

/// A regular file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    pub meta: Meta,
    pub content: FileContent,
    /// Size shown by `ls -l` when the content is not inline.
    pub size: Option<u64>,
}

impl File {
    pub fn new(meta: Meta, content: FileContent) -> Self {
        Self {
            meta,
            content,
            size: None,
        }
    }

    /// Size as reported by listings.
    pub fn display_size(&self) -> Option<u64> {
        match &self.content {
            FileContent::Inline(text) => Some(text.len() as u64),
            FileContent::Secure(_) | FileContent::Encoded(_) | FileContent::Archive(_) => self.size,
        }
    }
}

/// A directory with insertion-ordered, uniquely named children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    pub meta: Meta,
    children: IndexMap<String, Node>,
}

impl Directory {
    pub fn new(meta: Meta) -> Self {
        Self {
            meta,
            children: IndexMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.children.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.children.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.children.contains_key(name)
    }

    /// Insert or replace a child. A replaced child keeps its position.
    pub fn insert(&mut self, name: &str, node: Node) -> Option<Node> {
        self.children.insert(name.to_string(), node)
    }

    /// Remove a child, preserving the order of the remaining ones.
    pub fn remove(&mut self, name: &str) -> Option<Node> {
        self.children.shift_remove(name)
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// A node in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Directory(Directory),
    File(File),
}

impl Node {
    /// An empty directory.
    pub fn dir(mode: Mode, owner: &str, group: &str) -> Self {
        Self::Directory(Directory::new(Meta::new(mode, owner, group)))
    }

    /// A file with inline text.
    pub fn text(mode: Mode, owner: &str, group: &str, text: &str) -> Self {
        Self::File(File::new(
            Meta::new(mode, owner, group),
            FileContent::Inline(text.to_string()),
        ))
    }

    /// A file whose content lives behind the secure-content oracle.
    pub fn secure(mode: Mode, owner: &str, group: &str, id: &str, size: u64) -> Self {
        let mut file = File::new(
            Meta::new(mode, owner, group),
            FileContent::Secure(id.to_string()),
        );
        file.size = Some(size);
        Self::File(file)
    }

    /// A file holding the base64 form of a secure-content entry.
    pub fn encoded(mode: Mode, owner: &str, group: &str, id: &str, size: u64) -> Self {
        let mut file = File::new(
            Meta::new(mode, owner, group),
            FileContent::Encoded(id.to_string()),
        );
        file.size = Some(size);
        Self::File(file)
    }

    /// An archive of structured entries.
    pub fn archive(
        mode: Mode,
        owner: &str,
        group: &str,
        entries: Vec<ArchiveEntry>,
        size: u64,
    ) -> Self {
        let mut file = File::new(
            Meta::new(mode, owner, group),
            FileContent::Archive(entries),
        );
        file.size = Some(size);
        Self::File(file)
    }

    pub fn meta(&self) -> &Meta {
        match self {
            Self::Directory(d) => &d.meta,
            Self::File(f) => &f.meta,
        }
    }

    pub fn meta_mut(&mut self) -> &mut Meta {
        match self {
            Self::Directory(d) => &mut d.meta,
            Self::File(f) => &mut f.meta,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Directory(_))
    }

    /// Re-own this node and everything below it.
    pub fn chown_recursive(&mut self, owner: &str) {
        let meta = self.meta_mut();
        meta.owner = owner.to_string();
        meta.group = owner.to_string();
        if let Self::Directory(dir) = self {
            for child in dir.children.values_mut() {
                child.chown_recursive(owner);
            }
        }
    }
}
