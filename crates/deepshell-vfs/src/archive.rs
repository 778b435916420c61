//! Archive file format.
//!
//! Seeded archives hold structured [`ArchiveEntry`]s so an entry can carry
//! secure content. Archives written by players are plain text in the same
//! layout and always unpack to inline files.

use deepshell_types::error::Result;

use crate::node::FileContent;
use crate::oracle::ContentOracle;

/// First line of every archive file.
pub const ARCHIVE_MAGIC: &str = "PK-ARCHIVE";

/// Prefix of an entry header line inside an archive.
const ENTRY_HEADER: &str = "--- ";

/// One packed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub content: FileContent,
}

impl ArchiveEntry {
    pub fn new(name: &str, content: FileContent) -> Self {
        Self {
            name: name.to_string(),
            content,
        }
    }
}

/// Whether `name` may appear as an entry name (a single path segment).
pub fn valid_entry_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('/') && name != "." && name != ".."
}

/// Parse archive text into inline entries.
///
/// Layout: the magic line, then any number of `--- <name>` headers each
/// followed by the entry's lines.
pub fn parse_archive(text: &str) -> Option<Vec<ArchiveEntry>> {
    let mut lines = text.lines();
    if lines.next()?.trim() != ARCHIVE_MAGIC {
        return None;
    }
    let mut entries: Vec<(String, Vec<&str>)> = Vec::new();
    for line in lines {
        if let Some(name) = line.strip_prefix(ENTRY_HEADER) {
            let name = name.trim();
            if !valid_entry_name(name) {
                return None;
            }
            entries.push((name.to_string(), Vec::new()));
        } else {
            entries.last_mut()?.1.push(line);
        }
    }
    Some(
        entries
            .into_iter()
            .map(|(name, body)| ArchiveEntry::new(&name, FileContent::Inline(body.join("\n"))))
            .collect(),
    )
}

/// Render structured entries in the text layout.
pub fn render_archive(entries: &[ArchiveEntry], oracle: &dyn ContentOracle) -> Result<String> {
    let mut out = String::from(ARCHIVE_MAGIC);
    for entry in entries {
        out.push('\n');
        out.push_str(ENTRY_HEADER);
        out.push_str(&entry.name);
        out.push('\n');
        out.push_str(&entry.content.render(oracle)?);
    }
    Ok(out)
}
