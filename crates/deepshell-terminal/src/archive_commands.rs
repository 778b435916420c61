//! Content codecs: base64 and unzip.
//!
//! Secure content keeps its provenance through both: encoding a secure file
//! yields an encoded one and decoding that yields the secure file again.
//! Anything derived from player text stays inline.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};
use deepshell_types::error::{GameError, Result};
use deepshell_vfs::path::join;
use deepshell_vfs::{FileContent, parse_archive};

use crate::interpreter::{Command, CommandOutput, CommandRegistry, Environment};

/// Register codec commands into a registry.
pub fn register_archive_commands(reg: &mut CommandRegistry) {
    reg.register(Box::new(Base64Cmd));
    reg.register(Box::new(UnzipCmd));
}

fn decode_text(text: &str) -> Result<String> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64_STANDARD
        .decode(compact.as_bytes())
        .map_err(|_| GameError::Command("invalid input".to_string()))?;
    String::from_utf8(bytes).map_err(|_| GameError::Command("decoded data is not text".to_string()))
}

// ---------------------------------------------------------------------------
// base64
// ---------------------------------------------------------------------------

struct Base64Cmd;
impl Command for Base64Cmd {
    fn name(&self) -> &str {
        "base64"
    }
    fn description(&self) -> &str {
        "Encode or decode (-d) a file, optionally into another file"
    }
    fn usage(&self) -> &str {
        "base64 [-d] <file> [output]"
    }
    fn category(&self) -> &str {
        "tools"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let (decode, rest) = match args {
            ["-d" | "--decode", rest @ ..] => (true, rest),
            rest => (false, rest),
        };
        let (input, output) = match rest {
            [input] => (*input, None),
            [input, output] => (*input, Some(*output)),
            _ => {
                return Err(GameError::Command(
                    "usage: base64 [-d] <file> [output]".to_string(),
                ));
            },
        };

        let path = env.resolve(input);
        let source = env.fs.read_content(&path, &env.session.user)?.clone();
        let result = match (decode, source) {
            (true, FileContent::Encoded(id)) => FileContent::Secure(id),
            (false, FileContent::Secure(id)) => FileContent::Encoded(id),
            (true, other) => FileContent::Inline(decode_text(&other.render(env.content)?)?),
            (false, other) => {
                FileContent::Inline(BASE64_STANDARD.encode(other.render(env.content)?.as_bytes()))
            },
        };

        match output {
            None => Ok(CommandOutput::Text(result.render(env.content)?)),
            Some(out) => {
                let out_path = env.resolve(out);
                env.fs.write_file(&out_path, result, &env.session.user)?;
                log::debug!("base64 wrote {out_path}");
                Ok(CommandOutput::None)
            },
        }
    }
}

// ---------------------------------------------------------------------------
// unzip
// ---------------------------------------------------------------------------

struct UnzipCmd;
impl Command for UnzipCmd {
    fn name(&self) -> &str {
        "unzip"
    }
    fn description(&self) -> &str {
        "Extract an archive"
    }
    fn usage(&self) -> &str {
        "unzip <archive> [-d <dir>]"
    }
    fn category(&self) -> &str {
        "tools"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let mut archive = None;
        let mut dest = None;
        let mut iter = args.iter();
        while let Some(&arg) = iter.next() {
            if arg == "-d" {
                let dir = iter
                    .next()
                    .ok_or_else(|| GameError::Command("option -d requires a directory".to_string()))?;
                dest = Some(*dir);
            } else {
                archive = Some(arg);
            }
        }
        let archive =
            archive.ok_or_else(|| GameError::Command("usage: unzip <archive> [-d <dir>]".to_string()))?;

        let archive_path = env.resolve(archive);
        let dest_dir = env.resolve(dest.unwrap_or("."));
        let not_archive = || GameError::Command(format!("{archive_path}: not a zip archive"));
        let entries = match env.fs.read_content(&archive_path, &env.session.user)? {
            FileContent::Archive(entries) => entries.clone(),
            FileContent::Inline(text) => parse_archive(text).ok_or_else(not_archive)?,
            FileContent::Secure(_) | FileContent::Encoded(_) => return Err(not_archive()),
        };

        // Extract into a scratch copy so a failure midway leaves the tree
        // untouched.
        let mut staged = env.fs.clone();
        let mut lines = vec![format!("Archive:  {archive_path}")];
        for entry in entries {
            let target = join(&dest_dir, &entry.name);
            staged.write_file(&target, entry.content, &env.session.user)?;
            lines.push(format!("  inflating: {target}"));
        }
        *env.fs = staged;
        Ok(CommandOutput::Text(lines.join("\n")))
    }
}
