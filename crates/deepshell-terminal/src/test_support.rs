//! Shared fixture for command tests.

use deepshell_types::config::GameConfig;
use deepshell_vfs::{ArchiveEntry, FileContent, FsTree, Meta, Mode, Node, StaticContentOracle};

use crate::interpreter::{CommandOutput, CommandRegistry, Environment};
use crate::oracle::StaticFlagOracle;
use crate::session::Session;
use crate::tools::ActiveTool;

fn mode(s: &str) -> Mode {
    s.parse().unwrap()
}

/// A small world:
///
/// ```text
/// /home/guest            guest  rwxr-xr-x  notes.txt, .hidden, key.b64 (encoded)
/// /home/operator         operator rwxr-x--- backup.zip (archive)
/// /tmp                   root   rwxrwxrwt  report.txt (operator)
/// /etc/shadow            root   rw-------
/// /keys                  root   rwxr-xr-x  deep.key (secure), fake.key
/// ```
pub fn tree() -> FsTree {
    let mut t = FsTree::new(Meta::new(Mode::DIR_DEFAULT, "root", "root"));
    t.insert("/", "home", Node::dir(Mode::DIR_DEFAULT, "root", "root"))
        .unwrap();
    t.insert("/home", "guest", Node::dir(Mode::DIR_DEFAULT, "guest", "guest"))
        .unwrap();
    t.insert(
        "/home/guest",
        "notes.txt",
        Node::text(Mode::FILE_DEFAULT, "guest", "guest", "hello"),
    )
    .unwrap();
    t.insert(
        "/home/guest",
        ".hidden",
        Node::text(Mode::FILE_DEFAULT, "guest", "guest", "secret"),
    )
    .unwrap();
    t.insert(
        "/home/guest",
        "key.b64",
        Node::encoded(Mode::FILE_DEFAULT, "guest", "guest", "deep-access-key", 556),
    )
    .unwrap();
    t.insert(
        "/home",
        "operator",
        Node::dir(mode("rwxr-x---"), "operator", "operator"),
    )
    .unwrap();
    t.insert(
        "/home/operator",
        "backup.zip",
        Node::archive(
            mode("rw-r-----"),
            "operator",
            "operator",
            vec![
                ArchiveEntry::new("id_rsa.b64", FileContent::Encoded("deep-access-key".to_string())),
                ArchiveEntry::new("NOTE.txt", FileContent::Inline("keep this safe\nreally".to_string())),
            ],
            640,
        ),
    )
    .unwrap();
    t.insert("/", "tmp", Node::dir(mode("rwxrwxrwt"), "root", "root"))
        .unwrap();
    t.insert(
        "/tmp",
        "report.txt",
        Node::text(mode("rw-rw-rw-"), "operator", "operator", "q3"),
    )
    .unwrap();
    t.insert("/", "etc", Node::dir(Mode::DIR_DEFAULT, "root", "root"))
        .unwrap();
    t.insert(
        "/etc",
        "shadow",
        Node::text(mode("rw-------"), "root", "root", "root:$6$x"),
    )
    .unwrap();
    t.insert("/", "keys", Node::dir(Mode::DIR_DEFAULT, "root", "root"))
        .unwrap();
    t.insert(
        "/keys",
        "deep.key",
        Node::secure(Mode::FILE_DEFAULT, "root", "root", "deep-access-key", 411),
    )
    .unwrap();
    t.insert(
        "/keys",
        "fake.key",
        Node::text(Mode::FILE_DEFAULT, "root", "root", "password123"),
    )
    .unwrap();
    t
}

pub struct Fixture {
    pub session: Session,
    pub fs: FsTree,
    pub content: StaticContentOracle,
    pub flags: StaticFlagOracle,
    pub config: GameConfig,
    pub tool: Option<ActiveTool>,
}

impl Fixture {
    pub fn new() -> Self {
        let config = GameConfig::default();
        Self {
            session: Session::new("guest", "/home/guest"),
            fs: tree(),
            content: StaticContentOracle::new(config.content.clone()),
            flags: StaticFlagOracle::new(config.flags.clone()),
            config,
            tool: None,
        }
    }

    pub fn env(&mut self) -> Environment<'_> {
        Environment {
            session: &mut self.session,
            fs: &mut self.fs,
            content: &self.content,
            flags: &self.flags,
            config: &self.config,
            tool: &mut self.tool,
        }
    }

    /// Submit a line and return its output.
    pub fn run(&mut self, reg: &CommandRegistry, line: &str) -> CommandOutput {
        reg.submit(line, &mut self.env())
    }

    /// Submit a line and return its text (empty for no output).
    pub fn text(&mut self, reg: &CommandRegistry, line: &str) -> String {
        match self.run(reg, line) {
            CommandOutput::Text(s) => s,
            CommandOutput::None => String::new(),
            other => panic!("expected text, got {other:?}"),
        }
    }
}
