//! Command trait, registry, and dispatch logic.
//!
//! Supports quoted arguments and backslash escapes. Every input line ends
//! as rendered output: unknown names, command errors, and handler panics
//! are all turned into text here.

use std::collections::{BTreeMap, HashMap};
use std::panic::{self, AssertUnwindSafe};

use deepshell_types::config::GameConfig;
use deepshell_types::error::{GameError, Result};
use deepshell_vfs::{ContentOracle, FsTree, HOME_DIR, resolve_path};

use crate::oracle::FlagOracle;
use crate::session::Session;
use crate::tools::{self, ActiveTool};

/// Output produced by a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// Plain text lines.
    Text(String),
    /// Command produced no visible output.
    None,
    /// Signal to clear the transcript.
    Clear,
    /// Signal to the controller to open the deep layer on `host`.
    Connect { host: String },
    /// Signal to the controller to leave the deep layer.
    Disconnect,
    /// Signal carrying a flag verdict for the countdown and persistence.
    FlagChecked { accepted: bool, id: Option<u32> },
}

/// Shared mutable environment passed to every command.
///
/// Borrows live only for one dispatch, so handlers cannot keep any of it.
pub struct Environment<'a> {
    pub session: &'a mut Session,
    /// Tree of the layer the session is bound to.
    pub fs: &'a mut FsTree,
    pub content: &'a dyn ContentOracle,
    pub flags: &'a dyn FlagOracle,
    pub config: &'a GameConfig,
    /// Slot for a multi-turn interactive tool.
    pub tool: &'a mut Option<ActiveTool>,
}

impl Environment<'_> {
    /// Resolve a user-supplied path against the working directory.
    pub fn resolve(&self, input: &str) -> String {
        resolve_path(input, &self.session.cwd)
    }

    /// Home of the acting user in the current layer.
    pub fn home(&self) -> String {
        if self.session.is_deep() {
            return self.config.shell.deep_path.clone();
        }
        self.config
            .account(&self.session.user)
            .map_or_else(|| HOME_DIR.to_string(), |a| a.home.clone())
    }
}

/// A single executable command.
pub trait Command {
    /// The command name (what the user types).
    fn name(&self) -> &str;

    /// Alternative names resolving to this command.
    fn aliases(&self) -> &[&str] {
        &[]
    }

    /// One-line description for `help`.
    fn description(&self) -> &str;

    /// Usage string (e.g. "ls \[-a\] \[-l\] \[path\]").
    fn usage(&self) -> &str;

    /// Command category for grouping in `help` output.
    fn category(&self) -> &str {
        "general"
    }

    /// Execute the command with the given arguments and environment.
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput>;
}

/// Registry of available commands with dispatch.
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Box<dyn Command>>,
    aliases: HashMap<String, String>,
}

impl CommandRegistry {
    /// Create an empty command registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command and its aliases. Replaces any existing command
    /// with the same name.
    pub fn register(&mut self, cmd: Box<dyn Command>) {
        for alias in cmd.aliases() {
            self.aliases.insert((*alias).to_string(), cmd.name().to_string());
        }
        self.commands.insert(cmd.name().to_string(), cmd);
    }

    fn lookup(&self, name: &str) -> Option<&dyn Command> {
        let key = self.aliases.get(name).map_or(name, String::as_str);
        self.commands.get(key).map(|c| c.as_ref())
    }

    /// Whether `name` (or an alias) is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Sorted names of all registered commands.
    pub fn list_commands(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Process one raw input line.
    ///
    /// A pending interactive tool receives the line unparsed; otherwise it
    /// is dispatched as a command.
    pub fn submit(&self, line: &str, env: &mut Environment<'_>) -> CommandOutput {
        match env.tool.take() {
            Some(tool) => {
                let name = tool.command_name();
                let result = panic::catch_unwind(AssertUnwindSafe(|| tools::advance(tool, line, env)));
                render_result(name, result)
            },
            None => self.dispatch(line, env),
        }
    }

    /// Tokenize and run a command line.
    ///
    /// A recognized command resets the unknown-command streak; an
    /// unrecognized one extends it.
    pub fn dispatch(&self, line: &str, env: &mut Environment<'_>) -> CommandOutput {
        let tokens = match tokenize(line.trim()) {
            Ok(t) => t,
            Err(e) => return CommandOutput::Text(format!("deepshell: {e}")),
        };
        let Some((name, rest)) = tokens.split_first() else {
            return CommandOutput::None;
        };
        let args: Vec<&str> = rest.iter().map(String::as_str).collect();

        // Intercept built-ins that need registry access.
        if name == "help" || name == "?" {
            env.session.unknown_streak = 0;
            return match self.execute_help(&args) {
                Ok(out) => out,
                Err(e) => CommandOutput::Text(format!("help: {e}")),
            };
        }

        let Some(cmd) = self.lookup(name) else {
            env.session.unknown_streak += 1;
            log::debug!(
                "unknown command '{name}' (streak {})",
                env.session.unknown_streak
            );
            return CommandOutput::Text(format!("{name}: command not found"));
        };

        env.session.unknown_streak = 0;
        log::debug!("dispatch {} {:?}", cmd.name(), args);
        let result = panic::catch_unwind(AssertUnwindSafe(|| cmd.execute(&args, env)));
        render_result(name, result)
    }

    // -- Intercepted commands --

    fn execute_help(&self, args: &[&str]) -> Result<CommandOutput> {
        if let Some(&name) = args.first() {
            return match self.lookup(name) {
                Some(cmd) => {
                    let mut out = cmd.name().to_string();
                    out.push_str(&format!(" ({})\n", cmd.category()));
                    out.push_str(&format!("  {}\n", cmd.description()));
                    out.push_str(&format!("  Usage: {}", cmd.usage()));
                    if !cmd.aliases().is_empty() {
                        out.push_str(&format!("\n  Aliases: {}", cmd.aliases().join(", ")));
                    }
                    Ok(CommandOutput::Text(out))
                },
                None => Err(GameError::Command(format!("no help for '{name}'"))),
            };
        }

        // Group commands by category.
        let mut categories: BTreeMap<&str, Vec<(&str, &str)>> = BTreeMap::new();
        for cmd in self.commands.values() {
            categories
                .entry(cmd.category())
                .or_default()
                .push((cmd.name(), cmd.description()));
        }

        let total: usize = categories.values().map(Vec::len).sum();
        let mut out = format!("Commands ({}):\n", total + 1);
        for (cat, cmds) in &mut categories {
            cmds.sort_by_key(|(name, _)| *name);
            out.push_str(&format!("\n  [{cat}]\n"));
            for (name, desc) in cmds.iter() {
                out.push_str(&format!("    {name:12} {desc}\n"));
            }
        }
        out.push_str("\n    help         List commands, or 'help <command>' for details.");
        Ok(CommandOutput::Text(out))
    }
}

/// Turn a handler result into output.
///
/// User errors render as `<name>: <error>`. Faults and panics are logged
/// and render a generic message; nothing else about them leaks.
fn render_result(name: &str, result: std::thread::Result<Result<CommandOutput>>) -> CommandOutput {
    match result {
        Ok(Ok(output)) => output,
        Ok(Err(e)) if e.is_user_error() => CommandOutput::Text(format!("{name}: {e}")),
        Ok(Err(e)) => {
            log::error!("{name}: {e}");
            fault(name)
        },
        Err(payload) => {
            let detail = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_default();
            log::error!("{name}: handler panicked: {detail}");
            fault(name)
        },
    }
}

fn fault(name: &str) -> CommandOutput {
    CommandOutput::Text(format!("{name}: internal fault, operation aborted"))
}

/// Split a command line into tokens, honoring quotes and escapes.
pub fn tokenize(input: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars().peekable();
    let mut in_single = false;
    let mut in_double = false;
    // Distinguishes `''` (an empty argument) from no argument.
    let mut quoted = false;

    while let Some(ch) = chars.next() {
        if in_single {
            if ch == '\'' {
                in_single = false;
            } else {
                current.push(ch);
            }
        } else if in_double {
            match ch {
                '"' => in_double = false,
                '\\' => match chars.peek() {
                    Some(&next) if next == '"' || next == '\\' => {
                        current.push(next);
                        chars.next();
                    },
                    _ => current.push('\\'),
                },
                _ => current.push(ch),
            }
        } else {
            match ch {
                '\'' => {
                    in_single = true;
                    quoted = true;
                },
                '"' => {
                    in_double = true;
                    quoted = true;
                },
                '\\' => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                },
                c if c.is_whitespace() => {
                    if !current.is_empty() || quoted {
                        tokens.push(std::mem::take(&mut current));
                        quoted = false;
                    }
                },
                _ => current.push(ch),
            }
        }
    }

    if in_single {
        return Err(GameError::Command("unterminated single quote".to_string()));
    }
    if in_double {
        return Err(GameError::Command("unterminated double quote".to_string()));
    }

    if !current.is_empty() || quoted {
        tokens.push(current);
    }

    Ok(tokens)
}
