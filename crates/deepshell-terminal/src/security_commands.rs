//! Privilege commands: login and sudo.
//!
//! Both only install an interactive tool; the credential check happens on
//! the next input line in [`crate::tools`].

use deepshell_types::error::{GameError, Result};

use crate::interpreter::{Command, CommandOutput, CommandRegistry, Environment};
use crate::tools::ActiveTool;

/// Register privilege commands into a registry.
pub fn register_security_commands(reg: &mut CommandRegistry) {
    reg.register(Box::new(LoginCmd));
    reg.register(Box::new(SudoCmd));
}

// ---------------------------------------------------------------------------
// login
// ---------------------------------------------------------------------------

struct LoginCmd;
impl Command for LoginCmd {
    fn name(&self) -> &str {
        "login"
    }
    fn description(&self) -> &str {
        "Log in as another user"
    }
    fn usage(&self) -> &str {
        "login [user]"
    }
    fn category(&self) -> &str {
        "security"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let user = args.first().map(|u| (*u).to_string());
        *env.tool = Some(ActiveTool::Login { user });
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// sudo
// ---------------------------------------------------------------------------

struct SudoCmd;
impl Command for SudoCmd {
    fn name(&self) -> &str {
        "sudo"
    }
    fn description(&self) -> &str {
        "Run a command as root"
    }
    fn usage(&self) -> &str {
        "sudo <command...>"
    }
    fn category(&self) -> &str {
        "security"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        if args.is_empty() {
            return Err(GameError::Command("usage: sudo <command...>".to_string()));
        }
        *env.tool = Some(ActiveTool::Sudo {
            command: args.join(" "),
        });
        Ok(CommandOutput::None)
    }
}
