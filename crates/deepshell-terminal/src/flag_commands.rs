//! Flag submission.

use deepshell_types::error::{GameError, Result};

use crate::interpreter::{Command, CommandOutput, CommandRegistry, Environment};

/// Register flag commands into a registry.
pub fn register_flag_commands(reg: &mut CommandRegistry) {
    reg.register(Box::new(SubmitCmd));
}

struct SubmitCmd;
impl Command for SubmitCmd {
    fn name(&self) -> &str {
        "submit"
    }
    fn aliases(&self) -> &[&str] {
        &["flag"]
    }
    fn description(&self) -> &str {
        "Submit a captured flag"
    }
    fn usage(&self) -> &str {
        "submit <FLAG{...}>"
    }
    fn category(&self) -> &str {
        "challenge"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        if args.is_empty() {
            return Err(GameError::Command(format!("usage: {}", self.usage())));
        }
        let candidate = args.join(" ");
        let verdict = env.flags.verify(&candidate)?;
        if let Some(id) = verdict.id.filter(|_| verdict.success) {
            env.session.solved.insert(id);
        }
        Ok(CommandOutput::FlagChecked {
            accepted: verdict.success,
            id: verdict.id,
        })
    }
}
