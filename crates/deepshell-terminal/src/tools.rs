//! Interactive tools: multi-turn prompts that own the next raw input line.
//!
//! A command installs a tool by writing it into [`Environment::tool`]. The
//! registry hands the next line, unparsed, to [`advance`], which consumes
//! one turn and either installs the follow-up stage or leaves the slot
//! empty. Validation always reads the environment of the current turn.

use deepshell_types::error::Result;

use crate::interpreter::{CommandOutput, Environment};

/// Secure-content id the echo service leaks under a format-string payload.
pub const SERVICE_LEAK_ID: &str = "echo-service-leak";

/// Printed alongside the failure that fills the escalation streak.
pub const LOCKOUT_NOTICE: &str =
    "Too many authentication failures. This incident has been logged.";

const FORMAT_DIRECTIVES: [&str; 3] = ["%x", "%p", "%s"];

/// The pending interactive continuation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveTool {
    /// `login`: a username (when not given on the command line), then a
    /// password.
    Login { user: Option<String> },
    /// `sudo`: the acting user's password.
    Sudo { command: String },
    /// `ssh` without a key: a password that is never accepted.
    SshPassword { target: String },
    /// `nc` to the echo service: one payload line.
    Payload,
}

impl ActiveTool {
    /// Input lines this tool still consumes, this one included.
    pub fn turns_remaining(&self) -> u32 {
        match self {
            Self::Login { user: None } => 2,
            _ => 1,
        }
    }

    /// Prompt shown while the tool waits for input.
    pub fn prompt(&self, user: &str) -> String {
        match self {
            Self::Login { user: None } => "login: ".to_string(),
            Self::Login { user: Some(_) } => "Password: ".to_string(),
            Self::Sudo { .. } => format!("[sudo] password for {user}: "),
            Self::SshPassword { target } => format!("{target}'s password: "),
            Self::Payload => "> ".to_string(),
        }
    }

    /// Whether the echoed line must be masked.
    pub fn masks_input(&self) -> bool {
        !matches!(self, Self::Login { user: None } | Self::Payload)
    }

    /// The command that installed this tool, used to label its errors.
    pub fn command_name(&self) -> &'static str {
        match self {
            Self::Login { .. } => "login",
            Self::Sudo { .. } => "sudo",
            Self::SshPassword { .. } => "ssh",
            Self::Payload => "nc",
        }
    }
}

/// Consume one line for `tool`.
pub(crate) fn advance(
    tool: ActiveTool,
    line: &str,
    env: &mut Environment<'_>,
) -> Result<CommandOutput> {
    match tool {
        ActiveTool::Login { user: None } => {
            let user = line.trim();
            if user.is_empty() {
                return Ok(escalation_failure(env, "Login incorrect"));
            }
            *env.tool = Some(ActiveTool::Login {
                user: Some(user.to_string()),
            });
            Ok(CommandOutput::None)
        },
        ActiveTool::Login { user: Some(user) } => Ok(login(&user, line, env)),
        ActiveTool::Sudo { command } => Ok(sudo(&command, line, env)),
        ActiveTool::SshPassword { target } => {
            log::debug!("ssh password attempt for {target}");
            Ok(escalation_failure(env, "Permission denied, please try again."))
        },
        ActiveTool::Payload => payload(line, env),
    }
}

fn login(user: &str, password: &str, env: &mut Environment<'_>) -> CommandOutput {
    let config = env.config;
    let Some(account) = config.account(user).filter(|a| a.password == password) else {
        return escalation_failure(env, "Login incorrect");
    };
    env.session.user = account.user.clone();
    env.session.escalation_failures = 0;
    if env.fs.is_dir(&account.home) {
        env.session.cwd = account.home.clone();
    }
    log::info!("session user is now {user}");
    CommandOutput::Text(format!("Welcome, {user}."))
}

fn sudo(command: &str, password: &str, env: &mut Environment<'_>) -> CommandOutput {
    let config = env.config;
    let user = env.session.user.clone();
    match config.account(&user) {
        Some(account) if account.password == password => {
            log::info!("sudo refused for {user}: {command}");
            CommandOutput::Text(format!(
                "{user} is not in the sudoers file. This incident will be reported."
            ))
        },
        _ => escalation_failure(env, "Sorry, try again."),
    }
}

fn payload(line: &str, env: &mut Environment<'_>) -> Result<CommandOutput> {
    let reply = if FORMAT_DIRECTIVES.iter().any(|d| line.contains(d)) {
        log::info!("echo service leaked memory");
        env.content.resolve(SERVICE_LEAK_ID)?
    } else {
        line.to_string()
    };
    Ok(CommandOutput::Text(format!(
        "{reply}\nConnection closed by foreign host."
    )))
}

/// Count a failed attempt and append the lockout notice when the streak
/// fills up.
fn escalation_failure(env: &mut Environment<'_>, message: &str) -> CommandOutput {
    let max = env.config.escalation.max_failures;
    if env.session.record_escalation_failure(max) {
        log::info!("escalation lockout for {}", env.session.user);
        CommandOutput::Text(format!("{message}\n{LOCKOUT_NOTICE}"))
    } else {
        CommandOutput::Text(message.to_string())
    }
}
