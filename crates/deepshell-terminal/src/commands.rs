//! Core shell commands and the per-layer command sets.

use deepshell_types::config::GameConfig;
use deepshell_types::error::{GameError, Result};
use deepshell_vfs::FileContent;
use deepshell_vfs::perms::ROOT_USER;

use crate::interpreter::{Command, CommandOutput, CommandRegistry, Environment};

/// Register the standard layer's command set.
pub fn register_standard(reg: &mut CommandRegistry) {
    register_core(reg);
    crate::file_commands::register_file_commands(reg);
    crate::flag_commands::register_flag_commands(reg);
    crate::archive_commands::register_archive_commands(reg);
    crate::security_commands::register_security_commands(reg);
    crate::network_commands::register_network_commands(reg);
}

/// Register the deep layer's command set: the core and file commands plus
/// `submit`, without any of the escalation or network tools.
pub fn register_deep(reg: &mut CommandRegistry) {
    register_core(reg);
    crate::file_commands::register_file_commands(reg);
    crate::flag_commands::register_flag_commands(reg);
}

fn register_core(reg: &mut CommandRegistry) {
    reg.register(Box::new(LsCmd));
    reg.register(Box::new(CdCmd));
    reg.register(Box::new(PwdCmd));
    reg.register(Box::new(CatCmd));
    reg.register(Box::new(EchoCmd));
    reg.register(Box::new(ClearCmd));
    reg.register(Box::new(WhoamiCmd));
    reg.register(Box::new(IdCmd));
    reg.register(Box::new(ExitCmd));
}

// ---------------------------------------------------------------------------
// ls
// ---------------------------------------------------------------------------

struct LsCmd;
impl Command for LsCmd {
    fn name(&self) -> &str {
        "ls"
    }
    fn aliases(&self) -> &[&str] {
        &["dir"]
    }
    fn description(&self) -> &str {
        "List directory contents"
    }
    fn usage(&self) -> &str {
        "ls [-a] [-l] [path]"
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let mut all = false;
        let mut long = false;
        let mut target = None;
        for arg in args {
            if let Some(flags) = arg.strip_prefix('-')
                && !flags.is_empty()
            {
                for flag in flags.chars() {
                    match flag {
                        'a' => all = true,
                        'l' => long = true,
                        other => {
                            return Err(GameError::Command(format!(
                                "invalid option -- '{other}'"
                            )));
                        },
                    }
                }
            } else {
                target = Some(*arg);
            }
        }

        let path = env.resolve(target.unwrap_or("."));
        let entries = env.fs.list(&path, &env.session.user)?;
        let visible: Vec<_> = entries
            .iter()
            .filter(|e| all || !e.name.starts_with('.'))
            .collect();
        if visible.is_empty() {
            return Ok(CommandOutput::None);
        }

        let text = if long {
            visible
                .iter()
                .map(|e| {
                    let kind = if e.is_dir { 'd' } else { '-' };
                    let size = e.size.map_or_else(|| "?".to_string(), |s| s.to_string());
                    format!(
                        "{kind}{} {:<8} {:<8} {size:>6} {}",
                        e.meta.mode, e.meta.owner, e.meta.group, e.name
                    )
                })
                .collect::<Vec<_>>()
                .join("\n")
        } else {
            visible
                .iter()
                .map(|e| {
                    let suffix = if e.is_dir { "/" } else { "" };
                    format!("{}{suffix}", e.name)
                })
                .collect::<Vec<_>>()
                .join("  ")
        };
        Ok(CommandOutput::Text(text))
    }
}

// ---------------------------------------------------------------------------
// cd
// ---------------------------------------------------------------------------

struct CdCmd;
impl Command for CdCmd {
    fn name(&self) -> &str {
        "cd"
    }
    fn description(&self) -> &str {
        "Change working directory"
    }
    fn usage(&self) -> &str {
        "cd [path]"
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let target = match args.first() {
            Some(p) => env.resolve(p),
            None => env.home(),
        };
        env.fs.enter(&target, &env.session.user)?;
        env.session.cwd = target;
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// pwd
// ---------------------------------------------------------------------------

struct PwdCmd;
impl Command for PwdCmd {
    fn name(&self) -> &str {
        "pwd"
    }
    fn description(&self) -> &str {
        "Print working directory"
    }
    fn usage(&self) -> &str {
        "pwd"
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, _args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Text(env.session.cwd.clone()))
    }
}

// ---------------------------------------------------------------------------
// cat
// ---------------------------------------------------------------------------

struct CatCmd;
impl Command for CatCmd {
    fn name(&self) -> &str {
        "cat"
    }
    fn description(&self) -> &str {
        "Display file contents"
    }
    fn usage(&self) -> &str {
        "cat <file>..."
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        if args.is_empty() {
            return Err(GameError::Command("usage: cat <file>...".to_string()));
        }
        let mut parts = Vec::with_capacity(args.len());
        for arg in args {
            let path = env.resolve(arg);
            parts.push(env.fs.read_file(&path, &env.session.user, env.content)?);
        }
        Ok(CommandOutput::Text(parts.join("\n")))
    }
}

// ---------------------------------------------------------------------------
// echo
// ---------------------------------------------------------------------------

struct EchoCmd;
impl Command for EchoCmd {
    fn name(&self) -> &str {
        "echo"
    }
    fn description(&self) -> &str {
        "Print text, optionally into a file"
    }
    fn usage(&self) -> &str {
        "echo [text...] [> file | >> file]"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let Some(pos) = args.iter().position(|a| *a == ">" || *a == ">>") else {
            return Ok(CommandOutput::Text(args.join(" ")));
        };
        let target = args.get(pos + 1).ok_or_else(|| {
            GameError::Command("syntax error near unexpected token `newline'".to_string())
        })?;
        let append = args[pos] == ">>";
        let text = args[..pos].join(" ");

        let path = env.resolve(target);
        let body = if append && env.fs.exists(&path) {
            let existing = env.fs.read_file(&path, &env.session.user, env.content)?;
            format!("{existing}\n{text}")
        } else {
            text
        };
        env.fs
            .write_file(&path, FileContent::Inline(body), &env.session.user)?;
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// clear
// ---------------------------------------------------------------------------

struct ClearCmd;
impl Command for ClearCmd {
    fn name(&self) -> &str {
        "clear"
    }
    fn aliases(&self) -> &[&str] {
        &["cls"]
    }
    fn description(&self) -> &str {
        "Clear the terminal"
    }
    fn usage(&self) -> &str {
        "clear"
    }
    fn execute(&self, _args: &[&str], _env: &mut Environment<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Clear)
    }
}

// ---------------------------------------------------------------------------
// whoami / id
// ---------------------------------------------------------------------------

struct WhoamiCmd;
impl Command for WhoamiCmd {
    fn name(&self) -> &str {
        "whoami"
    }
    fn description(&self) -> &str {
        "Print the current user"
    }
    fn usage(&self) -> &str {
        "whoami"
    }
    fn category(&self) -> &str {
        "system"
    }
    fn execute(&self, _args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Text(env.session.user.clone()))
    }
}

/// Numeric id for `user`: 0 for root, 1000 and up in account order,
/// `nobody` otherwise.
fn uid_of(user: &str, config: &GameConfig) -> u32 {
    if user == ROOT_USER {
        return 0;
    }
    config
        .accounts
        .iter()
        .position(|a| a.user == user)
        .map_or(65534, |i| 1000 + i as u32)
}

struct IdCmd;
impl Command for IdCmd {
    fn name(&self) -> &str {
        "id"
    }
    fn description(&self) -> &str {
        "Print user and group ids"
    }
    fn usage(&self) -> &str {
        "id"
    }
    fn category(&self) -> &str {
        "system"
    }
    fn execute(&self, _args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let user = &env.session.user;
        let uid = uid_of(user, env.config);
        Ok(CommandOutput::Text(format!(
            "uid={uid}({user}) gid={uid}({user}) groups={uid}({user})"
        )))
    }
}

// ---------------------------------------------------------------------------
// exit
// ---------------------------------------------------------------------------

struct ExitCmd;
impl Command for ExitCmd {
    fn name(&self) -> &str {
        "exit"
    }
    fn aliases(&self) -> &[&str] {
        &["logout"]
    }
    fn description(&self) -> &str {
        "Leave the current session"
    }
    fn usage(&self) -> &str {
        "exit"
    }
    fn category(&self) -> &str {
        "system"
    }
    fn execute(&self, _args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        if env.session.is_deep() {
            Ok(CommandOutput::Disconnect)
        } else {
            Ok(CommandOutput::Text("logout".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Layer;
    use crate::test_support::Fixture;

    fn standard() -> CommandRegistry {
        let mut reg = CommandRegistry::new();
        register_standard(&mut reg);
        reg
    }

    fn deep() -> CommandRegistry {
        let mut reg = CommandRegistry::new();
        register_deep(&mut reg);
        reg
    }

    #[test]
    fn standard_set_is_complete() {
        let reg = standard();
        for name in [
            "ls", "dir", "cd", "pwd", "cat", "echo", "clear", "cls", "whoami", "id", "mkdir",
            "touch", "rm", "mv", "cp", "chmod", "base64", "unzip", "login", "sudo", "nc", "ssh",
            "exit", "logout", "submit", "flag",
        ] {
            assert!(reg.contains(name), "missing {name}");
        }
    }

    #[test]
    fn deep_set_has_no_escalation_tools() {
        let reg = deep();
        for name in ["ls", "cd", "cat", "chmod", "submit", "exit"] {
            assert!(reg.contains(name), "missing {name}");
        }
        for name in ["login", "sudo", "ssh", "nc", "base64", "unzip"] {
            assert!(!reg.contains(name), "unexpected {name}");
        }
    }

    #[test]
    fn ls_hides_dotfiles() {
        let reg = standard();
        let mut fx = Fixture::new();
        let out = fx.text(&reg, "ls");
        assert!(out.contains("notes.txt"));
        assert!(!out.contains(".hidden"));
        assert!(fx.text(&reg, "ls -a").contains(".hidden"));
    }

    #[test]
    fn ls_long_format() {
        let reg = standard();
        let mut fx = Fixture::new();
        let out = fx.text(&reg, "dir -la /tmp");
        assert_eq!(out, "-rw-rw-rw- operator operator      2 report.txt");
    }

    #[test]
    fn ls_marks_directories() {
        let reg = standard();
        let mut fx = Fixture::new();
        assert!(fx.text(&reg, "ls /").contains("home/"));
    }

    #[test]
    fn ls_unreadable_dir() {
        let reg = standard();
        let mut fx = Fixture::new();
        assert_eq!(
            fx.text(&reg, "ls /home/operator"),
            "ls: /home/operator: Permission denied"
        );
    }

    #[test]
    fn ls_bad_flag() {
        let reg = standard();
        let mut fx = Fixture::new();
        assert_eq!(fx.text(&reg, "ls -z"), "ls: invalid option -- 'z'");
    }

    #[test]
    fn cd_and_pwd() {
        let reg = standard();
        let mut fx = Fixture::new();
        fx.text(&reg, "cd /tmp");
        assert_eq!(fx.text(&reg, "pwd"), "/tmp");
        fx.text(&reg, "cd ..");
        assert_eq!(fx.session.cwd, "/");
        fx.text(&reg, "cd");
        assert_eq!(fx.session.cwd, "/home/guest");
    }

    #[test]
    fn cd_refuses_file_and_locked_dir() {
        let reg = standard();
        let mut fx = Fixture::new();
        assert_eq!(
            fx.text(&reg, "cd notes.txt"),
            "cd: /home/guest/notes.txt: Not a directory"
        );
        assert_eq!(
            fx.text(&reg, "cd /home/operator"),
            "cd: /home/operator: Permission denied"
        );
        assert_eq!(fx.session.cwd, "/home/guest");
    }

    #[test]
    fn cd_tilde() {
        let reg = standard();
        let mut fx = Fixture::new();
        fx.text(&reg, "cd /");
        fx.text(&reg, "cd ~");
        assert_eq!(fx.session.cwd, "/home/guest");
    }

    #[test]
    fn cat_reads_inline_and_secure() {
        let reg = standard();
        let mut fx = Fixture::new();
        assert_eq!(fx.text(&reg, "cat notes.txt"), "hello");
        assert!(
            fx.text(&reg, "cat /keys/deep.key")
                .starts_with("-----BEGIN DEEP ACCESS KEY-----")
        );
    }

    #[test]
    fn cat_errors() {
        let reg = standard();
        let mut fx = Fixture::new();
        assert_eq!(fx.text(&reg, "cat /etc/shadow"), "cat: /etc/shadow: Permission denied");
        assert_eq!(
            fx.text(&reg, "cat nope"),
            "cat: /home/guest/nope: No such file or directory"
        );
        assert_eq!(fx.text(&reg, "cat"), "cat: usage: cat <file>...");
    }

    #[test]
    fn echo_prints_and_redirects() {
        let reg = standard();
        let mut fx = Fixture::new();
        assert_eq!(fx.text(&reg, "echo \"a  b\" c"), "a  b c");
        fx.text(&reg, "echo one > out.txt");
        fx.text(&reg, "echo two >> out.txt");
        assert_eq!(fx.text(&reg, "cat out.txt"), "one\ntwo");
    }

    #[test]
    fn echo_redirect_into_protected_dir() {
        let reg = standard();
        let mut fx = Fixture::new();
        assert_eq!(
            fx.text(&reg, "echo x > /etc/evil"),
            "echo: /etc/evil: Permission denied"
        );
    }

    #[test]
    fn clear_signals() {
        let reg = standard();
        let mut fx = Fixture::new();
        assert_eq!(fx.run(&reg, "cls"), CommandOutput::Clear);
    }

    #[test]
    fn whoami_and_id() {
        let reg = standard();
        let mut fx = Fixture::new();
        assert_eq!(fx.text(&reg, "whoami"), "guest");
        assert_eq!(
            fx.text(&reg, "id"),
            "uid=1000(guest) gid=1000(guest) groups=1000(guest)"
        );
        fx.session.user = "root".to_string();
        assert!(fx.text(&reg, "id").starts_with("uid=0(root)"));
    }

    #[test]
    fn exit_depends_on_layer() {
        let reg = standard();
        let mut fx = Fixture::new();
        assert_eq!(fx.text(&reg, "exit"), "logout");
        fx.session.layer = Layer::Deep;
        assert_eq!(fx.run(&reg, "logout"), CommandOutput::Disconnect);
    }

    #[test]
    fn mkdir_cd_round_trip() {
        let reg = standard();
        let mut fx = Fixture::new();
        fx.text(&reg, "mkdir x");
        fx.text(&reg, "cd x");
        assert_eq!(fx.session.cwd, "/home/guest/x");
        fx.text(&reg, "cd ..");
        assert_eq!(fx.session.cwd, "/home/guest");
    }
}
