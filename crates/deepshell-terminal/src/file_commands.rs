//! File manipulation commands: mkdir, touch, rm, mv, cp, chmod.

use deepshell_types::error::{GameError, Result};

use crate::interpreter::{Command, CommandOutput, CommandRegistry, Environment};

/// Register file manipulation commands into a registry.
pub fn register_file_commands(reg: &mut CommandRegistry) {
    reg.register(Box::new(MkdirCmd));
    reg.register(Box::new(TouchCmd));
    reg.register(Box::new(RmCmd));
    reg.register(Box::new(MvCmd));
    reg.register(Box::new(CpCmd));
    reg.register(Box::new(ChmodCmd));
}

/// Split `args` into single-letter flags and operands. Unknown flags are
/// an error; a lone `-` is an operand.
fn parse_flags<'a>(args: &[&'a str], allowed: &str) -> Result<(Vec<char>, Vec<&'a str>)> {
    let mut flags = Vec::new();
    let mut operands = Vec::new();
    for &arg in args {
        match arg.strip_prefix('-') {
            Some(letters) if !letters.is_empty() => {
                for ch in letters.chars() {
                    if !allowed.contains(ch) {
                        return Err(GameError::Command(format!("invalid option -- '{ch}'")));
                    }
                    flags.push(ch);
                }
            },
            _ => operands.push(arg),
        }
    }
    Ok((flags, operands))
}

// ---------------------------------------------------------------------------
// mkdir
// ---------------------------------------------------------------------------

struct MkdirCmd;
impl Command for MkdirCmd {
    fn name(&self) -> &str {
        "mkdir"
    }
    fn description(&self) -> &str {
        "Create directories"
    }
    fn usage(&self) -> &str {
        "mkdir <path>..."
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        if args.is_empty() {
            return Err(GameError::Command("missing operand".to_string()));
        }
        for arg in args {
            let path = env.resolve(arg);
            env.fs.mkdir(&path, &env.session.user)?;
        }
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// touch
// ---------------------------------------------------------------------------

struct TouchCmd;
impl Command for TouchCmd {
    fn name(&self) -> &str {
        "touch"
    }
    fn description(&self) -> &str {
        "Create empty files"
    }
    fn usage(&self) -> &str {
        "touch <file>..."
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        if args.is_empty() {
            return Err(GameError::Command("missing file operand".to_string()));
        }
        for arg in args {
            let path = env.resolve(arg);
            env.fs.touch(&path, &env.session.user)?;
        }
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// rm
// ---------------------------------------------------------------------------

struct RmCmd;
impl Command for RmCmd {
    fn name(&self) -> &str {
        "rm"
    }
    fn description(&self) -> &str {
        "Remove files or directories"
    }
    fn usage(&self) -> &str {
        "rm [-r] [-f] <path>..."
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let (flags, operands) = parse_flags(args, "rRf")?;
        let recursive = flags.iter().any(|f| matches!(f, 'r' | 'R'));
        let force = flags.contains(&'f');
        if operands.is_empty() {
            if force {
                return Ok(CommandOutput::None);
            }
            return Err(GameError::Command("missing operand".to_string()));
        }
        for arg in operands {
            let path = env.resolve(arg);
            match env.fs.remove(&path, &env.session.user, recursive) {
                Ok(()) => {},
                Err(GameError::NotFound(_)) if force => {},
                Err(GameError::IsADirectory(p)) => {
                    return Err(GameError::Command(format!(
                        "cannot remove '{p}': Is a directory"
                    )));
                },
                Err(e) => return Err(e),
            }
        }
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// mv
// ---------------------------------------------------------------------------

struct MvCmd;
impl Command for MvCmd {
    fn name(&self) -> &str {
        "mv"
    }
    fn description(&self) -> &str {
        "Move or rename a file or directory"
    }
    fn usage(&self) -> &str {
        "mv <source> <dest>"
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let [from, to] = args else {
            return Err(GameError::Command("usage: mv <source> <dest>".to_string()));
        };
        let from = env.resolve(from);
        let to = env.resolve(to);
        env.fs.rename(&from, &to, &env.session.user)?;
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// cp
// ---------------------------------------------------------------------------

struct CpCmd;
impl Command for CpCmd {
    fn name(&self) -> &str {
        "cp"
    }
    fn description(&self) -> &str {
        "Copy a file, or a directory with -r"
    }
    fn usage(&self) -> &str {
        "cp [-r] <source> <dest>"
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let (flags, operands) = parse_flags(args, "rR")?;
        let [from, to] = operands.as_slice() else {
            return Err(GameError::Command("usage: cp [-r] <source> <dest>".to_string()));
        };
        let from = env.resolve(from);
        let to = env.resolve(to);
        env.fs
            .copy(&from, &to, &env.session.user, !flags.is_empty())?;
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// chmod
// ---------------------------------------------------------------------------

struct ChmodCmd;
impl Command for ChmodCmd {
    fn name(&self) -> &str {
        "chmod"
    }
    fn description(&self) -> &str {
        "Change permissions (+x, -x, or 3-digit octal)"
    }
    fn usage(&self) -> &str {
        "chmod <+x|-x|NNN> <path>..."
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let [spec, paths @ ..] = args else {
            return Err(GameError::Command("missing operand".to_string()));
        };
        if paths.is_empty() {
            return Err(GameError::Command(format!("missing operand after '{spec}'")));
        }
        for arg in paths {
            let path = env.resolve(arg);
            env.fs.chmod(&path, spec, &env.session.user)?;
        }
        Ok(CommandOutput::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::register_standard;
    use crate::test_support::Fixture;

    fn reg() -> CommandRegistry {
        let mut reg = CommandRegistry::new();
        register_standard(&mut reg);
        reg
    }

    #[test]
    fn mkdir_and_touch() {
        let reg = reg();
        let mut fx = Fixture::new();
        assert_eq!(fx.text(&reg, "mkdir a b"), "");
        assert_eq!(fx.text(&reg, "touch a/f"), "");
        assert!(fx.fs.is_dir("/home/guest/b"));
        assert!(fx.fs.exists("/home/guest/a/f"));
        assert_eq!(fx.text(&reg, "mkdir a"), "mkdir: /home/guest/a: File exists");
        assert_eq!(fx.text(&reg, "mkdir"), "mkdir: missing operand");
    }

    #[test]
    fn rm_flags() {
        let reg = reg();
        let mut fx = Fixture::new();
        fx.text(&reg, "mkdir d");
        assert_eq!(
            fx.text(&reg, "rm d"),
            "rm: cannot remove '/home/guest/d': Is a directory"
        );
        assert_eq!(fx.text(&reg, "rm -r d"), "");
        assert!(!fx.fs.exists("/home/guest/d"));
        assert_eq!(fx.text(&reg, "rm -f ghost"), "");
        assert_eq!(
            fx.text(&reg, "rm ghost"),
            "rm: /home/guest/ghost: No such file or directory"
        );
        assert_eq!(fx.text(&reg, "rm -x notes.txt"), "rm: invalid option -- 'x'");
    }

    #[test]
    fn rm_sticky_tmp() {
        let reg = reg();
        let mut fx = Fixture::new();
        assert_eq!(
            fx.text(&reg, "rm /tmp/report.txt"),
            "rm: /tmp/report.txt: Permission denied"
        );
        fx.text(&reg, "touch /tmp/mine");
        assert_eq!(fx.text(&reg, "rm /tmp/mine"), "");
    }

    #[test]
    fn mv_and_cp() {
        let reg = reg();
        let mut fx = Fixture::new();
        fx.text(&reg, "mv notes.txt /tmp");
        assert!(fx.fs.exists("/tmp/notes.txt"));
        fx.text(&reg, "cp /tmp/notes.txt n2");
        assert_eq!(fx.text(&reg, "cat n2"), "hello");
        assert_eq!(fx.text(&reg, "mv onlyone"), "mv: usage: mv <source> <dest>");
    }

    #[test]
    fn cp_directory_needs_r() {
        let reg = reg();
        let mut fx = Fixture::new();
        fx.text(&reg, "mkdir src");
        fx.text(&reg, "touch src/f");
        assert_eq!(
            fx.text(&reg, "cp src dst"),
            "cp: -r not specified; omitting directory '/home/guest/src'"
        );
        fx.text(&reg, "cp -r src dst");
        assert!(fx.fs.exists("/home/guest/dst/f"));
        // The copies are independent.
        fx.text(&reg, "rm dst/f");
        assert!(fx.fs.exists("/home/guest/src/f"));
    }

    #[test]
    fn chmod_owner_only() {
        let reg = reg();
        let mut fx = Fixture::new();
        fx.text(&reg, "chmod +x notes.txt");
        assert!(fx.text(&reg, "ls -l notes.txt").starts_with("-rwxr-xr-x"));
        fx.text(&reg, "chmod 640 notes.txt");
        assert!(fx.text(&reg, "ls -l notes.txt").starts_with("-rw-r-----"));
        assert_eq!(
            fx.text(&reg, "chmod 777 /etc/shadow"),
            "chmod: changing permissions of '/etc/shadow': Operation not permitted"
        );
        assert_eq!(
            fx.text(&reg, "chmod 8xx notes.txt"),
            "chmod: invalid mode: '8xx'"
        );
        assert_eq!(fx.text(&reg, "chmod +x"), "chmod: missing operand after '+x'");
    }
}
