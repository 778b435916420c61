//! Network commands: nc and ssh.

use deepshell_types::error::{GameError, Result};
use deepshell_vfs::FileContent;

use crate::interpreter::{Command, CommandOutput, CommandRegistry, Environment};
use crate::tools::ActiveTool;

/// Hosts answering for the scripted echo service.
pub const ECHO_SERVICE_HOSTS: [&str; 2] = ["localhost", "127.0.0.1"];
/// Port of the scripted echo service.
pub const ECHO_SERVICE_PORT: &str = "31337";

/// Register network commands into a registry.
pub fn register_network_commands(reg: &mut CommandRegistry) {
    reg.register(Box::new(NcCmd));
    reg.register(Box::new(SshCmd));
}

// ---------------------------------------------------------------------------
// nc
// ---------------------------------------------------------------------------

struct NcCmd;
impl Command for NcCmd {
    fn name(&self) -> &str {
        "nc"
    }
    fn description(&self) -> &str {
        "Open a TCP connection"
    }
    fn usage(&self) -> &str {
        "nc <host> <port>"
    }
    fn category(&self) -> &str {
        "network"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let [host, port] = args else {
            return Err(GameError::Command("usage: nc <host> <port>".to_string()));
        };
        if !ECHO_SERVICE_HOSTS.contains(host) || *port != ECHO_SERVICE_PORT {
            return Err(GameError::Command(format!(
                "connect to {host} port {port} (tcp) failed: Connection refused"
            )));
        }
        log::debug!("nc connected to echo service");
        *env.tool = Some(ActiveTool::Payload);
        Ok(CommandOutput::Text(
            "echo-service v0.9 (debug build) ready.\nSend one line:".to_string(),
        ))
    }
}

// ---------------------------------------------------------------------------
// ssh
// ---------------------------------------------------------------------------

struct SshCmd;
impl Command for SshCmd {
    fn name(&self) -> &str {
        "ssh"
    }
    fn description(&self) -> &str {
        "Connect to a remote host"
    }
    fn usage(&self) -> &str {
        "ssh [-i <identity>] [user@]host"
    }
    fn category(&self) -> &str {
        "network"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let mut identity = None;
        let mut target = None;
        let mut iter = args.iter();
        while let Some(&arg) = iter.next() {
            if arg == "-i" {
                let key = iter
                    .next()
                    .ok_or_else(|| GameError::Command("option requires an argument -- 'i'".to_string()))?;
                identity = Some(*key);
            } else {
                target = Some(arg);
            }
        }
        let target = target.ok_or_else(|| GameError::Command(format!("usage: {}", self.usage())))?;
        let (login_user, host) = match target.split_once('@') {
            Some((user, host)) => (user.to_string(), host),
            None => (env.session.user.clone(), target),
        };

        if host != env.config.layer.host {
            return Err(GameError::Command(format!(
                "connect to host {host} port 22: Connection refused"
            )));
        }

        let Some(identity) = identity else {
            *env.tool = Some(ActiveTool::SshPassword {
                target: format!("{login_user}@{host}"),
            });
            return Ok(CommandOutput::None);
        };

        let key_path = env.resolve(identity);
        // Only a seeded secure file counts, whatever a copy of its text says.
        let key = env.fs.read_content(&key_path, &env.session.user)?;
        let accepted = matches!(key, FileContent::Secure(_))
            && key.render(env.content)?.contains(env.config.layer.key_marker.as_str());
        if accepted {
            log::info!("deep access key accepted for {login_user}@{host}");
            Ok(CommandOutput::Connect {
                host: host.to_string(),
            })
        } else {
            log::debug!("ssh key {key_path} rejected");
            Err(GameError::Command(format!(
                "{login_user}@{host}: Permission denied (publickey)."
            )))
        }
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
    fn nc_wrong_endpoint_refused() {
        let reg = reg();
        let mut fx = Fixture::new();
        assert_eq!(
            fx.text(&reg, "nc localhost 80"),
            "nc: connect to localhost port 80 (tcp) failed: Connection refused"
        );
        assert!(fx.tool.is_none());
    }

    #[test]
    fn nc_payload_leak() {
        let reg = reg();
        let mut fx = Fixture::new();
        fx.text(&reg, "nc 127.0.0.1 31337");
        assert_eq!(fx.tool, Some(ActiveTool::Payload));
        let out = fx.text(&reg, "%p%p%p");
        assert!(out.contains("FLAG{f0rm4t_str1ng_l34k}"));
        assert!(fx.tool.is_none());
    }

    #[test]
    fn ssh_wrong_host() {
        let reg = reg();
        let mut fx = Fixture::new();
        assert_eq!(
            fx.text(&reg, "ssh root@10.0.0.1"),
            "ssh: connect to host 10.0.0.1 port 22: Connection refused"
        );
    }

    #[test]
    fn ssh_without_key_prompts_and_always_fails() {
        let reg = reg();
        let mut fx = Fixture::new();
        assert_eq!(fx.text(&reg, "ssh root@10.13.37.7"), "");
        let tool = fx.tool.clone().unwrap();
        assert_eq!(tool.prompt("guest"), "root@10.13.37.7's password: ");
        assert_eq!(
            fx.text(&reg, "toor"),
            "Permission denied, please try again."
        );
        assert_eq!(fx.session.escalation_failures, 1);
    }

    #[test]
    fn ssh_with_plain_password_file_denied() {
        let reg = reg();
        let mut fx = Fixture::new();
        assert_eq!(
            fx.text(&reg, "ssh -i /keys/fake.key root@10.13.37.7"),
            "ssh: root@10.13.37.7: Permission denied (publickey)."
        );
    }

    #[test]
    fn ssh_with_encoded_key_denied_decoded_accepted() {
        let reg = reg();
        let mut fx = Fixture::new();
        assert_eq!(
            fx.text(&reg, "ssh -i key.b64 root@10.13.37.7"),
            "ssh: root@10.13.37.7: Permission denied (publickey)."
        );
        fx.text(&reg, "base64 -d key.b64 id_deep");
        assert_eq!(
            fx.run(&reg, "ssh -i id_deep root@10.13.37.7"),
            CommandOutput::Connect {
                host: "10.13.37.7".to_string()
            }
        );
    }

    #[test]
    fn ssh_rejects_key_text_written_by_player() {
        let reg = reg();
        let mut fx = Fixture::new();
        fx.text(&reg, "echo -----BEGIN DEEP ACCESS KEY----- > copied.key");
        // base64 of "@secure:deep-access-key"
        fx.text(&reg, "echo QHNlY3VyZTpkZWVwLWFjY2Vzcy1rZXk= > forged.b64");
        fx.text(&reg, "base64 -d forged.b64 forged.key");
        for key in ["copied.key", "forged.key"] {
            assert_eq!(
                fx.text(&reg, &format!("ssh -i {key} root@10.13.37.7")),
                "ssh: root@10.13.37.7: Permission denied (publickey)."
            );
        }
    }

    #[test]
    fn ssh_default_user_is_session_user() {
        let reg = reg();
        let mut fx = Fixture::new();
        fx.text(&reg, "ssh 10.13.37.7");
        assert_eq!(
            fx.tool,
            Some(ActiveTool::SshPassword {
                target: "guest@10.13.37.7".to_string()
            })
        );
    }
}
