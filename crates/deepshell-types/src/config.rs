//! Game configuration (TOML).
//!
//! Every field has a default, so `GameConfig::default()` is a complete,
//! playable game and a config file only needs to list what it overrides.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{GameError, Result};

/// Identity and paths for the player's shell.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Identity the player starts as.
    pub user: String,
    /// Where the player starts in the standard layer.
    pub start_path: String,
    /// Identity taken on inside the deep layer.
    pub deep_user: String,
    /// Starting path inside the deep layer.
    pub deep_path: String,
    /// Name shown in the prompt for the standard layer.
    pub hostname: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            user: "guest".to_string(),
            start_path: "/home/guest".to_string(),
            deep_user: "root".to_string(),
            deep_path: "/root".to_string(),
            hostname: "archive".to_string(),
        }
    }
}

/// Timing and threshold for the escalation ("shatter") cycle.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShatterConfig {
    /// Consecutive unrecognized commands that trigger a cycle.
    pub threshold: u32,
    /// How long `system_failure` is displayed.
    pub failure_ms: u64,
    /// How long the terminal stays shattered.
    pub shatter_ms: u64,
    /// How long `recovering` holds before returning to normal.
    pub recover_ms: u64,
}

impl Default for ShatterConfig {
    fn default() -> Self {
        Self {
            threshold: 5,
            failure_ms: 2_500,
            shatter_ms: 3_000,
            recover_ms: 1_500,
        }
    }
}

/// Countdown armed by wrong flag submissions.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CountdownConfig {
    /// Seconds on the clock when the countdown arms.
    pub initial_secs: u32,
    /// Seconds removed by every further wrong flag.
    pub penalty_secs: u32,
    /// Real-time interval of one countdown second.
    pub tick_ms: u64,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            initial_secs: 300,
            penalty_secs: 30,
            tick_ms: 1_000,
        }
    }
}

/// The gate between the standard and the deep layer.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayerConfig {
    /// The only host an SSH-style connect may reach.
    pub host: String,
    /// Text a resolved key file must contain to open the gate.
    pub key_marker: String,
    /// Delay between a successful connect and the layer swap.
    pub connect_delay_ms: u64,
    /// Delay between `exit` and the return to the standard layer.
    pub disconnect_delay_ms: u64,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            host: "10.13.37.7".to_string(),
            key_marker: "-----BEGIN DEEP ACCESS KEY-----".to_string(),
            connect_delay_ms: 1_200,
            disconnect_delay_ms: 800,
        }
    }
}

/// Privilege-escalation attempt limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    /// Consecutive failed attempts before the lockout notice.
    pub max_failures: u32,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self { max_failures: 3 }
    }
}

/// Keys used in the durable key-value store.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub solved_key: String,
    pub countdown_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            solved_key: "deepshell.solved".to_string(),
            countdown_key: "deepshell.countdown".to_string(),
        }
    }
}

/// A login account in the standard layer.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub user: String,
    pub password: String,
    pub home: String,
}

/// One row of the flag table served by the static flag oracle.
#[derive(Debug, Clone, Deserialize)]
pub struct FlagEntry {
    pub flag: String,
    pub id: u32,
}

/// Complete game configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub shell: ShellConfig,
    pub shatter: ShatterConfig,
    pub countdown: CountdownConfig,
    pub layer: LayerConfig,
    pub escalation: EscalationConfig,
    pub storage: StorageConfig,
    #[serde(rename = "account")]
    pub accounts: Vec<Account>,
    #[serde(rename = "flag")]
    pub flags: Vec<FlagEntry>,
    /// Secure content served by the static content oracle, keyed by id.
    pub content: BTreeMap<String, String>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            shell: ShellConfig::default(),
            shatter: ShatterConfig::default(),
            countdown: CountdownConfig::default(),
            layer: LayerConfig::default(),
            escalation: EscalationConfig::default(),
            storage: StorageConfig::default(),
            accounts: default_accounts(),
            flags: default_flags(),
            content: default_content(),
        }
    }
}

fn default_accounts() -> Vec<Account> {
    vec![
        Account {
            user: "guest".to_string(),
            password: "guest".to_string(),
            home: "/home/guest".to_string(),
        },
        Account {
            user: "operator".to_string(),
            password: "Tr0ub4dor&3".to_string(),
            home: "/home/operator".to_string(),
        },
    ]
}

fn default_flags() -> Vec<FlagEntry> {
    vec![
        FlagEntry {
            flag: "FLAG{h1dd3n_1n_pl41n_s1ght}".to_string(),
            id: 1,
        },
        FlagEntry {
            flag: "FLAG{f0rm4t_str1ng_l34k}".to_string(),
            id: 2,
        },
        FlagEntry {
            flag: "FLAG{d33p_l4y3r_r00t}".to_string(),
            id: 3,
        },
    ]
}

fn default_content() -> BTreeMap<String, String> {
    let mut content = BTreeMap::new();
    content.insert(
        "deep-access-key".to_string(),
        "-----BEGIN DEEP ACCESS KEY-----\n\
         b3BlbnNzaC1rZXktdjEAAAAABG5vbmUAAAAEbm9uZQAAAAAAAAABAAAAMwAAAAtz\n\
         c2gtZWQyNTUxOQAAACBkZWVwc2hlbGwtY29yZS1hY2Nlc3Mtb25seS1ub3QtcmVh\n\
         -----END DEEP ACCESS KEY-----"
            .to_string(),
    );
    content.insert(
        "deep-flag".to_string(),
        "You made it below the archive.\nFLAG{d33p_l4y3r_r00t}".to_string(),
    );
    content.insert(
        "echo-service-leak".to_string(),
        "0x7ffd5e1c 0x00000000 0xdeadbeef FLAG{f0rm4t_str1ng_l34k}".to_string(),
    );
    content
}

impl GameConfig {
    /// Parse a TOML document. Missing sections keep their defaults.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and parse a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        log::debug!("Loaded game config from {}", path.display());
        Self::from_toml_str(&text)
    }

    /// Reject values the game loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.countdown.tick_ms == 0 {
            return Err(GameError::Config("countdown.tick_ms must be positive".to_string()));
        }
        if self.shatter.threshold == 0 {
            return Err(GameError::Config("shatter.threshold must be positive".to_string()));
        }
        Ok(())
    }

    /// Look up an account by user name.
    pub fn account(&self, user: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.user == user)
    }
}
