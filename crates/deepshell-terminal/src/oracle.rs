//! Flag verification oracle.

use deepshell_types::config::FlagEntry;
use deepshell_types::error::Result;

/// Outcome of checking one candidate flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagVerdict {
    pub success: bool,
    /// Challenge identifier, present on success.
    pub id: Option<u32>,
}

impl FlagVerdict {
    pub fn rejected() -> Self {
        Self {
            success: false,
            id: None,
        }
    }

    pub fn accepted(id: u32) -> Self {
        Self {
            success: true,
            id: Some(id),
        }
    }
}

/// Checks player-typed flag strings.
///
/// The shell submits the exact string and trusts the verdict; it never
/// inspects the table behind it.
pub trait FlagOracle {
    fn verify(&self, candidate: &str) -> Result<FlagVerdict>;
}

/// Oracle backed by the `[[flag]]` config table.
#[derive(Debug, Clone, Default)]
pub struct StaticFlagOracle {
    flags: Vec<FlagEntry>,
}

impl StaticFlagOracle {
    pub fn new(flags: Vec<FlagEntry>) -> Self {
        Self { flags }
    }
}

impl FlagOracle for StaticFlagOracle {
    fn verify(&self, candidate: &str) -> Result<FlagVerdict> {
        let verdict = self
            .flags
            .iter()
            .find(|entry| entry.flag == candidate)
            .map_or_else(FlagVerdict::rejected, |entry| FlagVerdict::accepted(entry.id));
        log::debug!("flag check -> {}", if verdict.success { "ok" } else { "wrong" });
        Ok(verdict)
    }
}
