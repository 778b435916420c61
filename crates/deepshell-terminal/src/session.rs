//! Per-player shell session state.

use std::collections::BTreeSet;

use deepshell_vfs::path::display_path;
use deepshell_vfs::perms::ROOT_USER;

/// Which tree and command set the session is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layer {
    #[default]
    Standard,
    Deep,
}

/// Identity, location, and counters of the player.
///
/// Owned by the game controller; commands only ever see it through a
/// borrow inside [`Environment`](crate::Environment).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Acting user for every permission check.
    pub user: String,
    /// Canonical absolute working directory.
    pub cwd: String,
    pub layer: Layer,
    /// Identifiers of solved challenges.
    pub solved: BTreeSet<u32>,
    /// Consecutive unrecognized commands.
    pub unknown_streak: u32,
    /// Consecutive failed privilege-escalation attempts.
    pub escalation_failures: u32,
}

impl Session {
    pub fn new(user: &str, cwd: &str) -> Self {
        Self {
            user: user.to_string(),
            cwd: cwd.to_string(),
            layer: Layer::Standard,
            solved: BTreeSet::new(),
            unknown_streak: 0,
            escalation_failures: 0,
        }
    }

    pub fn is_deep(&self) -> bool {
        self.layer == Layer::Deep
    }

    /// Count a failed escalation attempt.
    ///
    /// Returns `true` when the streak reached `max_failures`; the streak is
    /// reset in that case.
    pub fn record_escalation_failure(&mut self, max_failures: u32) -> bool {
        self.escalation_failures += 1;
        if self.escalation_failures >= max_failures {
            self.escalation_failures = 0;
            true
        } else {
            false
        }
    }

    /// Shell prompt, e.g. `guest@archive:~$ `.
    pub fn prompt(&self, hostname: &str) -> String {
        let sigil = if self.user == ROOT_USER { '#' } else { '$' };
        format!(
            "{}@{hostname}:{}{sigil} ",
            self.user,
            display_path(&self.cwd)
        )
    }
}
