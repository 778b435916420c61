//! Entering and leaving the deep layer.

use deepshell_terminal::{Layer, Session};
use deepshell_types::config::ShellConfig;

/// Standard-layer identity parked while the session is deep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedIdentity {
    pub user: String,
    pub cwd: String,
}

#[derive(Debug, Default)]
pub struct LayerSwitch {
    saved: Option<SavedIdentity>,
}

impl LayerSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park the current identity and become the deep user. No-op when the
    /// session is already deep.
    pub fn enter(&mut self, session: &mut Session, shell: &ShellConfig) {
        if session.is_deep() {
            return;
        }
        self.saved = Some(SavedIdentity {
            user: std::mem::replace(&mut session.user, shell.deep_user.clone()),
            cwd: std::mem::replace(&mut session.cwd, shell.deep_path.clone()),
        });
        session.layer = Layer::Deep;
        log::info!("entered deep layer as {}", session.user);
    }

    /// Restore the parked identity. No-op when nothing is parked.
    pub fn leave(&mut self, session: &mut Session) {
        let Some(saved) = self.saved.take() else {
            return;
        };
        session.user = saved.user;
        session.cwd = saved.cwd;
        session.layer = Layer::Standard;
        log::info!("left deep layer, back as {}", session.user);
    }

    pub fn saved(&self) -> Option<&SavedIdentity> {
        self.saved.as_ref()
    }
}
