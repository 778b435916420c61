//! Escalation ("shatter") state machine.
//!
//! `Normal -> SystemFailure -> Shattering -> Recovering -> Normal`, driven
//! by the unknown-command streak and one hold timer per non-normal phase.

use deepshell_types::config::ShatterConfig;

use crate::timer::TimerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShatterPhase {
    #[default]
    Normal,
    SystemFailure,
    Shattering,
    Recovering,
}

impl ShatterPhase {
    /// Whether player input is processed in this phase.
    pub fn accepts_input(self) -> bool {
        matches!(self, Self::Normal | Self::SystemFailure)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::SystemFailure => "system_failure",
            Self::Shattering => "shattering",
            Self::Recovering => "recovering",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShatterEvent {
    /// The unknown-command streak reached the threshold.
    Threshold,
    /// The current phase's hold time ran out.
    HoldElapsed,
    /// External full reset.
    Reset,
}

/// The transition table. `None` means the event is ignored.
pub fn next_phase(phase: ShatterPhase, event: ShatterEvent) -> Option<ShatterPhase> {
    use ShatterEvent::*;
    use ShatterPhase::*;
    match (phase, event) {
        (Normal, Threshold) => Some(SystemFailure),
        (SystemFailure, HoldElapsed) => Some(Shattering),
        (Shattering, HoldElapsed) => Some(Recovering),
        (Recovering, HoldElapsed) => Some(Normal),
        (Normal, Reset) => None,
        (_, Reset) => Some(Normal),
        _ => None,
    }
}

#[derive(Debug)]
pub struct ShatterMachine {
    phase: ShatterPhase,
    config: ShatterConfig,
    timer: Option<TimerId>,
}

impl ShatterMachine {
    pub fn new(config: &ShatterConfig) -> Self {
        Self {
            phase: ShatterPhase::Normal,
            config: config.clone(),
            timer: None,
        }
    }

    pub fn phase(&self) -> ShatterPhase {
        self.phase
    }

    /// Whether a streak of `streak` unknown commands starts a cycle now.
    /// Only a normal terminal can be triggered.
    pub fn should_trigger(&self, streak: u32) -> bool {
        self.phase == ShatterPhase::Normal && streak >= self.config.threshold
    }

    /// How long `phase` holds before advancing; `None` for `Normal`.
    pub fn hold_ms(&self, phase: ShatterPhase) -> Option<u64> {
        match phase {
            ShatterPhase::Normal => None,
            ShatterPhase::SystemFailure => Some(self.config.failure_ms),
            ShatterPhase::Shattering => Some(self.config.shatter_ms),
            ShatterPhase::Recovering => Some(self.config.recover_ms),
        }
    }

    /// Apply `event`. Returns the new phase when a transition happened.
    pub fn fire(&mut self, event: ShatterEvent) -> Option<ShatterPhase> {
        let next = next_phase(self.phase, event)?;
        log::info!("shatter: {} -> {}", self.phase.as_str(), next.as_str());
        self.phase = next;
        Some(next)
    }

    pub fn set_timer(&mut self, id: TimerId) {
        self.timer = Some(id);
    }

    /// Take the pending hold timer, if any, for cancellation.
    pub fn take_timer(&mut self) -> Option<TimerId> {
        self.timer.take()
    }
}
