//! Threat ("countdown") state machine.
//!
//! States are `inactive`, `active(time_left)` and `exploded`. Wrong flags
//! arm and then penalize; the real-time tick decrements independently.
//! Whichever brings `time_left` to zero first explodes it. An exploded
//! countdown stays active at zero until reset.

use serde::{Deserialize, Serialize};

use deepshell_types::config::CountdownConfig;

/// Persisted countdown state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CountdownState {
    pub active: bool,
    pub time_left: u32,
    pub exploded: bool,
}

impl CountdownState {
    const EXPLODED: Self = Self {
        active: true,
        time_left: 0,
        exploded: true,
    };

    /// Armed and still counting down.
    pub fn is_running(self) -> bool {
        self.active && !self.exploded
    }

    /// Repair combinations that cannot arise from transitions, e.g. after
    /// a hand-edited store.
    pub fn normalized(self) -> Self {
        if self.exploded || (self.active && self.time_left == 0) {
            Self::EXPLODED
        } else if !self.active {
            Self::default()
        } else {
            self
        }
    }
}

/// What a countdown input did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTransition {
    Armed,
    Penalized,
    Ticked,
    Disarmed,
    Exploded,
    Unchanged,
}

#[derive(Debug)]
pub struct Countdown {
    state: CountdownState,
    initial_secs: u32,
    penalty_secs: u32,
}

impl Countdown {
    pub fn new(config: &CountdownConfig, state: CountdownState) -> Self {
        Self {
            state: state.normalized(),
            initial_secs: config.initial_secs,
            penalty_secs: config.penalty_secs,
        }
    }

    pub fn state(&self) -> CountdownState {
        self.state
    }

    fn explode(&mut self) -> CountdownTransition {
        self.state = CountdownState::EXPLODED;
        log::info!("countdown exploded");
        CountdownTransition::Exploded
    }

    /// A flag was rejected.
    pub fn wrong_flag(&mut self) -> CountdownTransition {
        if self.state.exploded {
            return CountdownTransition::Unchanged;
        }
        if !self.state.active {
            if self.initial_secs == 0 {
                return self.explode();
            }
            self.state.active = true;
            self.state.time_left = self.initial_secs;
            log::info!("countdown armed at {}s", self.initial_secs);
            return CountdownTransition::Armed;
        }
        self.state.time_left = self.state.time_left.saturating_sub(self.penalty_secs);
        if self.state.time_left == 0 {
            return self.explode();
        }
        CountdownTransition::Penalized
    }

    /// A flag was accepted.
    pub fn correct_flag(&mut self) -> CountdownTransition {
        if !self.state.is_running() {
            return CountdownTransition::Unchanged;
        }
        self.state = CountdownState::default();
        log::info!("countdown disarmed");
        CountdownTransition::Disarmed
    }

    /// One real-time second elapsed.
    pub fn tick(&mut self) -> CountdownTransition {
        if !self.state.is_running() {
            return CountdownTransition::Unchanged;
        }
        self.state.time_left = self.state.time_left.saturating_sub(1);
        if self.state.time_left == 0 {
            return self.explode();
        }
        CountdownTransition::Ticked
    }

    /// Back to inactive, whatever the state.
    pub fn reset(&mut self) {
        self.state = CountdownState::default();
    }
}
