//! The game controller.
//!
//! Routes each input line to the active layer's command set, applies the
//! signals commands return, and drives the timed state machines from a
//! single virtual clock.

use std::collections::BTreeSet;

use deepshell_terminal::{
    ActiveTool, CommandOutput, CommandRegistry, Environment, FlagOracle, Layer, Session,
    register_deep, register_standard,
};
use deepshell_types::config::GameConfig;
use deepshell_types::error::Result;
use deepshell_vfs::{ContentOracle, FsTree};

use crate::countdown::{Countdown, CountdownState, CountdownTransition};
use crate::layer::LayerSwitch;
use crate::shatter::{ShatterEvent, ShatterMachine, ShatterPhase};
use crate::store::{KeyValueStore, read_json, write_json};
use crate::timer::{Scheduler, TimerId};
use crate::transcript::Transcript;
use crate::world;

/// Hostname shown in the prompt while in the deep layer.
pub const DEEP_HOSTNAME: &str = "core";

const BANNER: &str = "Connected to archive. Type 'help' for a list of commands.";

/// Timed events owned by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    ShatterHold,
    CountdownTick,
    EnterDeep,
    LeaveDeep,
}

pub struct GameController {
    config: GameConfig,
    content: Box<dyn ContentOracle>,
    flags: Box<dyn FlagOracle>,
    store: Box<dyn KeyValueStore>,

    session: Session,
    standard_fs: FsTree,
    deep_fs: FsTree,
    standard_cmds: CommandRegistry,
    deep_cmds: CommandRegistry,
    tool: Option<ActiveTool>,
    transcript: Transcript,

    scheduler: Scheduler<GameEvent>,
    shatter: ShatterMachine,
    countdown: Countdown,
    countdown_timer: Option<TimerId>,
    layer: LayerSwitch,
    /// A layer switch is scheduled and input is held until it lands.
    switching: bool,
}

impl GameController {
    /// Build a fresh world and resume any persisted progress from `store`.
    pub fn new(
        config: GameConfig,
        content: Box<dyn ContentOracle>,
        flags: Box<dyn FlagOracle>,
        store: Box<dyn KeyValueStore>,
    ) -> Result<Self> {
        config.validate()?;
        let mut standard_cmds = CommandRegistry::new();
        register_standard(&mut standard_cmds);
        let mut deep_cmds = CommandRegistry::new();
        register_deep(&mut deep_cmds);

        let mut session = Session::new(&config.shell.user, &config.shell.start_path);
        session.solved = read_json::<BTreeSet<u32>>(store.as_ref(), &config.storage.solved_key)
            .unwrap_or_default();
        let saved_countdown =
            read_json::<CountdownState>(store.as_ref(), &config.storage.countdown_key)
                .unwrap_or_default();

        let mut game = Self {
            standard_fs: world::standard_tree(&config)?,
            deep_fs: world::deep_tree()?,
            standard_cmds,
            deep_cmds,
            session,
            tool: None,
            transcript: Transcript::new(),
            scheduler: Scheduler::new(),
            shatter: ShatterMachine::new(&config.shatter),
            countdown: Countdown::new(&config.countdown, saved_countdown),
            countdown_timer: None,
            layer: LayerSwitch::new(),
            switching: false,
            config,
            content,
            flags,
            store,
        };

        game.transcript.push_system(BANNER);
        let state = game.countdown.state();
        if state.exploded {
            game.transcript
                .push_system("The archive is gone. Reset to start over.");
        } else if state.active {
            log::info!("resuming countdown at {}s", state.time_left);
            game.transcript.push_system(&format!(
                "WARNING: countermeasures still armed. {}s remaining.",
                state.time_left
            ));
            game.schedule_countdown_tick();
        }
        log::info!(
            "game ready: {} solved, countdown {}",
            game.session.solved.len(),
            if state.exploded {
                "exploded"
            } else if state.active {
                "active"
            } else {
                "inactive"
            }
        );
        Ok(game)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn countdown(&self) -> CountdownState {
        self.countdown.state()
    }

    pub fn shatter_phase(&self) -> ShatterPhase {
        self.shatter.phase()
    }

    pub fn active_tool(&self) -> Option<&ActiveTool> {
        self.tool.as_ref()
    }

    /// Virtual time in milliseconds since the controller was created.
    pub fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    /// Whether a line typed now would be processed.
    pub fn input_enabled(&self) -> bool {
        !self.switching && !self.countdown.state().exploded && self.shatter.phase().accepts_input()
    }

    /// Prompt for the next line: the active tool's prompt, or the shell's.
    pub fn prompt(&self) -> String {
        if let Some(tool) = &self.tool {
            return tool.prompt(&self.session.user);
        }
        let host = match self.session.layer {
            Layer::Standard => self.config.shell.hostname.as_str(),
            Layer::Deep => DEEP_HOSTNAME,
        };
        self.session.prompt(host)
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    /// Process one line of player input. Returns `false` when input is
    /// currently disabled and the line was dropped.
    pub fn submit_line(&mut self, line: &str) -> bool {
        if !self.input_enabled() {
            log::debug!("input ignored in phase {}", self.shatter.phase().as_str());
            return false;
        }

        let masked = self.tool.as_ref().is_some_and(ActiveTool::masks_input);
        let prompt = self.prompt();
        self.transcript
            .push_input(&prompt, if masked { "********" } else { line });

        let (fs, registry) = match self.session.layer {
            Layer::Standard => (&mut self.standard_fs, &self.standard_cmds),
            Layer::Deep => (&mut self.deep_fs, &self.deep_cmds),
        };
        let mut env = Environment {
            session: &mut self.session,
            fs,
            content: self.content.as_ref(),
            flags: self.flags.as_ref(),
            config: &self.config,
            tool: &mut self.tool,
        };
        let output = registry.submit(line, &mut env);
        self.apply_output(output);

        if self.shatter.should_trigger(self.session.unknown_streak)
            && let Some(phase) = self.shatter.fire(ShatterEvent::Threshold)
        {
            self.enter_shatter_phase(phase);
        }
        true
    }

    fn apply_output(&mut self, output: CommandOutput) {
        match output {
            CommandOutput::Text(text) => self.transcript.push_output(&text),
            CommandOutput::None => {},
            CommandOutput::Clear => self.transcript.clear(),
            CommandOutput::Connect { host } => {
                self.transcript.push_system(&format!("Connecting to {host}..."));
                self.switching = true;
                self.scheduler
                    .schedule_in(self.config.layer.connect_delay_ms, GameEvent::EnterDeep);
            },
            CommandOutput::Disconnect => {
                self.transcript.push_system("Closing connection to core...");
                self.switching = true;
                self.scheduler
                    .schedule_in(self.config.layer.disconnect_delay_ms, GameEvent::LeaveDeep);
            },
            CommandOutput::FlagChecked { accepted, id } => self.apply_flag(accepted, id),
        }
    }

    fn apply_flag(&mut self, accepted: bool, id: Option<u32>) {
        if !accepted {
            self.transcript.push_output("Flag rejected.");
            match self.countdown.wrong_flag() {
                CountdownTransition::Armed => {
                    self.transcript.push_system(&format!(
                        "WARNING: intrusion countermeasures armed. {}s remaining.",
                        self.countdown.state().time_left
                    ));
                    self.schedule_countdown_tick();
                },
                CountdownTransition::Penalized => {
                    self.transcript.push_system(&format!(
                        "Penalty: -{}s. {}s remaining.",
                        self.config.countdown.penalty_secs,
                        self.countdown.state().time_left
                    ));
                },
                CountdownTransition::Exploded => self.detonate(),
                _ => {},
            }
            self.persist_countdown();
            return;
        }

        match id {
            Some(id) => self
                .transcript
                .push_output(&format!("Flag accepted. Challenge {id} solved.")),
            None => self.transcript.push_output("Flag accepted."),
        }
        self.persist_solved();
        if self.countdown.correct_flag() == CountdownTransition::Disarmed {
            self.cancel_countdown_tick();
            self.transcript.push_system("Countermeasures disarmed.");
            self.persist_countdown();
        }
    }

    // -----------------------------------------------------------------------
    // Clock
    // -----------------------------------------------------------------------

    /// Advance the virtual clock by `elapsed_ms`, firing every timer that
    /// falls due in order.
    pub fn tick(&mut self, elapsed_ms: u64) {
        let target = self.scheduler.now_ms().saturating_add(elapsed_ms);
        while let Some((_, event)) = self.scheduler.pop_due(target) {
            self.fire(event);
        }
        self.scheduler.advance_to(target);
    }

    fn fire(&mut self, event: GameEvent) {
        match event {
            GameEvent::ShatterHold => {
                self.shatter.take_timer();
                if let Some(phase) = self.shatter.fire(ShatterEvent::HoldElapsed) {
                    self.enter_shatter_phase(phase);
                }
            },
            GameEvent::CountdownTick => {
                self.countdown_timer = None;
                match self.countdown.tick() {
                    CountdownTransition::Ticked => self.schedule_countdown_tick(),
                    CountdownTransition::Exploded => self.detonate(),
                    _ => {},
                }
                self.persist_countdown();
            },
            GameEvent::EnterDeep => {
                self.switching = false;
                self.tool = None;
                self.layer.enter(&mut self.session, &self.config.shell);
                self.transcript
                    .push_system("Access granted. You are below the archive now.");
            },
            GameEvent::LeaveDeep => {
                self.switching = false;
                self.tool = None;
                self.layer.leave(&mut self.session);
                self.transcript.push_system("Connection to core closed.");
            },
        }
    }

    fn enter_shatter_phase(&mut self, phase: ShatterPhase) {
        match phase {
            ShatterPhase::SystemFailure => self
                .transcript
                .push_system("SYSTEM FAILURE: unrecognized input threshold exceeded"),
            ShatterPhase::Shattering => self.transcript.push_system("the terminal shatters"),
            ShatterPhase::Recovering => {
                self.session.unknown_streak = 0;
                self.tool = None;
                self.transcript.clear();
            },
            ShatterPhase::Normal => self.transcript.push_system("System restored."),
        }
        if let Some(hold) = self.shatter.hold_ms(phase) {
            let id = self.scheduler.schedule_in(hold, GameEvent::ShatterHold);
            self.shatter.set_timer(id);
        }
    }

    fn schedule_countdown_tick(&mut self) {
        self.cancel_countdown_tick();
        let id = self
            .scheduler
            .schedule_in(self.config.countdown.tick_ms, GameEvent::CountdownTick);
        self.countdown_timer = Some(id);
    }

    fn cancel_countdown_tick(&mut self) {
        if let Some(id) = self.countdown_timer.take() {
            self.scheduler.cancel(id);
        }
    }

    fn detonate(&mut self) {
        self.cancel_countdown_tick();
        self.tool = None;
        self.transcript
            .push_system("*** COUNTDOWN EXPIRED: the archive self-destructs ***");
        self.transcript.push_system("Reset to start over.");
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    fn persist_solved(&mut self) {
        let key = &self.config.storage.solved_key;
        if let Err(e) = write_json(self.store.as_mut(), key, &self.session.solved) {
            log::error!("failed to persist solved set: {e}");
        }
    }

    fn persist_countdown(&mut self) {
        let key = &self.config.storage.countdown_key;
        if let Err(e) = write_json(self.store.as_mut(), key, &self.countdown.state()) {
            log::error!("failed to persist countdown: {e}");
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Start over: fresh world, standard layer, normal terminal, inactive
    /// countdown. Solved challenges are kept.
    pub fn reset(&mut self) -> Result<()> {
        self.scheduler.clear();
        self.countdown_timer = None;
        self.shatter.take_timer();
        self.shatter.fire(ShatterEvent::Reset);
        self.countdown.reset();
        self.persist_countdown();

        self.standard_fs = world::standard_tree(&self.config)?;
        self.deep_fs = world::deep_tree()?;
        let solved = std::mem::take(&mut self.session.solved);
        self.session = Session::new(&self.config.shell.user, &self.config.shell.start_path);
        self.session.solved = solved;
        self.layer = LayerSwitch::new();
        self.switching = false;
        self.tool = None;

        self.transcript.clear();
        self.transcript.push_system(BANNER);
        log::info!("game reset");
        Ok(())
    }

    /// Cancel every pending timer. State already persisted stays on disk.
    pub fn shutdown(&mut self) {
        self.scheduler.clear();
        self.countdown_timer = None;
        self.shatter.take_timer();
        log::info!("game shut down");
    }
}
