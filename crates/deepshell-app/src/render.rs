//! Incremental transcript rendering to stdout.

use std::io::{self, Write};

use deepshell_core::GameController;
use deepshell_core::shatter::ShatterPhase;
use deepshell_core::transcript::{Line, LineKind};

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";
const SYSTEM_STYLE: &str = "\x1b[1;31m";
const RESET_STYLE: &str = "\x1b[0m";

/// Tracks what has already been printed.
pub struct TranscriptView {
    generation: u64,
    /// Transcript position up to which lines were printed.
    shown: u64,
    prompt_pending: bool,
}

impl TranscriptView {
    pub fn new() -> Self {
        Self {
            generation: 0,
            shown: 0,
            prompt_pending: true,
        }
    }

    /// Print lines added since the previous draw, then the prompt if the game
    /// is waiting for input.
    pub fn draw(&mut self, game: &GameController) -> io::Result<()> {
        let transcript = game.transcript();
        let mut out = io::stdout().lock();

        if transcript.generation() != self.generation {
            self.generation = transcript.generation();
            self.shown = 0;
            write!(out, "{CLEAR_SCREEN}")?;
            self.prompt_pending = true;
        }

        let fresh = transcript.since(self.shown);
        for line in fresh.iter().filter(|l| l.kind != LineKind::Input) {
            writeln!(out, "{}", styled(line))?;
        }
        if !fresh.is_empty() {
            self.shown = transcript.end();
            self.prompt_pending = true;
        }

        if self.prompt_pending && game.input_enabled() {
            write!(out, "{}", prompt_line(game))?;
            self.prompt_pending = false;
        }
        out.flush()
    }

    /// One-off message that is not part of the transcript.
    pub fn notice(&mut self, text: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{text}")?;
        self.prompt_pending = true;
        out.flush()
    }
}

impl Default for TranscriptView {
    fn default() -> Self {
        Self::new()
    }
}

fn styled(line: &Line) -> String {
    match line.kind {
        LineKind::System => format!("{SYSTEM_STYLE}{}{RESET_STYLE}", line.text),
        LineKind::Input | LineKind::Output => line.text.clone(),
    }
}

/// The prompt, prefixed with the remaining time while the countdown runs.
fn prompt_line(game: &GameController) -> String {
    let countdown = game.countdown();
    let mut prompt = String::new();
    if countdown.is_running() {
        prompt.push_str(&format!("[{}s] ", countdown.time_left));
    }
    if game.shatter_phase() == ShatterPhase::SystemFailure {
        prompt.push_str("!! ");
    }
    prompt.push_str(&game.prompt());
    prompt
}
