//! deepshell terminal entry point.
//!
//! Reads player lines from stdin on a helper thread, advances the game
//! clock in real time, and prints transcript lines as they appear.
//! `:reset` starts the world over, `:quit` or end of input exits.

mod render;

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use deepshell_core::GameController;
use deepshell_core::config::GameConfig;
use deepshell_core::store::FileStore;
use deepshell_core::terminal::StaticFlagOracle;
use deepshell_core::vfs::StaticContentOracle;

use render::TranscriptView;

/// How often the clock advances while no input arrives.
const FRAME: Duration = Duration::from_millis(100);

const DEFAULT_STORE: &str = "deepshell-state.json";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Config from CLI arg or DEEPSHELL_CONFIG, built-in game otherwise.
    let config = match std::env::args()
        .nth(1)
        .or_else(|| std::env::var("DEEPSHELL_CONFIG").ok())
    {
        Some(path) => GameConfig::load(Path::new(&path))
            .with_context(|| format!("loading config {path}"))?,
        None => GameConfig::default(),
    };
    let store_path = std::env::var("DEEPSHELL_STORE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_STORE));
    log::info!("Starting deepshell (store: {})", store_path.display());

    let store = FileStore::open(&store_path)?;
    let content = StaticContentOracle::new(config.content.clone());
    let flags = StaticFlagOracle::new(config.flags.clone());
    let mut game = GameController::new(config, Box::new(content), Box::new(flags), Box::new(store))?;

    // Stdin is blocking; keep it off the game thread.
    let (tx, rx) = mpsc::channel::<String>();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let mut view = TranscriptView::new();
    view.draw(&game)?;
    let mut last = Instant::now();

    loop {
        match rx.recv_timeout(FRAME) {
            Ok(line) => match line.trim() {
                ":quit" => break,
                ":reset" => game.reset()?,
                _ => {
                    if !game.submit_line(&line) {
                        view.notice("(terminal not accepting input)")?;
                    }
                },
            },
            Err(RecvTimeoutError::Timeout) => {},
            Err(RecvTimeoutError::Disconnected) => break,
        }

        let now = Instant::now();
        let elapsed = u64::try_from(now.duration_since(last).as_millis()).unwrap_or(u64::MAX);
        last = now;
        game.tick(elapsed);
        view.draw(&game)?;
    }

    game.shutdown();
    log::info!("deepshell exited");
    Ok(())
}
