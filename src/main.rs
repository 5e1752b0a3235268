//! Terminal Tetris runner (default binary).
//!
//! Reads its configuration from the environment (see [`srs_tetris::config`]),
//! drives a [`Session`] on the wall clock and draws through the framebuffer
//! renderer. When the player quits, the last finished game is printed to
//! stdout as one JSON line.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use tracing::info;
use tracing_subscriber::EnvFilter;

use srs_tetris::engine::{Clock, GameSummary, Session, SystemClock};
use srs_tetris::input::{is_restart, should_quit, virtual_key, SyntheticRelease};
use srs_tetris::term::{FrameBuffer, GameView, TermPresenter, TerminalRenderer, Viewport};
use srs_tetris::AppConfig;

/// Longest wait for input when nothing is scheduled
const IDLE_POLL: Duration = Duration::from_millis(250);

fn main() -> Result<()> {
    let config = AppConfig::from_env()?;
    if let Some(path) = &config.log_path {
        init_logging(path)?;
    }

    let mut term = TerminalRenderer::new();
    term.enter()?;

    let result = run(&mut term, &config);

    // Always try to restore terminal state.
    let _ = term.exit();

    if let Some(summary) = result? {
        println!("{}", serde_json::to_string(&summary)?);
    }
    Ok(())
}

fn init_logging(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("failed to install logger: {e}"))
}

fn run(term: &mut TerminalRenderer, config: &AppConfig) -> Result<Option<GameSummary>> {
    let mut session = Session::new(config.rules.clone(), TermPresenter::new(), SystemClock::new())?;
    let mut seed = config.seed;
    session.start(config.mode, seed);

    let view = GameView::default();
    let mut fb = FrameBuffer::new(0, 0);
    // Terminals without release events get releases after a silence.
    let press_only = !term.reports_key_releases();
    let mut releases = SyntheticRelease::default();
    let mut redraw = true;
    let mut finished = None;
    info!(mode = %config.mode, seed, press_only, "runner started");

    loop {
        let now = session.pump();
        if press_only {
            for key in releases.expired(now) {
                session.key_up(key);
            }
        }
        if session.summary().is_some() {
            finished = session.summary();
        }

        if session.presenter_mut().take_dirty() || redraw {
            let (w, h) = crossterm::terminal::size().unwrap_or((80, 24));
            view.render_into(session.presenter().view(), Viewport::new(w, h), &mut fb);
            term.draw_swap(&mut fb)?;
            redraw = false;
        }

        let release_at = if press_only { releases.next_expiry() } else { None };
        let timeout = match (session.next_wakeup(), release_at) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
        .map_or(IDLE_POLL, |at| {
            Duration::from_millis(at.saturating_sub(now)).min(IDLE_POLL)
        });
        if !event::poll(timeout)? {
            continue;
        }

        match event::read()? {
            Event::Resize(..) => {
                term.invalidate();
                redraw = true;
            }
            Event::Key(key) if key.kind == KeyEventKind::Press && should_quit(key) => {
                return Ok(finished);
            }
            Event::Key(key) if key.kind == KeyEventKind::Press && is_restart(key) => {
                if session.simulator().is_over() {
                    seed = seed.wrapping_add(1);
                    releases.clear();
                    session.start(config.mode, seed);
                }
            }
            Event::Key(key) => {
                let Some(vk) = virtual_key(key) else {
                    continue;
                };
                match key.kind {
                    KeyEventKind::Press | KeyEventKind::Repeat => {
                        if press_only {
                            releases.on_press(vk, session.clock().now_ms());
                        }
                        session.key_down(vk);
                    }
                    KeyEventKind::Release => {
                        releases.on_release(vk);
                        session.key_up(vk);
                    }
                }
            }
            _ => {}
        }
    }
}
