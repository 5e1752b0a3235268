//! Presentation callbacks and game results.
//!
//! The simulator reports everything a front end needs through [`Presenter`].
//! All callbacks default to no-ops, so a presenter only implements what it
//! draws or plays.

use serde::{Deserialize, Serialize};

use crate::core::{ActionRecord, Falling, Figures, Playfield, Tetromino};
use crate::rules::Rules;
use crate::types::{GameMode, Point};

/// Final mode-specific result of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameRecord {
    /// Marathon and ultra: the final score
    Score(u64),
    /// Sprint: milliseconds to reach the line target, `None` after a block-out
    SprintTime(Option<u64>),
}

/// Everything worth keeping about a finished game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    pub mode: GameMode,
    pub record: GameRecord,
    pub figures: Figures,
    pub blocked_out: bool,
}

/// Receiver of simulator notifications
#[allow(unused_variables)]
pub trait Presenter {
    /// A game started; figures follow through `on_figures_update`
    fn on_start(&mut self, mode: GameMode, rules: &Rules) {}

    fn on_piece_spawned(&mut self, piece: Tetromino, point: Point, ghost: Point) {}

    fn on_piece_moved(&mut self, piece: Tetromino, point: Point, ghost: Point, landed: bool) {}

    /// `playfield` already has the piece merged and the cleared rows removed
    fn on_piece_locked(&mut self, playfield: &Playfield, cleared: &[usize], tspin: bool, kicked: bool) {}

    fn on_hold_set(&mut self, piece: Tetromino) {}

    fn on_hold_failed(&mut self) {}

    fn on_preview_updated(&mut self, preview: &[Tetromino]) {}

    fn on_block_out(&mut self) {}

    /// Elapsed seconds, or remaining seconds in ultra
    fn on_time_update(&mut self, seconds: u64) {}

    fn on_figures_update(&mut self, figures: &Figures) {}

    fn on_action_update(&mut self, action: &ActionRecord) {}

    /// Play stopped; `falling` is the piece left on screen
    fn on_stopped(&mut self, falling: Option<Falling>) {}

    /// Final result, delivered after the game-over delay
    fn on_game_over(&mut self, mode: GameMode, record: GameRecord) {}
}

/// Presenter that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {}

impl<P: Presenter + ?Sized> Presenter for Box<P> {
    fn on_start(&mut self, mode: GameMode, rules: &Rules) {
        (**self).on_start(mode, rules)
    }

    fn on_piece_spawned(&mut self, piece: Tetromino, point: Point, ghost: Point) {
        (**self).on_piece_spawned(piece, point, ghost)
    }

    fn on_piece_moved(&mut self, piece: Tetromino, point: Point, ghost: Point, landed: bool) {
        (**self).on_piece_moved(piece, point, ghost, landed)
    }

    fn on_piece_locked(&mut self, playfield: &Playfield, cleared: &[usize], tspin: bool, kicked: bool) {
        (**self).on_piece_locked(playfield, cleared, tspin, kicked)
    }

    fn on_hold_set(&mut self, piece: Tetromino) {
        (**self).on_hold_set(piece)
    }

    fn on_hold_failed(&mut self) {
        (**self).on_hold_failed()
    }

    fn on_preview_updated(&mut self, preview: &[Tetromino]) {
        (**self).on_preview_updated(preview)
    }

    fn on_block_out(&mut self) {
        (**self).on_block_out()
    }

    fn on_time_update(&mut self, seconds: u64) {
        (**self).on_time_update(seconds)
    }

    fn on_figures_update(&mut self, figures: &Figures) {
        (**self).on_figures_update(figures)
    }

    fn on_action_update(&mut self, action: &ActionRecord) {
        (**self).on_action_update(action)
    }

    fn on_stopped(&mut self, falling: Option<Falling>) {
        (**self).on_stopped(falling)
    }

    fn on_game_over(&mut self, mode: GameMode, record: GameRecord) {
        (**self).on_game_over(mode, record)
    }
}
