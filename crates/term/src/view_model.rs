//! Terminal presenter: keeps everything the game view draws.

use crate::core::{ActionRecord, Falling, Figures, Playfield, Tetromino};
use crate::engine::{GameRecord, Presenter, Rules};
use crate::types::{GameMode, Point};

/// Snapshot of the game as last reported by the simulator
#[derive(Debug, Clone)]
pub struct ViewModel {
    pub mode: GameMode,
    /// Visible rows; rows above are never drawn
    pub rows: usize,
    pub playfield: Playfield,
    pub falling: Option<Falling>,
    pub hold: Option<Tetromino>,
    pub preview: Vec<Tetromino>,
    pub figures: Figures,
    /// Seconds shown on the timer
    pub seconds: u64,
    pub action: ActionRecord,
    pub stopped: bool,
    pub blocked_out: bool,
    pub record: Option<GameRecord>,
}

impl Default for ViewModel {
    fn default() -> Self {
        let rules = Rules::default();
        Self {
            mode: GameMode::Marathon,
            rows: rules.rows as usize,
            playfield: Playfield::new(rules.cols, rules.rows),
            falling: None,
            hold: None,
            preview: Vec::new(),
            figures: Figures::default(),
            seconds: 0,
            action: ActionRecord::default(),
            stopped: false,
            blocked_out: false,
            record: None,
        }
    }
}

/// [`Presenter`] that mirrors notifications into a [`ViewModel`]
#[derive(Debug, Clone, Default)]
pub struct TermPresenter {
    view: ViewModel,
    dirty: bool,
}

impl TermPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> &ViewModel {
        &self.view
    }

    /// Whether anything changed since the last call
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn set_falling(&mut self, piece: Tetromino, point: Point, ghost: Point) {
        self.view.falling = Some(Falling { piece, point, ghost });
        self.dirty = true;
    }
}

impl Presenter for TermPresenter {
    fn on_start(&mut self, mode: GameMode, rules: &Rules) {
        self.view = ViewModel {
            mode,
            rows: rules.rows as usize,
            playfield: Playfield::new(rules.cols, rules.rows),
            ..ViewModel::default()
        };
        self.dirty = true;
    }

    fn on_piece_spawned(&mut self, piece: Tetromino, point: Point, ghost: Point) {
        self.set_falling(piece, point, ghost);
    }

    fn on_piece_moved(&mut self, piece: Tetromino, point: Point, ghost: Point, _landed: bool) {
        self.set_falling(piece, point, ghost);
    }

    fn on_piece_locked(&mut self, playfield: &Playfield, _cleared: &[usize], _tspin: bool, _kicked: bool) {
        self.view.playfield.clone_from(playfield);
        self.view.falling = None;
        self.dirty = true;
    }

    fn on_hold_set(&mut self, piece: Tetromino) {
        self.view.hold = Some(piece);
        self.dirty = true;
    }

    fn on_preview_updated(&mut self, preview: &[Tetromino]) {
        self.view.preview.clear();
        self.view.preview.extend_from_slice(preview);
        self.dirty = true;
    }

    fn on_block_out(&mut self) {
        self.view.blocked_out = true;
        self.dirty = true;
    }

    fn on_time_update(&mut self, seconds: u64) {
        self.view.seconds = seconds;
        self.dirty = true;
    }

    fn on_figures_update(&mut self, figures: &Figures) {
        self.view.figures = *figures;
        self.dirty = true;
    }

    fn on_action_update(&mut self, action: &ActionRecord) {
        self.view.action = *action;
        self.dirty = true;
    }

    fn on_stopped(&mut self, falling: Option<Falling>) {
        self.view.falling = falling;
        self.view.stopped = true;
        self.dirty = true;
    }

    fn on_game_over(&mut self, _mode: GameMode, record: GameRecord) {
        self.view.record = Some(record);
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Simulator;

    #[test]
    fn test_mirrors_a_running_game() {
        let mut sim = Simulator::new(Rules::default(), TermPresenter::new()).unwrap();
        sim.start(GameMode::Ultra, 42, 0);
        assert!(sim.presenter_mut().take_dirty());
        assert!(!sim.presenter_mut().take_dirty());

        let view = sim.presenter().view();
        assert_eq!(view.mode, GameMode::Ultra);
        assert_eq!(view.seconds, 180);
        assert_eq!(view.falling, sim.engine().falling());
        assert_eq!(view.preview.len(), sim.engine().preview().len());

        sim.hard_drop();
        let view = sim.presenter().view();
        assert_eq!(&view.playfield, sim.engine().playfield());
        assert_eq!(view.figures, *sim.figures());
        assert!(view.falling.is_some());
    }

    #[test]
    fn test_hold_and_game_over() {
        let mut sim = Simulator::new(Rules::default(), TermPresenter::new()).unwrap();
        sim.start(GameMode::Sprint, 3, 0);
        let first = sim.engine().falling().unwrap().piece.kind;
        sim.hold();
        assert_eq!(sim.presenter().view().hold.map(|t| t.kind), Some(first));

        while sim.is_running() {
            sim.hard_drop();
        }
        sim.advance_to(10_000);
        let view = sim.presenter().view();
        assert!(view.stopped);
        assert!(view.blocked_out);
        assert_eq!(view.record, Some(GameRecord::SprintTime(None)));
    }
}
