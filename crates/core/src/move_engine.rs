//! Move engine - the falling piece state machine
//!
//! Owns the playfield, the bag, the falling piece with its ghost, the hold
//! slot and the queue of charged operations. Every operation is a plain method
//! call; anything an observer needs to know about is pushed onto an event
//! queue that the caller drains with [`MoveEngine::pop_event`] after each call.
//!
//! States:
//! - idle: no falling piece (between lock and spawn)
//! - active: a piece is falling and accepts moves
//! - stopped: terminal, after a block-out or [`MoveEngine::halt`]
//!
//! Rotations and holds issued while idle are charged and replayed in order
//! right after the next spawn, before the spawn is announced.

use std::collections::VecDeque;

use arrayvec::ArrayVec;
use tracing::{debug, trace};

use crate::pieces::Tetromino;
use crate::playfield::Playfield;
use crate::rng::Bag;
use crate::types::{PieceKind, Point, Turn};

/// Diagonal neighbours of the T anchor checked for T-spins
const DIAGONALS: [Point; 4] = [
    Point::new(1, 1),
    Point::new(1, -1),
    Point::new(-1, 1),
    Point::new(-1, -1),
];

/// Diagonal cells that must be blocked for a raw T-spin
const TSPIN_CORNERS: usize = 3;

/// Upper bound of the preview queue length
pub const PREVIEW_CAPACITY: usize = 14;

/// Operation buffered while no piece is falling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargedOp {
    RotateLeft,
    RotateRight,
    Hold,
}

/// Category of the last move, used for T-spin classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    Shift,
    Rotate,
    Drop,
    Hold,
}

/// Notifications produced by engine operations, in the order they happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEvent {
    /// The upcoming queue changed (read it with [`MoveEngine::preview`])
    PreviewUpdated,
    /// A piece was dequeued and placed at the spawn point
    PieceSpawned {
        piece: Tetromino,
        point: Point,
        ghost: Point,
    },
    /// The falling piece moved; `landed` means it cannot fall further
    PieceMoved {
        piece: Tetromino,
        point: Point,
        ghost: Point,
        landed: bool,
    },
    /// The falling piece was merged and complete rows were cleared
    PieceLocked {
        cleared: Vec<usize>,
        raw_tspin: bool,
        kicked: bool,
    },
    /// The hold slot now holds `piece`
    HoldSet { piece: Tetromino },
    /// A hold request was refused
    HoldFailed,
    /// The spawned piece overlapped the stack; the engine is stopped
    BlockedOut,
}

/// Falling piece together with its landing point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Falling {
    pub piece: Tetromino,
    pub point: Point,
    pub ghost: Point,
}

/// Collision, kick and lock engine for one game
#[derive(Debug, Clone)]
pub struct MoveEngine {
    spawn_point: Point,
    playfield: Playfield,
    bag: Bag,
    falling: Option<Falling>,
    hold: Option<Tetromino>,
    hold_ready: bool,
    stopped: bool,
    charged: VecDeque<ChargedOp>,
    uncharging: bool,
    last_attempted: Option<MoveKind>,
    last_successful: Option<MoveKind>,
    kicked: bool,
    events: VecDeque<FieldEvent>,
}

impl MoveEngine {
    /// Create a stopped engine; call [`MoveEngine::start`] before use
    pub fn new(cols: u8, rows: u8, spawn_point: Point) -> Self {
        Self {
            spawn_point,
            playfield: Playfield::new(cols, rows),
            bag: Bag::new(1),
            falling: None,
            hold: None,
            hold_ready: true,
            stopped: true,
            charged: VecDeque::new(),
            uncharging: false,
            last_attempted: None,
            last_successful: None,
            kicked: false,
            events: VecDeque::new(),
        }
    }

    /// Reset for a new game with an empty field and a fresh bag
    pub fn start(&mut self, seed: u32) {
        let field = Playfield::new(self.playfield.cols() as u8, self.playfield.rows() as u8);
        self.start_with(field, Bag::new(seed));
    }

    /// Reset for a new game from a prepared field and bag
    pub fn start_with(&mut self, playfield: Playfield, bag: Bag) {
        self.playfield = playfield;
        self.bag = bag;
        self.falling = None;
        self.hold = None;
        self.hold_ready = true;
        self.stopped = false;
        self.charged.clear();
        self.uncharging = false;
        self.last_attempted = None;
        self.last_successful = None;
        self.kicked = false;
        self.events.clear();
    }

    /// Stop accepting operations for good
    pub fn halt(&mut self) {
        self.stopped = true;
    }

    /// Bring the next piece in at the spawn point
    ///
    /// No-op while a piece is falling or after the engine stopped. Charged
    /// operations run before the spawn is announced; if the piece then
    /// overlaps the stack the engine stops and reports a block-out.
    pub fn spawn(&mut self) {
        if self.falling.is_some() || self.stopped {
            return;
        }
        let piece = self.bag.next_spawn_candidate();
        let point = self.spawn_point;
        let ghost = self.compute_ghost(&piece, point);
        self.falling = Some(Falling { piece, point, ghost });
        self.hold_ready = true;
        if self.uncharging {
            return;
        }
        debug!(kind = piece.kind.as_str(), "spawn");

        if !self.charged.is_empty() {
            self.uncharging = true;
            for _ in 0..self.charged.len() {
                let Some(op) = self.charged.pop_front() else {
                    break;
                };
                trace!(?op, "replay charged operation");
                match op {
                    ChargedOp::RotateLeft => self.rotate(Turn::Left),
                    ChargedOp::RotateRight => self.rotate(Turn::Right),
                    ChargedOp::Hold => self.hold(),
                }
            }
            self.uncharging = false;
        }

        let Some(current) = self.falling else {
            return;
        };
        self.events.push_back(FieldEvent::PreviewUpdated);
        self.events.push_back(FieldEvent::PieceSpawned {
            piece: current.piece,
            point: current.point,
            ghost: current.ghost,
        });
        if self.playfield.collides(&current.piece, current.point) {
            debug!(kind = current.piece.kind.as_str(), "block out");
            self.stopped = true;
            self.events.push_back(FieldEvent::BlockedOut);
        } else {
            self.commit(current.piece, current.point, false);
        }
    }

    pub fn shift_left(&mut self) {
        self.shift(-1);
    }

    pub fn shift_right(&mut self) {
        self.shift(1);
    }

    pub fn rotate_left(&mut self) {
        self.rotate(Turn::Left);
    }

    pub fn rotate_right(&mut self) {
        self.rotate(Turn::Right);
    }

    /// Move down one row; returns whether the piece moved
    pub fn soft_drop(&mut self) -> bool {
        self.drop_step(false)
    }

    /// Move down one row, locking the piece if it cannot move
    pub fn drop(&mut self) {
        self.drop_step(true);
    }

    /// Move straight to the ghost and lock; returns the rows fallen
    pub fn hard_drop(&mut self) -> u32 {
        self.last_attempted = Some(MoveKind::Drop);
        let Some(mut current) = self.active_piece() else {
            return 0;
        };
        let distance = (current.point.y - current.ghost.y).max(0) as u32;
        if distance > 0 {
            self.last_successful = self.last_attempted;
        }
        current.point = current.ghost;
        self.falling = Some(current);
        self.events.push_back(FieldEvent::PieceMoved {
            piece: current.piece,
            point: current.point,
            ghost: current.ghost,
            landed: true,
        });
        self.lock();
        distance
    }

    /// Swap the falling piece with the hold slot
    pub fn hold(&mut self) {
        self.last_attempted = Some(MoveKind::Hold);
        let Some(current) = self.active_piece() else {
            self.charged.push_back(ChargedOp::Hold);
            return;
        };
        let swap_blocked = self
            .hold
            .is_some_and(|held| self.playfield.collides(&held, self.spawn_point));
        if !self.hold_ready || swap_blocked {
            trace!(ready = self.hold_ready, "hold refused");
            self.events.push_back(FieldEvent::HoldFailed);
            return;
        }

        let previous = self.hold.replace(current.piece.reset());
        debug!(kind = current.piece.kind.as_str(), "hold");
        self.events.push_back(FieldEvent::HoldSet {
            piece: current.piece.reset(),
        });
        match previous {
            Some(held) => {
                self.commit(held, self.spawn_point, true);
            }
            None => {
                self.falling = None;
                self.spawn();
            }
        }
        self.hold_ready = false;
    }

    /// Next queued event, oldest first
    pub fn pop_event(&mut self) -> Option<FieldEvent> {
        self.events.pop_front()
    }

    pub fn playfield(&self) -> &Playfield {
        &self.playfield
    }

    pub fn falling(&self) -> Option<Falling> {
        self.falling
    }

    pub fn hold_piece(&self) -> Option<Tetromino> {
        self.hold
    }

    pub fn is_hold_ready(&self) -> bool {
        self.hold_ready
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// A piece is falling and the engine accepts moves
    pub fn is_active(&self) -> bool {
        self.falling.is_some() && !self.stopped
    }

    /// Upcoming pieces, front first
    pub fn preview(&self) -> ArrayVec<Tetromino, PREVIEW_CAPACITY> {
        self.bag.preview().take(PREVIEW_CAPACITY).collect()
    }

    /// Operations waiting for the next spawn
    pub fn charged_ops(&self) -> impl Iterator<Item = ChargedOp> + '_ {
        self.charged.iter().copied()
    }

    /// Whether the most recent successful rotation needed a kick
    pub fn kicked(&self) -> bool {
        self.kicked
    }

    pub fn last_successful_move(&self) -> Option<MoveKind> {
        self.last_successful
    }

    pub fn spawn_point(&self) -> Point {
        self.spawn_point
    }

    fn active_piece(&self) -> Option<Falling> {
        if self.stopped {
            None
        } else {
            self.falling
        }
    }

    fn compute_ghost(&self, piece: &Tetromino, from: Point) -> Point {
        let mut p = from;
        loop {
            let q = p.add_y(-1);
            if self.playfield.collides(piece, q) {
                return p;
            }
            p = q;
        }
    }

    /// Accept a new position for the falling piece
    fn commit(&mut self, piece: Tetromino, point: Point, update_ghost: bool) {
        self.last_successful = self.last_attempted;
        let ghost = match (update_ghost, self.falling) {
            (false, Some(current)) => current.ghost,
            _ => self.compute_ghost(&piece, point),
        };
        self.falling = Some(Falling { piece, point, ghost });
        if !self.uncharging {
            let landed = self.playfield.collides(&piece, point.add_y(-1));
            self.events.push_back(FieldEvent::PieceMoved {
                piece,
                point,
                ghost,
                landed,
            });
        }
    }

    fn shift(&mut self, dx: i8) {
        self.last_attempted = Some(MoveKind::Shift);
        let Some(current) = self.active_piece() else {
            return;
        };
        let dest = current.point.add_x(dx);
        if self.playfield.collides(&current.piece, dest) {
            return;
        }
        trace!(x = dest.x, y = dest.y, "shift");
        self.commit(current.piece, dest, true);
    }

    fn rotate(&mut self, turn: Turn) {
        self.last_attempted = Some(MoveKind::Rotate);
        let Some(current) = self.active_piece() else {
            self.charged.push_back(match turn {
                Turn::Left => ChargedOp::RotateLeft,
                Turn::Right => ChargedOp::RotateRight,
            });
            return;
        };
        let target = current.piece.turned(turn);
        let offsets = current.piece.kick_candidates(&target);
        let base = current.point + offsets.first().copied().unwrap_or_default();

        let (dest, kicked) = if !self.playfield.collides(&target, base) {
            (base, false)
        } else {
            let kick = offsets
                .iter()
                .skip(1)
                .map(|&offset| current.point + offset)
                .find(|&p| !self.playfield.collides(&target, p));
            match kick {
                Some(p) => (p, true),
                None => return,
            }
        };
        trace!(?turn, x = dest.x, y = dest.y, kicked, "rotate");
        self.kicked = kicked;
        self.commit(target, dest, true);
    }

    fn drop_step(&mut self, lock: bool) -> bool {
        self.last_attempted = Some(MoveKind::Drop);
        let Some(current) = self.active_piece() else {
            return false;
        };
        let dest = current.point.add_y(-1);
        if self.playfield.collides(&current.piece, dest) {
            if lock {
                self.lock();
            }
            return false;
        }
        self.commit(current.piece, dest, false);
        true
    }

    fn is_raw_tspin(&self, current: &Falling) -> bool {
        if current.piece.kind != PieceKind::T || self.last_successful != Some(MoveKind::Rotate) {
            return false;
        }
        let blocked = DIAGONALS
            .iter()
            .filter(|&&d| self.playfield.blocked(current.point + d))
            .count();
        blocked >= TSPIN_CORNERS
    }

    fn lock(&mut self) {
        let Some(current) = self.falling.take() else {
            return;
        };
        let raw_tspin = self.is_raw_tspin(&current);
        self.playfield.merge(&current.piece, current.point);
        let cleared = self.playfield.clear_lines();
        debug!(
            kind = current.piece.kind.as_str(),
            x = current.point.x,
            y = current.point.y,
            lines = cleared.len(),
            raw_tspin,
            kicked = self.kicked,
            "lock"
        );
        self.events.push_back(FieldEvent::PieceLocked {
            cleared,
            raw_tspin,
            kicked: self.kicked,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Rotation;

    const SPAWN: Point = Point::new(4, 20);

    fn engine_with(kinds: &[PieceKind], field: Playfield) -> MoveEngine {
        let mut engine = MoveEngine::new(10, 22, SPAWN);
        engine.start_with(field, Bag::with_queue(kinds, 1));
        engine
    }

    fn drain(engine: &mut MoveEngine) -> Vec<FieldEvent> {
        std::iter::from_fn(|| engine.pop_event()).collect()
    }

    #[test]
    fn test_spawn_announces_piece() {
        let mut engine = engine_with(&[PieceKind::T], Playfield::new(10, 22));
        engine.spawn();
        let events = drain(&mut engine);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], FieldEvent::PreviewUpdated);
        assert_eq!(
            events[1],
            FieldEvent::PieceSpawned {
                piece: Tetromino::spawn(PieceKind::T),
                point: SPAWN,
                ghost: Point::new(4, 0),
            }
        );
        assert!(matches!(events[2], FieldEvent::PieceMoved { landed: false, .. }));
        assert!(engine.is_active());
        assert!(engine.preview().len() >= 7);
    }

    #[test]
    fn test_spawn_is_noop_while_falling() {
        let mut engine = engine_with(&[PieceKind::T, PieceKind::I], Playfield::new(10, 22));
        engine.spawn();
        drain(&mut engine);
        engine.spawn();
        assert!(drain(&mut engine).is_empty());
        assert_eq!(engine.falling().unwrap().piece.kind, PieceKind::T);
    }

    #[test]
    fn test_shift_stops_at_wall_silently() {
        let mut engine = engine_with(&[PieceKind::O], Playfield::new(10, 22));
        engine.spawn();
        drain(&mut engine);
        for _ in 0..4 {
            engine.shift_left();
        }
        assert_eq!(drain(&mut engine).len(), 4);
        assert_eq!(engine.falling().unwrap().point, Point::new(0, 20));
        engine.shift_left();
        assert!(drain(&mut engine).is_empty());
    }

    #[test]
    fn test_ops_without_piece_are_ignored() {
        let mut engine = engine_with(&[PieceKind::T], Playfield::new(10, 22));
        engine.shift_left();
        assert!(!engine.soft_drop());
        assert_eq!(engine.hard_drop(), 0);
        assert!(drain(&mut engine).is_empty());
    }

    #[test]
    fn test_hard_drop_locks_at_ghost() {
        let mut engine = engine_with(&[PieceKind::I], Playfield::new(10, 22));
        engine.spawn();
        drain(&mut engine);
        assert_eq!(engine.hard_drop(), 20);
        let events = drain(&mut engine);
        assert!(matches!(
            events[0],
            FieldEvent::PieceMoved { landed: true, point, .. } if point == Point::new(4, 0)
        ));
        assert_eq!(
            events[1],
            FieldEvent::PieceLocked {
                cleared: vec![],
                raw_tspin: false,
                kicked: false
            }
        );
        assert!(engine.falling().is_none());
        assert_eq!(engine.playfield().to_rows_top_down(1), vec!["...IIII..."]);
    }

    #[test]
    fn test_soft_drop_reports_landing() {
        let mut engine = engine_with(&[PieceKind::O], Playfield::new(10, 22));
        engine.spawn();
        drain(&mut engine);
        let mut steps = 0;
        while engine.soft_drop() {
            steps += 1;
        }
        assert_eq!(steps, 20);
        let events = drain(&mut engine);
        assert!(matches!(events.last(), Some(FieldEvent::PieceMoved { landed: true, .. })));
        // soft drop never locks
        assert!(engine.is_active());
        engine.drop();
        assert!(matches!(
            drain(&mut engine).as_slice(),
            [FieldEvent::PieceLocked { .. }]
        ));
    }

    #[test]
    fn test_wall_kick_sets_kicked() {
        let mut engine = engine_with(&[PieceKind::I, PieceKind::T], Playfield::new(10, 22));
        engine.spawn();
        engine.rotate_right();
        assert!(!engine.kicked());
        assert_eq!(engine.falling().unwrap().point, Point::new(5, 20));
        for _ in 0..6 {
            engine.shift_left();
        }
        assert_eq!(engine.falling().unwrap().point, Point::new(0, 20));
        engine.rotate_right();
        let falling = engine.falling().unwrap();
        assert_eq!(falling.piece.rotation, Rotation::South);
        assert_eq!(falling.point, Point::new(2, 19));
        assert!(engine.kicked());
        drain(&mut engine);
        engine.hard_drop();
        let events = drain(&mut engine);
        assert!(matches!(
            events.last(),
            Some(FieldEvent::PieceLocked { kicked: true, raw_tspin: false, .. })
        ));
    }

    #[test]
    fn test_tspin_double_unkicked() {
        let field = Playfield::from_rows_top_down(
            10,
            22,
            &["...X......", "XXX...XXXX", "XXXX.XXXXX"],
        );
        let mut engine = engine_with(&[PieceKind::T], field);
        engine.spawn();
        engine.rotate_right();
        while engine.soft_drop() {}
        assert_eq!(engine.falling().unwrap().point, Point::new(4, 1));
        engine.rotate_right();
        assert_eq!(engine.falling().unwrap().piece.rotation, Rotation::South);
        assert!(!engine.kicked());
        drain(&mut engine);
        engine.drop();
        assert_eq!(
            drain(&mut engine),
            vec![FieldEvent::PieceLocked {
                cleared: vec![0, 1],
                raw_tspin: true,
                kicked: false
            }]
        );
        assert_eq!(engine.playfield().to_rows_top_down(1), vec!["...Z......"]);
    }

    #[test]
    fn test_no_tspin_after_shift() {
        let field = Playfield::from_rows_top_down(
            10,
            22,
            &["...X......", "XXX...XXXX", "XXXX.XXXXX"],
        );
        let mut engine = engine_with(&[PieceKind::T], field);
        engine.spawn();
        engine.rotate_right();
        engine.rotate_right();
        engine.shift_left();
        engine.shift_right();
        engine.hard_drop();
        let locked = drain(&mut engine)
            .into_iter()
            .find(|e| matches!(e, FieldEvent::PieceLocked { .. }));
        assert!(matches!(
            locked,
            Some(FieldEvent::PieceLocked { raw_tspin: false, .. })
        ));
    }

    #[test]
    fn test_hold_into_empty_slot_spawns_next() {
        let mut engine = engine_with(
            &[PieceKind::T, PieceKind::I, PieceKind::O],
            Playfield::new(10, 22),
        );
        engine.spawn();
        drain(&mut engine);
        engine.rotate_right();
        drain(&mut engine);
        engine.hold();
        let events = drain(&mut engine);
        assert_eq!(
            events[0],
            FieldEvent::HoldSet {
                piece: Tetromino::spawn(PieceKind::T)
            }
        );
        assert_eq!(events[1], FieldEvent::PreviewUpdated);
        assert!(matches!(
            events[2],
            FieldEvent::PieceSpawned { piece, .. } if piece.kind == PieceKind::I
        ));
        assert!(!engine.is_hold_ready());

        engine.hold();
        assert_eq!(drain(&mut engine), vec![FieldEvent::HoldFailed]);
    }

    #[test]
    fn test_hold_swap_places_held_piece_without_spawn() {
        let mut engine = engine_with(
            &[PieceKind::T, PieceKind::I, PieceKind::O],
            Playfield::new(10, 22),
        );
        engine.spawn();
        engine.hold();
        engine.hard_drop();
        engine.spawn();
        drain(&mut engine);
        assert_eq!(engine.falling().unwrap().piece.kind, PieceKind::O);
        engine.hold();
        let events = drain(&mut engine);
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0],
            FieldEvent::HoldSet {
                piece: Tetromino::spawn(PieceKind::O)
            }
        );
        assert!(matches!(
            events[1],
            FieldEvent::PieceMoved { piece, point, .. }
                if piece.kind == PieceKind::T && point == SPAWN
        ));
    }

    #[test]
    fn test_charged_ops_replay_before_spawn_event() {
        let mut engine = engine_with(&[PieceKind::T, PieceKind::I], Playfield::new(10, 22));
        engine.rotate_right();
        engine.rotate_right();
        assert_eq!(
            engine.charged_ops().collect::<Vec<_>>(),
            vec![ChargedOp::RotateRight, ChargedOp::RotateRight]
        );
        engine.spawn();
        let events = drain(&mut engine);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], FieldEvent::PreviewUpdated);
        assert!(matches!(
            events[1],
            FieldEvent::PieceSpawned { piece, .. } if piece.rotation == Rotation::South
        ));
        assert_eq!(engine.charged_ops().count(), 0);
    }

    #[test]
    fn test_charged_hold_swaps_before_announcement() {
        let mut engine = engine_with(&[PieceKind::T, PieceKind::I], Playfield::new(10, 22));
        engine.hold();
        engine.spawn();
        let events = drain(&mut engine);
        assert_eq!(
            events[0],
            FieldEvent::HoldSet {
                piece: Tetromino::spawn(PieceKind::T)
            }
        );
        assert!(matches!(
            events[2],
            FieldEvent::PieceSpawned { piece, .. } if piece.kind == PieceKind::I
        ));
        assert_eq!(engine.hold_piece(), Some(Tetromino::spawn(PieceKind::T)));
        assert!(!engine.is_hold_ready());
    }

    #[test]
    fn test_block_out_reported_once() {
        let mut field = Playfield::new(10, 22);
        field.set(4, 20, Some(PieceKind::Z));
        let mut engine = engine_with(&[PieceKind::T, PieceKind::I], field);
        engine.spawn();
        let events = drain(&mut engine);
        assert_eq!(events.last(), Some(&FieldEvent::BlockedOut));
        assert_eq!(
            events.iter().filter(|e| **e == FieldEvent::BlockedOut).count(),
            1
        );
        assert!(engine.is_stopped());
        // nothing was merged
        assert_eq!(engine.playfield().get(3, 20), Some(None));

        engine.spawn();
        engine.shift_left();
        engine.hard_drop();
        assert!(drain(&mut engine).is_empty());
    }

    #[test]
    fn test_halt_stops_moves() {
        let mut engine = engine_with(&[PieceKind::T], Playfield::new(10, 22));
        engine.spawn();
        drain(&mut engine);
        engine.halt();
        engine.shift_left();
        assert_eq!(engine.hard_drop(), 0);
        assert!(drain(&mut engine).is_empty());
        assert!(!engine.is_active());
    }
}
