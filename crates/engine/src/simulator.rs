//! Timing and scoring engine.
//!
//! The simulator drives a [`MoveEngine`] through time. Its timers live in a
//! [`Scheduler`]:
//!
//! | Timer | Fires | Effect |
//! |-------|-------|--------|
//! | clock | every second, drift corrected | time update, ultra countdown |
//! | gravity | every tick (60 Hz) | accumulate fall distance, soft-drop steps |
//! | lock | lock delay after landing | drop-to-lock |
//! | spawn | line-clear pause after a clear | next piece |
//! | finish | game-over delay after stopping | final record |
//!
//! Engine events are drained after every engine call and dispatched in
//! order. Handlers may call back into the engine; the events this produces
//! are appended to the same queue and handled by the same drain loop.
//!
//! Time never advances on its own: [`Simulator::advance_to`] fires every timer
//! due up to the given millisecond, and commands act at the current time.

use tracing::{debug, info};

use crate::core::scoring::{self, ActionRecord, Figures};
use crate::core::{Bag, FieldEvent, MoveEngine, Playfield};
use crate::presenter::{GameRecord, GameSummary, Presenter};
use crate::rules::{Rules, RulesError};
use crate::scheduler::{Scheduler, TimerId};
use crate::types::{Command, GameMode, ParseGameModeError};

/// Timer categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Clock,
    Gravity,
    Lock,
    Spawn,
    Finish,
}

/// Life cycle of one game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Never started
    Idle,
    /// Accepting commands
    Running,
    /// Stopped, waiting for the game-over delay
    Finishing,
    /// Result delivered
    Over,
}

/// Request for the input controller, raised by the simulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerSignal {
    /// Force-release interruptible keys (soft drop)
    Interrupt,
    /// Stop reading input
    Stop,
}

/// One game session's timing, scoring and mode rules
pub struct Simulator<P> {
    rules: Rules,
    presenter: P,
    engine: MoveEngine,
    scheduler: Scheduler<TimerKind>,
    phase: Phase,
    mode: GameMode,
    figures: Figures,
    action: ActionRecord,
    now: u64,
    start_time: u64,
    end_time: Option<u64>,
    blocked_out: bool,
    record: Option<GameRecord>,
    soft_dropping: bool,
    gravity_rate: f64,
    lock_delay: u64,
    fall_distance: f64,
    fall_origin: u64,
    fall_ticks: u64,
    gravity_epoch: u64,
    gravity_timer: Option<TimerId>,
    lock_timer: Option<TimerId>,
    infinity: Vec<u32>,
    signal: Option<ControllerSignal>,
}

impl<P: Presenter> Simulator<P> {
    /// Create an idle simulator; fails if `rules` do not validate
    pub fn new(rules: Rules, presenter: P) -> Result<Self, RulesError> {
        rules.validate()?;
        let engine = MoveEngine::new(rules.cols, rules.rows, rules.spawn);
        let infinity = vec![0; rules.height() as usize];
        Ok(Self {
            presenter,
            engine,
            scheduler: Scheduler::new(),
            phase: Phase::Idle,
            mode: GameMode::Marathon,
            figures: Figures::default(),
            action: ActionRecord::default(),
            now: 0,
            start_time: 0,
            end_time: None,
            blocked_out: false,
            record: None,
            soft_dropping: false,
            gravity_rate: rules.gravity_per_tick(1),
            lock_delay: rules.lock_delay_ms(1),
            fall_distance: 0.0,
            fall_origin: 0,
            fall_ticks: 0,
            gravity_epoch: 0,
            gravity_timer: None,
            lock_timer: None,
            infinity,
            signal: None,
            rules,
        })
    }

    /// Start a new game at time `now` with an empty field
    pub fn start(&mut self, mode: GameMode, seed: u32, now: u64) {
        debug!(seed, "seeding bag");
        let field = Playfield::new(self.rules.cols, self.rules.rows);
        self.start_with(mode, field, Bag::new(seed), now);
    }

    /// Start a new game from a prepared field and bag
    pub fn start_with(&mut self, mode: GameMode, playfield: Playfield, bag: Bag, now: u64) {
        self.scheduler.cancel_all();
        self.gravity_timer = None;
        self.lock_timer = None;
        self.mode = mode;
        self.figures = Figures::default();
        self.action = ActionRecord::default();
        self.soft_dropping = false;
        self.blocked_out = false;
        self.record = None;
        self.signal = None;
        self.update_timings();
        self.reset_infinity();
        self.engine.start_with(playfield, bag);

        self.now = self.now.max(now);
        self.start_time = self.now;
        self.end_time = None;
        self.phase = Phase::Running;
        info!(%mode, "game started");

        self.presenter.on_start(mode, &self.rules);
        self.presenter.on_figures_update(&self.figures);
        self.on_clock();
        self.spawn_piece();
        self.process_events();
    }

    /// Start a game from a mode name; unknown names are rejected
    pub fn start_named(&mut self, mode: &str, seed: u32, now: u64) -> Result<(), ParseGameModeError> {
        let mode: GameMode = mode.parse()?;
        self.start(mode, seed, now);
        Ok(())
    }

    pub fn shift_left(&mut self) {
        if self.is_running() {
            self.engine.shift_left();
            self.process_events();
        }
    }

    pub fn shift_right(&mut self) {
        if self.is_running() {
            self.engine.shift_right();
            self.process_events();
        }
    }

    pub fn rotate_left(&mut self) {
        if self.is_running() {
            self.engine.rotate_left();
            self.process_events();
        }
    }

    pub fn rotate_right(&mut self) {
        if self.is_running() {
            self.engine.rotate_right();
            self.process_events();
        }
    }

    pub fn hold(&mut self) {
        if self.is_running() {
            self.engine.hold();
            self.process_events();
        }
    }

    /// Flip the player-held soft drop state
    pub fn soft_drop_toggle(&mut self) {
        if self.is_running() {
            self.soft_dropping = !self.soft_dropping;
            debug!(soft_dropping = self.soft_dropping, "soft drop toggled");
        }
    }

    /// Drop and lock; awards hard-drop points for the rows fallen
    pub fn hard_drop(&mut self) {
        if !self.is_running() {
            return;
        }
        let distance = self.engine.hard_drop();
        self.process_events();
        if distance > 0 {
            self.figures.score += scoring::drop_score(distance, self.rules.scores.hard_drop);
            self.presenter.on_figures_update(&self.figures);
        }
    }

    /// Dispatch an abstract command
    pub fn apply(&mut self, command: Command) {
        match command {
            Command::ShiftLeft => self.shift_left(),
            Command::ShiftRight => self.shift_right(),
            Command::RotateLeft => self.rotate_left(),
            Command::RotateRight => self.rotate_right(),
            Command::SoftDropToggle => self.soft_drop_toggle(),
            Command::HardDrop => self.hard_drop(),
            Command::Hold => self.hold(),
        }
    }

    /// Time of the earliest pending timer
    pub fn next_timer_at(&mut self) -> Option<u64> {
        self.scheduler.next_at()
    }

    /// Fire the earliest timer if it is due at or before `now`
    pub fn fire_next_due(&mut self, now: u64) -> bool {
        let Some((at, kind)) = self.scheduler.pop_due(now) else {
            return false;
        };
        self.now = self.now.max(at);
        match kind {
            TimerKind::Clock => self.on_clock(),
            TimerKind::Gravity => self.on_gravity(),
            TimerKind::Lock => {
                self.lock_timer = None;
                self.engine.drop();
                self.process_events();
            }
            TimerKind::Spawn => {
                self.spawn_piece();
                self.process_events();
            }
            TimerKind::Finish => self.finish(),
        }
        true
    }

    /// Fire every timer due up to `now`, then move the current time there
    pub fn advance_to(&mut self, now: u64) {
        while self.fire_next_due(now) {}
        self.set_now(now);
    }

    /// Move the current time forward without firing timers
    pub fn set_now(&mut self, now: u64) {
        self.now = self.now.max(now);
    }

    /// Pending request for the input controller
    pub fn take_controller_signal(&mut self) -> Option<ControllerSignal> {
        self.signal.take()
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn is_over(&self) -> bool {
        self.phase == Phase::Over
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn figures(&self) -> &Figures {
        &self.figures
    }

    pub fn action(&self) -> &ActionRecord {
        &self.action
    }

    pub fn engine(&self) -> &MoveEngine {
        &self.engine
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn is_soft_dropping(&self) -> bool {
        self.soft_dropping
    }

    pub fn is_blocked_out(&self) -> bool {
        self.blocked_out
    }

    /// Gravity in rows per tick at the current level
    pub fn gravity_rate(&self) -> f64 {
        self.gravity_rate
    }

    /// Lock delay in milliseconds at the current level
    pub fn lock_delay_ms(&self) -> u64 {
        self.lock_delay
    }

    /// Landed-without-locking count for row `y`
    pub fn infinity_count(&self, y: usize) -> u32 {
        self.infinity.get(y).copied().unwrap_or(0)
    }

    /// Whether a lock-delay timer is running
    pub fn is_lock_pending(&self) -> bool {
        self.lock_timer.is_some_and(|id| self.scheduler.is_pending(id))
    }

    /// Final result, once the game is over
    pub fn record(&self) -> Option<GameRecord> {
        self.record
    }

    pub fn summary(&self) -> Option<GameSummary> {
        self.record.map(|record| GameSummary {
            mode: self.mode,
            record,
            figures: self.figures,
            blocked_out: self.blocked_out,
        })
    }

    fn signal_controller(&mut self, signal: ControllerSignal) {
        if self.signal != Some(ControllerSignal::Stop) {
            self.signal = Some(signal);
        }
    }

    fn update_timings(&mut self) {
        self.gravity_rate = self.rules.gravity_per_tick(self.figures.level);
        self.lock_delay = self.rules.lock_delay_ms(self.figures.level);
    }

    fn reset_infinity(&mut self) {
        self.infinity.fill(0);
    }

    fn cancel_lock(&mut self) {
        if let Some(id) = self.lock_timer.take() {
            self.scheduler.cancel(id);
        }
    }

    fn cancel_gravity(&mut self) {
        if let Some(id) = self.gravity_timer.take() {
            self.scheduler.cancel(id);
        }
    }

    fn spawn_piece(&mut self) {
        if self.end_time.is_some() {
            self.stop();
            return;
        }
        self.engine.spawn();
    }

    fn on_clock(&mut self) {
        if !self.is_running() {
            return;
        }
        let elapsed = self.now - self.start_time;
        self.scheduler
            .schedule(self.now + (1000 - elapsed % 1000), TimerKind::Clock);
        let seconds = (elapsed + 500) / 1000;
        if self.mode != GameMode::Ultra {
            self.presenter.on_time_update(seconds);
            return;
        }
        let remaining = self.rules.ultra_seconds.saturating_sub(seconds);
        self.presenter.on_time_update(remaining);
        if remaining == 0 {
            self.stop();
        }
    }

    /// Stop the current fall; a gravity loop in progress notices the new epoch
    fn end_fall(&mut self) {
        self.cancel_gravity();
        self.gravity_epoch += 1;
        self.fall_distance = 0.0;
    }

    fn start_gravity(&mut self) {
        self.end_fall();
        self.fall_origin = self.now;
        self.fall_ticks = 1;
        self.schedule_gravity();
    }

    fn schedule_gravity(&mut self) {
        let at = self.fall_origin + self.rules.tick_offset_ms(self.fall_ticks);
        self.gravity_timer = Some(self.scheduler.schedule(at, TimerKind::Gravity));
    }

    fn on_gravity(&mut self) {
        self.gravity_timer = None;
        let epoch = self.gravity_epoch;
        self.fall_distance += if self.soft_dropping {
            self.rules.soft_drop_rows_per_tick
        } else {
            self.gravity_rate
        };
        while self.fall_distance >= 1.0 {
            self.fall_distance -= 1.0;
            let moved = self.engine.soft_drop();
            self.process_events();
            if epoch != self.gravity_epoch || !self.is_running() {
                return;
            }
            if !moved {
                self.fall_distance = 0.0;
                break;
            }
            if self.soft_dropping && self.mode != GameMode::Sprint {
                self.figures.score += scoring::drop_score(1, self.rules.scores.soft_drop);
                self.presenter.on_figures_update(&self.figures);
            }
        }
        self.fall_ticks += 1;
        self.schedule_gravity();
    }

    /// Drain and dispatch engine events until the queue is empty
    fn process_events(&mut self) {
        while let Some(event) = self.engine.pop_event() {
            if !self.is_running() {
                continue;
            }
            self.dispatch(event);
        }
    }

    fn dispatch(&mut self, event: FieldEvent) {
        match event {
            FieldEvent::PreviewUpdated => {
                let preview = self.engine.preview();
                self.presenter.on_preview_updated(&preview);
            }
            FieldEvent::PieceSpawned { piece, point, ghost } => {
                self.cancel_lock();
                self.presenter.on_piece_spawned(piece, point, ghost);
                self.signal_controller(ControllerSignal::Interrupt);
                self.reset_infinity();
                self.start_gravity();
            }
            FieldEvent::PieceMoved {
                piece,
                point,
                ghost,
                landed,
            } => {
                self.cancel_lock();
                self.presenter.on_piece_moved(piece, point, ghost, landed);
                if landed {
                    self.on_landed(point.y.max(0) as usize);
                }
            }
            FieldEvent::PieceLocked {
                cleared,
                raw_tspin,
                kicked,
            } => {
                self.cancel_lock();
                self.end_fall();
                self.presenter
                    .on_piece_locked(self.engine.playfield(), &cleared, raw_tspin, kicked);
                self.update_state(cleared.len(), raw_tspin, kicked);
                self.presenter.on_action_update(&self.action);
                self.presenter.on_figures_update(&self.figures);
                if cleared.is_empty() {
                    self.spawn_piece();
                } else {
                    let at = self.now + self.rules.line_clear_ms();
                    self.scheduler.schedule(at, TimerKind::Spawn);
                }
            }
            FieldEvent::HoldSet { piece } => {
                self.cancel_lock();
                self.presenter.on_hold_set(piece);
                self.signal_controller(ControllerSignal::Interrupt);
                self.reset_infinity();
            }
            FieldEvent::HoldFailed => self.presenter.on_hold_failed(),
            FieldEvent::BlockedOut => {
                self.presenter.on_block_out();
                self.blocked_out = true;
                self.end_time = Some(self.now);
                self.stop();
            }
        }
    }

    /// Count a landing on row `y` and lock at once past the infinity limit
    fn on_landed(&mut self, y: usize) {
        for count in self.infinity.iter_mut().skip(y) {
            *count += 1;
        }
        if self.infinity_count(y) > self.rules.infinity_limit {
            debug!(y, "infinity limit reached");
            self.engine.drop();
        } else {
            let at = self.now + self.lock_delay;
            self.lock_timer = Some(self.scheduler.schedule(at, TimerKind::Lock));
        }
    }

    fn update_state(&mut self, lines: usize, raw_tspin: bool, kicked: bool) {
        self.action = self.action.record_lock(
            &self.rules.scores,
            lines,
            raw_tspin,
            kicked,
            self.figures.level,
        );
        self.figures.score += self.action.points.unwrap_or(0);
        self.figures.lines += lines as u32;
        debug!(
            lines,
            tspin = self.action.tspin,
            combo = ?self.action.combo,
            b2b = self.action.b2b,
            points = ?self.action.points,
            "lock scored"
        );

        match self.mode {
            GameMode::Marathon => {
                let level = scoring::marathon_level(self.figures.lines);
                if level > self.rules.marathon_max_level {
                    self.end_time = Some(self.now);
                } else if level > self.figures.level {
                    self.figures.level = level;
                    self.update_timings();
                    debug!(level, "level up");
                }
            }
            GameMode::Sprint => {
                if self.figures.lines >= self.rules.sprint_lines {
                    self.end_time = Some(self.now);
                }
            }
            GameMode::Ultra => {}
        }
    }

    /// Stop play: cancel timers, freeze the engine, schedule the result
    fn stop(&mut self) {
        if !self.is_running() {
            return;
        }
        self.phase = Phase::Finishing;
        self.scheduler.cancel_all();
        self.gravity_timer = None;
        self.lock_timer = None;
        self.engine.halt();
        self.signal = Some(ControllerSignal::Stop);
        info!(mode = %self.mode, score = self.figures.score, lines = self.figures.lines, "game stopped");
        self.presenter.on_stopped(self.engine.falling());
        let at = self.now + self.rules.game_over_ms();
        self.scheduler.schedule(at, TimerKind::Finish);
    }

    fn finish(&mut self) {
        if self.phase != Phase::Finishing {
            return;
        }
        self.phase = Phase::Over;
        let record = match self.mode {
            GameMode::Sprint if self.blocked_out => GameRecord::SprintTime(None),
            GameMode::Sprint => {
                GameRecord::SprintTime(self.end_time.map(|end| end - self.start_time))
            }
            GameMode::Marathon | GameMode::Ultra => GameRecord::Score(self.figures.score),
        };
        self.record = Some(record);
        info!(mode = %self.mode, ?record, "game over");
        self.presenter.on_game_over(self.mode, record);
    }
}
