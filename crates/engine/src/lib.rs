//! Game engine - time, rules and modes on top of the core
//!
//! The core crate knows where pieces are; this crate knows when things
//! happen. Nothing here reads a clock except [`SystemClock`], so every game
//! can be replayed exactly with a [`ManualClock`].
//!
//! # Module Structure
//!
//! - [`rules`]: tunable constants, loaded from JSON
//! - [`clock`]: millisecond time sources
//! - [`scheduler`]: deterministic timer queue
//! - [`presenter`]: notification trait and game results
//! - [`simulator`]: gravity, lock delay, scoring and game modes
//! - [`session`]: simulator plus controller plus clock

pub mod clock;
pub mod presenter;
pub mod rules;
pub mod scheduler;
pub mod session;
pub mod simulator;

pub use srs_tetris_core as core;
pub use srs_tetris_input as input;
pub use srs_tetris_types as types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use presenter::{GameRecord, GameSummary, NullPresenter, Presenter};
pub use rules::{Rules, RulesError};
pub use scheduler::{Scheduler, TimerId};
pub use session::Session;
pub use simulator::{ControllerSignal, Phase, Simulator, TimerKind};
