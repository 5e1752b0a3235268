//! Core game logic - pure, deterministic, and testable
//!
//! This crate contains the rules that do not depend on time: piece geometry,
//! the bag randomizer, the playfield, the move engine and the scoring state
//! machine. It has no dependencies on timers, terminals or I/O:
//!
//! - **Deterministic**: the same seed produces the same game
//! - **Testable**: every rule is a plain method call
//! - **Portable**: any driver (terminal, tests, headless) can run it
//!
//! # Module Structure
//!
//! - [`pieces`]: tetromino geometry and kick offset tables
//! - [`rng`]: seeded LCG and the 7-bag queue
//! - [`playfield`]: grid, collision test and line clearing
//! - [`move_engine`]: falling piece state machine, hold, charged operations
//! - [`scoring`]: combo, back-to-back, T-spin scoring and timing curves
//!
//! # Example
//!
//! ```
//! use srs_tetris_core::{FieldEvent, MoveEngine};
//! use srs_tetris_core::types::Point;
//!
//! let mut engine = MoveEngine::new(10, 22, Point::new(4, 20));
//! engine.start(12345);
//! engine.spawn();
//! assert!(engine.is_active());
//!
//! let rows = engine.hard_drop();
//! assert!(rows > 0);
//! let events: Vec<_> = std::iter::from_fn(|| engine.pop_event()).collect();
//! assert!(events.iter().any(|e| matches!(e, FieldEvent::PieceLocked { .. })));
//! ```

pub mod move_engine;
pub mod pieces;
pub mod playfield;
pub mod rng;
pub mod scoring;

pub use srs_tetris_types as types;

pub use move_engine::{ChargedOp, FieldEvent, Falling, MoveEngine, MoveKind};
pub use pieces::Tetromino;
pub use playfield::Playfield;
pub use rng::{Bag, SimpleRng};
pub use scoring::{ActionRecord, Figures, ScoreTable};
