//! Terminal "game renderer" module.
//!
//! A small, game-oriented rendering layer for terminal play. It renders into
//! a plain framebuffer that is then flushed to the terminal, instead of going
//! through a widget toolkit.
//!
//! - [`view_model`]: presenter that mirrors simulator notifications
//! - [`game_view`]: pure view model to framebuffer mapping
//! - [`renderer`]: full and diff flushing through `crossterm`

pub mod fb;
pub mod game_view;
pub mod renderer;
pub mod view_model;

pub use srs_tetris_core as core;
pub use srs_tetris_engine as engine;
pub use srs_tetris_types as types;

pub use fb::{Cell, CellStyle, FrameBuffer, Rgb};
pub use game_view::{action_text, clock_text, record_text, GameView, Viewport};
pub use renderer::{encode_diff_into, encode_full_into, TerminalRenderer};
pub use view_model::{TermPresenter, ViewModel};
