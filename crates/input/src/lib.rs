//! Input module (engine-facing).
//!
//! Turns key presses and releases into simulator [`Command`]s:
//!
//! - [`controller`]: virtual keys with auto-repeat, mutual exclusion and
//!   interruption, driven by explicit timestamps
//! - [`map`]: `crossterm` key codes to virtual keys
//! - [`release`]: synthetic key releases for terminals that never report them
//!
//! [`Command`]: crate::types::Command

pub mod controller;
pub mod map;
pub mod release;

pub use srs_tetris_types as types;

pub use controller::{Controller, RepeatTiming, VirtualKey};
pub use map::{is_restart, should_quit, virtual_key};
pub use release::SyntheticRelease;
