//! SRS Tetris (workspace facade crate).
//!
//! Re-exports the workspace crates under one roof:
//! `srs_tetris::{types, core, engine, input, term}`. The implementation lives
//! in dedicated crates under `crates/`.

pub mod config;

pub use srs_tetris_core as core;
pub use srs_tetris_engine as engine;
pub use srs_tetris_input as input;
pub use srs_tetris_term as term;
pub use srs_tetris_types as types;

pub use config::AppConfig;
