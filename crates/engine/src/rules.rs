//! Game rules configuration.
//!
//! Every tunable constant of a game lives in [`Rules`]. The defaults
//! reproduce the guideline values; overrides are read from JSON, where any
//! missing field keeps its default.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::core::scoring::{self, ScoreTable};
use crate::types::{
    Point, BUFFER_ROWS, DEFAULT_COLS, DEFAULT_ROWS, GAME_OVER_FRAMES, INFINITY_LIMIT,
    LINE_CLEAR_FRAMES, LOCK_DELAY_BASE_MS, LOCK_DELAY_FLOOR_MS, LOCK_DELAY_PER_LEVEL_MS,
    MARATHON_MAX_LEVEL, SHIFT_DELAY_MS, SHIFT_FREQUENCY_HZ, SOFT_DROP_ROWS_PER_TICK,
    SPAWN_POINT, SPRINT_LINES, TICKS_PER_SECOND, ULTRA_SECONDS,
};

/// Largest field height that keeps every coordinate inside `i8`
const MAX_ROWS: u8 = 100;

/// Smallest field width that fits every piece in every rotation
const MIN_COLS: u8 = 4;

/// Largest field width that keeps every column inside `i8`
const MAX_COLS: u8 = 100;

/// Errors raised while loading or checking rules
#[derive(Debug, Error)]
pub enum RulesError {
    #[error("failed to read rules file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse rules: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid rules: {0}")]
    Invalid(String),
}

/// Tunable game constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    pub cols: u8,
    /// Visible rows; the field has `BUFFER_ROWS` more above them
    pub rows: u8,
    pub spawn: Point,
    pub ticks_per_second: u32,
    pub soft_drop_rows_per_tick: f64,
    pub lock_delay_base_ms: u64,
    pub lock_delay_per_level_ms: u64,
    pub lock_delay_floor_ms: u64,
    pub infinity_limit: u32,
    pub line_clear_frames: u32,
    pub game_over_frames: u32,
    pub scores: ScoreTable,
    pub marathon_max_level: u32,
    pub ultra_seconds: u64,
    pub sprint_lines: u32,
    pub shift_delay_ms: u64,
    pub shift_frequency_hz: u32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            cols: DEFAULT_COLS,
            rows: DEFAULT_ROWS,
            spawn: SPAWN_POINT,
            ticks_per_second: TICKS_PER_SECOND,
            soft_drop_rows_per_tick: SOFT_DROP_ROWS_PER_TICK,
            lock_delay_base_ms: LOCK_DELAY_BASE_MS,
            lock_delay_per_level_ms: LOCK_DELAY_PER_LEVEL_MS,
            lock_delay_floor_ms: LOCK_DELAY_FLOOR_MS,
            infinity_limit: INFINITY_LIMIT,
            line_clear_frames: LINE_CLEAR_FRAMES,
            game_over_frames: GAME_OVER_FRAMES,
            scores: ScoreTable::default(),
            marathon_max_level: MARATHON_MAX_LEVEL,
            ultra_seconds: ULTRA_SECONDS,
            sprint_lines: SPRINT_LINES,
            shift_delay_ms: SHIFT_DELAY_MS,
            shift_frequency_hz: SHIFT_FREQUENCY_HZ,
        }
    }
}

impl Rules {
    /// Parse rules from JSON and validate them
    pub fn from_json_str(json: &str) -> Result<Self, RulesError> {
        let rules: Rules = serde_json::from_str(json)?;
        rules.validate()?;
        Ok(rules)
    }

    /// Read rules from a JSON file and validate them
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RulesError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| RulesError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Reject values the simulator cannot run with
    pub fn validate(&self) -> Result<(), RulesError> {
        let problem = if self.cols < MIN_COLS || self.cols > MAX_COLS {
            Some(format!("cols must be in {MIN_COLS}..={MAX_COLS}, got {}", self.cols))
        } else if self.rows == 0 || self.rows > MAX_ROWS {
            Some(format!("rows must be in 1..={MAX_ROWS}, got {}", self.rows))
        } else if self.spawn.x < 0 || self.spawn.x as u8 >= self.cols {
            Some(format!("spawn column {} is outside the field", self.spawn.x))
        } else if self.spawn.y < 0 || self.spawn.y as u8 >= self.height() {
            Some(format!("spawn row {} is outside the field", self.spawn.y))
        } else if self.ticks_per_second == 0 {
            Some("ticks_per_second must be positive".to_string())
        } else if !(self.soft_drop_rows_per_tick > 0.0) {
            Some("soft_drop_rows_per_tick must be positive".to_string())
        } else if self.shift_frequency_hz == 0 {
            Some("shift_frequency_hz must be positive".to_string())
        } else if self.scores.b2b_denominator == 0 {
            Some("scores.b2b_denominator must be positive".to_string())
        } else if self.marathon_max_level == 0 {
            Some("marathon_max_level must be positive".to_string())
        } else {
            None
        };
        match problem {
            Some(msg) => {
                warn!(%msg, "rejected rules");
                Err(RulesError::Invalid(msg))
            }
            None => Ok(()),
        }
    }

    /// Visible rows plus buffer rows
    pub fn height(&self) -> u8 {
        self.rows.saturating_add(BUFFER_ROWS)
    }

    /// Duration of `frames` frames, rounded up to whole milliseconds
    pub fn frames_to_ms(&self, frames: u32) -> u64 {
        (frames as u64 * 1000).div_ceil(self.ticks_per_second.max(1) as u64)
    }

    /// Offset of gravity tick `k` from the start of a fall
    pub fn tick_offset_ms(&self, k: u64) -> u64 {
        (k * 1000).div_ceil(self.ticks_per_second.max(1) as u64)
    }

    pub fn line_clear_ms(&self) -> u64 {
        self.frames_to_ms(self.line_clear_frames)
    }

    pub fn game_over_ms(&self) -> u64 {
        self.frames_to_ms(self.game_over_frames)
    }

    pub fn gravity_per_tick(&self, level: u32) -> f64 {
        scoring::gravity_per_tick(level, self.ticks_per_second)
    }

    pub fn lock_delay_ms(&self, level: u32) -> u64 {
        scoring::lock_delay_ms(
            level,
            self.lock_delay_base_ms,
            self.lock_delay_per_level_ms,
            self.lock_delay_floor_ms,
        )
    }
}
