//! Scoring module - lock scoring, combo and back-to-back chain
//!
//! Scoring rules for one lock, given the lines cleared, the raw T-spin flag
//! and whether the last rotation needed a kick:
//! - a raw T-spin only scores as a T-spin if it was not kicked, or it cleared
//!   exactly three lines
//! - a clear is "difficult" when it is a tetris or a T-spin
//! - combo is `None` after a lock without lines, 0 on the first clear of a
//!   chain and grows by one with every further clear
//! - back-to-back applies the 3/2 multiplier to the base points (never to the
//!   combo bonus) when the chain is ready, the clear is difficult and at least
//!   one line was cleared
//! - points = (base x b2b + combo x combo points) x level

use serde::{Deserialize, Serialize};

use crate::types::{
    B2B_DENOMINATOR, B2B_NUMERATOR, COMBO_POINTS, HARD_DROP_POINTS, NORMAL_SCORES,
    SOFT_DROP_POINTS, TSPIN_SCORES,
};

/// Point values used by the scoring engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreTable {
    /// Base points indexed by lines cleared (0..=4)
    pub normal: [u32; 5],
    /// T-spin base points indexed by lines cleared (0..=3)
    pub tspin: [u32; 5],
    pub combo: u32,
    pub soft_drop: u32,
    pub hard_drop: u32,
    /// Back-to-back multiplier as a ratio, 3/2 by default
    ///
    /// Applied in integer arithmetic, so an odd base value under the default
    /// ratio rounds down (a configured 101 becomes 151).
    pub b2b_numerator: u32,
    pub b2b_denominator: u32,
}

impl Default for ScoreTable {
    fn default() -> Self {
        Self {
            normal: NORMAL_SCORES,
            tspin: TSPIN_SCORES,
            combo: COMBO_POINTS,
            soft_drop: SOFT_DROP_POINTS,
            hard_drop: HARD_DROP_POINTS,
            b2b_numerator: B2B_NUMERATOR,
            b2b_denominator: B2B_DENOMINATOR,
        }
    }
}

impl ScoreTable {
    /// Apply the back-to-back multiplier to a point value
    pub fn apply_b2b(&self, points: u64) -> u64 {
        points.saturating_mul(self.b2b_numerator as u64) / self.b2b_denominator.max(1) as u64
    }

    /// Base points for a clear
    pub fn base(&self, lines: usize, tspin: bool) -> u64 {
        let table = if tspin { &self.tspin } else { &self.normal };
        table.get(lines).copied().unwrap_or(0) as u64
    }
}

/// Per-game counters shown to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Figures {
    pub level: u32,
    pub lines: u32,
    pub score: u64,
}

impl Default for Figures {
    fn default() -> Self {
        Self {
            level: 1,
            lines: 0,
            score: 0,
        }
    }
}

/// Result of the most recent lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionRecord {
    pub line_clear: u32,
    pub tspin: bool,
    pub combo: Option<u32>,
    pub b2b: bool,
    pub b2b_ready: bool,
    pub points: Option<u64>,
}

/// Whether a raw T-spin scores as a T-spin
pub fn is_tspin(lines: usize, raw_tspin: bool, kicked: bool) -> bool {
    raw_tspin && (!kicked || lines == 3)
}

/// Tetrises and T-spins keep the back-to-back chain alive
pub fn is_difficult(lines: usize, raw_tspin: bool, kicked: bool) -> bool {
    lines == 4 || is_tspin(lines, raw_tspin, kicked)
}

impl ActionRecord {
    /// Score one lock and advance the combo and back-to-back state
    ///
    /// `self` is the record of the previous lock; the returned record replaces
    /// it. Points are computed with the level in effect before the lock.
    pub fn record_lock(
        &self,
        table: &ScoreTable,
        lines: usize,
        raw_tspin: bool,
        kicked: bool,
        level: u32,
    ) -> ActionRecord {
        let tspin = is_tspin(lines, raw_tspin, kicked);
        let difficult = is_difficult(lines, raw_tspin, kicked);
        let combo = if lines == 0 {
            None
        } else {
            Some(self.combo.map_or(0, |c| c + 1))
        };
        let b2b = self.b2b_ready && difficult && lines > 0;

        let base = table.base(lines, tspin);
        let base = if b2b { table.apply_b2b(base) } else { base };
        let combo_bonus = combo.unwrap_or(0) as u64 * table.combo as u64;
        let points = (base + combo_bonus).saturating_mul(level as u64);

        ActionRecord {
            line_clear: lines as u32,
            tspin,
            combo,
            b2b,
            b2b_ready: difficult || (self.b2b_ready && lines == 0),
            points: (points > 0).then_some(points),
        }
    }
}

/// Marathon level for a total line count
pub fn marathon_level(total_lines: u32) -> u32 {
    total_lines / 10 + 1
}

/// Gravity in rows per tick at `level`
///
/// Grows slowly at low levels: about 1/60 G at level 1, 1 G near level 13.
pub fn gravity_per_tick(level: u32, ticks_per_second: u32) -> f64 {
    let n = level.saturating_sub(1) as f64;
    let t = (0.8 - n * 0.007).powf(n);
    1.0 / t / ticks_per_second.max(1) as f64
}

/// Lock delay in milliseconds at `level`, never below `floor_ms`
pub fn lock_delay_ms(level: u32, base_ms: u64, per_level_ms: u64, floor_ms: u64) -> u64 {
    base_ms
        .saturating_sub(per_level_ms.saturating_mul(level as u64))
        .max(floor_ms)
}

/// Drop bonus for `rows` rows at `points_per_row`
pub fn drop_score(rows: u32, points_per_row: u32) -> u64 {
    rows as u64 * points_per_row as u64
}
