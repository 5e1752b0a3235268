//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the workspace.
//! Everything here is plain data: piece kinds, rotation states, grid points,
//! game modes, abstract commands and the default rule constants.
//!
//! # Coordinates
//!
//! The playfield uses a y-up coordinate system:
//!
//! - **x**: column, `0` is the leftmost column
//! - **y**: row, `0` is the bottom row
//! - Four buffer rows sit above the visible field so pieces can spawn there
//!
//! # Default Rule Constants
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `DEFAULT_COLS` | 10 | Playfield width |
//! | `DEFAULT_ROWS` | 22 | Visible playfield height |
//! | `BUFFER_ROWS` | 4 | Extra rows above the visible field |
//! | `TICKS_PER_SECOND` | 60 | Gravity tick rate |
//! | `SOFT_DROP_ROWS_PER_TICK` | 0.5 | Soft drop speed |
//! | `LOCK_DELAY_BASE_MS` | 725 | Lock delay before the level adjustment |
//! | `LOCK_DELAY_PER_LEVEL_MS` | 10 | Lock delay reduction per level |
//! | `INFINITY_LIMIT` | 24 | Grounded moves allowed per row |
//! | `GAME_OVER_FRAMES` | 120 | Game-over presentation delay |
//!
//! # Examples
//!
//! ```
//! use srs_tetris_types::{GameMode, PieceKind, Point, Rotation};
//!
//! let mode: GameMode = "sprint".parse().unwrap();
//! assert_eq!(mode, GameMode::Sprint);
//!
//! assert_eq!(PieceKind::from_str("t"), Some(PieceKind::T));
//! assert_eq!(Rotation::North.rotate_cw(), Rotation::East);
//! assert_eq!(Point::new(4, 20).add_y(-1), Point::new(4, 19));
//! ```

use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Playfield width in cells (10 columns)
pub const DEFAULT_COLS: u8 = 10;

/// Visible playfield height in cells (22 rows)
pub const DEFAULT_ROWS: u8 = 22;

/// Rows kept above the visible field for spawn clearance
pub const BUFFER_ROWS: u8 = 4;

/// Anchor point where new pieces appear
pub const SPAWN_POINT: Point = Point::new(4, 20);

/// Gravity ticks per second
pub const TICKS_PER_SECOND: u32 = 60;

/// Soft drop speed in rows per tick (0.5 G)
pub const SOFT_DROP_ROWS_PER_TICK: f64 = 0.5;

/// Lock delay at level 0, in milliseconds
pub const LOCK_DELAY_BASE_MS: u64 = 725;

/// Lock delay reduction for every level, in milliseconds
pub const LOCK_DELAY_PER_LEVEL_MS: u64 = 10;

/// Lock delay never drops below this value
pub const LOCK_DELAY_FLOOR_MS: u64 = 100;

/// Landed-without-locking events allowed on one row before a forced lock
pub const INFINITY_LIMIT: u32 = 24;

/// Pause between a line clear and the next spawn, in frames
pub const LINE_CLEAR_FRAMES: u32 = 0;

/// Delay between the end of a game and the final result, in frames
pub const GAME_OVER_FRAMES: u32 = 120;

/// Line clear base points, indexed by lines cleared
pub const NORMAL_SCORES: [u32; 5] = [0, 100, 300, 500, 800];

/// T-spin base points, indexed by lines cleared (index 0 = T-spin no lines)
pub const TSPIN_SCORES: [u32; 5] = [400, 800, 1200, 1600, 0];

/// Points per combo step
pub const COMBO_POINTS: u32 = 50;

/// Points per row of player-held soft drop
pub const SOFT_DROP_POINTS: u32 = 1;

/// Points per row of hard drop
pub const HARD_DROP_POINTS: u32 = 2;

/// Back-to-back bonus numerator (3/2 = 1.5x multiplier)
pub const B2B_NUMERATOR: u32 = 3;

/// Back-to-back bonus denominator
pub const B2B_DENOMINATOR: u32 = 2;

/// Highest reachable marathon level; clearing past it ends the game
pub const MARATHON_MAX_LEVEL: u32 = 15;

/// Ultra mode countdown, in seconds
pub const ULTRA_SECONDS: u64 = 180;

/// Lines to clear in sprint mode
pub const SPRINT_LINES: u32 = 40;

/// Delay before a held shift key starts repeating, in milliseconds
pub const SHIFT_DELAY_MS: u64 = 150;

/// Shift auto-repeat frequency, in repeats per second
pub const SHIFT_FREQUENCY_HZ: u32 = 30;

/// The seven tetromino piece kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PieceKind {
    I,
    J,
    L,
    O,
    S,
    T,
    Z,
}

impl PieceKind {
    /// All kinds, in the order a fresh bag is filled before shuffling.
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::J,
        PieceKind::L,
        PieceKind::O,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::T,
    ];

    /// Stable table index (I=0 .. Z=6)
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Parse piece kind from string (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use srs_tetris_types::PieceKind;
    ///
    /// assert_eq!(PieceKind::from_str("i"), Some(PieceKind::I));
    /// assert_eq!(PieceKind::from_str("O"), Some(PieceKind::O));
    /// assert_eq!(PieceKind::from_str("unknown"), None);
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "i" => Some(PieceKind::I),
            "j" => Some(PieceKind::J),
            "l" => Some(PieceKind::L),
            "o" => Some(PieceKind::O),
            "s" => Some(PieceKind::S),
            "t" => Some(PieceKind::T),
            "z" => Some(PieceKind::Z),
            _ => None,
        }
    }

    /// Single uppercase letter used for display
    pub fn as_str(&self) -> &'static str {
        match self {
            PieceKind::I => "I",
            PieceKind::J => "J",
            PieceKind::L => "L",
            PieceKind::O => "O",
            PieceKind::S => "S",
            PieceKind::T => "T",
            PieceKind::Z => "Z",
        }
    }
}

/// Rotation states, North being the spawn orientation
///
/// The rotation cycle goes: North → East → South → West → North
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rotation {
    North,
    East,
    South,
    West,
}

impl Rotation {
    /// Rotate clockwise (90°)
    ///
    /// ```
    /// use srs_tetris_types::Rotation;
    ///
    /// assert_eq!(Rotation::West.rotate_cw(), Rotation::North);
    /// ```
    pub fn rotate_cw(&self) -> Self {
        match self {
            Rotation::North => Rotation::East,
            Rotation::East => Rotation::South,
            Rotation::South => Rotation::West,
            Rotation::West => Rotation::North,
        }
    }

    /// Rotate counter-clockwise (-90°)
    ///
    /// ```
    /// use srs_tetris_types::Rotation;
    ///
    /// assert_eq!(Rotation::North.rotate_ccw(), Rotation::West);
    /// ```
    pub fn rotate_ccw(&self) -> Self {
        match self {
            Rotation::North => Rotation::West,
            Rotation::West => Rotation::South,
            Rotation::South => Rotation::East,
            Rotation::East => Rotation::North,
        }
    }

    /// Apply a turn in the given direction
    pub fn turn(&self, turn: Turn) -> Self {
        match turn {
            Turn::Left => self.rotate_ccw(),
            Turn::Right => self.rotate_cw(),
        }
    }

    /// Number of clockwise quarter turns from North (0..=3)
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Direction of a rotation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Turn {
    Left,
    Right,
}

/// Integer grid coordinate (x = column, y = row counted from the bottom)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i8,
    pub y: i8,
}

impl Point {
    pub const fn new(x: i8, y: i8) -> Self {
        Self { x, y }
    }

    pub const fn add_x(self, dx: i8) -> Self {
        Self::new(self.x + dx, self.y)
    }

    pub const fn add_y(self, dy: i8) -> Self {
        Self::new(self.x, self.y + dy)
    }

    /// Quarter turn clockwise around the origin: (x, y) -> (y, -x)
    pub const fn rotate_right(self) -> Self {
        Self::new(self.y, -self.x)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Session game mode, fixed from `start` until game over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// Endless play with increasing levels, ends past the maximum level
    Marathon,
    /// Score attack against a countdown
    Ultra,
    /// Race to a fixed number of cleared lines
    Sprint,
}

impl GameMode {
    pub const ALL: [GameMode; 3] = [GameMode::Marathon, GameMode::Ultra, GameMode::Sprint];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Marathon => "marathon",
            GameMode::Ultra => "ultra",
            GameMode::Sprint => "sprint",
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected game mode name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown game mode: {0:?}")]
pub struct ParseGameModeError(pub String);

impl std::str::FromStr for GameMode {
    type Err = ParseGameModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "marathon" => Ok(GameMode::Marathon),
            "ultra" => Ok(GameMode::Ultra),
            "sprint" => Ok(GameMode::Sprint),
            _ => Err(ParseGameModeError(s.to_string())),
        }
    }
}

/// Abstract commands accepted by the simulator
///
/// These are produced by the input controller (or any other driver) and
/// map one-to-one onto the simulator's command methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Move the falling piece one column left
    ShiftLeft,
    /// Move the falling piece one column right
    ShiftRight,
    /// Rotate 90° counter-clockwise (buffered if no piece is falling)
    RotateLeft,
    /// Rotate 90° clockwise (buffered if no piece is falling)
    RotateRight,
    /// Flip the player-held soft drop state
    SoftDropToggle,
    /// Drop to the ghost position and lock immediately
    HardDrop,
    /// Swap with the hold slot (buffered if no piece is falling)
    Hold,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::ShiftLeft => "shiftLeft",
            Command::ShiftRight => "shiftRight",
            Command::RotateLeft => "rotateLeft",
            Command::RotateRight => "rotateRight",
            Command::SoftDropToggle => "softDropToggle",
            Command::HardDrop => "hardDrop",
            Command::Hold => "hold",
        }
    }
}

/// A cell on the playfield
///
/// - `None`: Empty cell
/// - `Some(PieceKind)`: Cell filled by a locked piece of that kind
pub type Cell = Option<PieceKind>;
