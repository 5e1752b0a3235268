//! Virtual-key controller with auto-repeat.
//!
//! Each virtual key has its own pressed state. Pressing a key while its
//! opposite is held interrupts the opposite first. Shift keys repeat while
//! held: the first repeat fires `delay_ms` after the press, then one every
//! `1000 / frequency_hz` milliseconds.
//!
//! Soft drop is interruptible: the simulator may force-release it through
//! [`Controller::interrupt`]. An interrupted key stays held until its real
//! release, which then produces no further command.
//!
//! The controller never reads a clock itself; callers pass timestamps in
//! milliseconds and poll [`Controller::next_repeat_at`].

use arrayvec::ArrayVec;
use tracing::trace;

use crate::types::{Command, SHIFT_DELAY_MS, SHIFT_FREQUENCY_HZ};

/// Commands produced by a single key transition
pub type Commands = ArrayVec<Command, 4>;

/// Abstract keys understood by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VirtualKey {
    SoftDrop,
    HardDrop,
    ShiftLeft,
    ShiftRight,
    RotateLeft,
    RotateRight,
    Hold,
}

impl VirtualKey {
    pub const ALL: [VirtualKey; 7] = [
        VirtualKey::SoftDrop,
        VirtualKey::HardDrop,
        VirtualKey::ShiftLeft,
        VirtualKey::ShiftRight,
        VirtualKey::RotateLeft,
        VirtualKey::RotateRight,
        VirtualKey::Hold,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Command issued on press (and on every repeat)
    pub fn press_command(self) -> Command {
        match self {
            VirtualKey::SoftDrop => Command::SoftDropToggle,
            VirtualKey::HardDrop => Command::HardDrop,
            VirtualKey::ShiftLeft => Command::ShiftLeft,
            VirtualKey::ShiftRight => Command::ShiftRight,
            VirtualKey::RotateLeft => Command::RotateLeft,
            VirtualKey::RotateRight => Command::RotateRight,
            VirtualKey::Hold => Command::Hold,
        }
    }

    /// Command issued on release, if any
    pub fn release_command(self) -> Option<Command> {
        match self {
            VirtualKey::SoftDrop => Some(Command::SoftDropToggle),
            _ => None,
        }
    }

    /// Key released automatically when this one is pressed
    pub fn exclusive_with(self) -> Option<VirtualKey> {
        match self {
            VirtualKey::ShiftLeft => Some(VirtualKey::ShiftRight),
            VirtualKey::ShiftRight => Some(VirtualKey::ShiftLeft),
            VirtualKey::RotateLeft => Some(VirtualKey::RotateRight),
            VirtualKey::RotateRight => Some(VirtualKey::RotateLeft),
            _ => None,
        }
    }

    pub fn repeats(self) -> bool {
        matches!(self, VirtualKey::ShiftLeft | VirtualKey::ShiftRight)
    }

    pub fn interruptible(self) -> bool {
        matches!(self, VirtualKey::SoftDrop)
    }
}

/// Auto-repeat timing for repeating keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatTiming {
    pub delay_ms: u64,
    pub frequency_hz: u32,
}

impl Default for RepeatTiming {
    fn default() -> Self {
        Self {
            delay_ms: SHIFT_DELAY_MS,
            frequency_hz: SHIFT_FREQUENCY_HZ,
        }
    }
}

impl RepeatTiming {
    /// Offset of repeat `n` (0-based) from the press
    pub fn repeat_offset(&self, n: u64) -> u64 {
        self.delay_ms + (n * 1000).div_ceil(self.frequency_hz.max(1) as u64)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct KeyState {
    pressed: bool,
    interrupted: bool,
    pressed_at: u64,
    repeats_fired: u64,
}

/// Maps key transitions to commands
#[derive(Debug, Clone)]
pub struct Controller {
    timing: RepeatTiming,
    keys: [KeyState; 7],
    enabled: bool,
}

impl Controller {
    pub fn new(timing: RepeatTiming) -> Self {
        Self {
            timing,
            keys: [KeyState::default(); 7],
            enabled: false,
        }
    }

    /// Forget all key states and begin accepting input
    pub fn start(&mut self) {
        self.keys = [KeyState::default(); 7];
        self.enabled = true;
    }

    /// Ignore all input until the next [`Controller::start`]
    pub fn stop(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_pressed(&self, key: VirtualKey) -> bool {
        self.keys[key.index()].pressed
    }

    pub fn is_interrupted(&self, key: VirtualKey) -> bool {
        self.keys[key.index()].interrupted
    }

    /// A key went down at `now`
    pub fn key_down(&mut self, key: VirtualKey, now: u64) -> Commands {
        let mut out = Commands::new();
        if !self.enabled || self.keys[key.index()].pressed {
            return out;
        }
        if let Some(other) = key.exclusive_with() {
            if self.keys[other.index()].pressed {
                self.interrupt_key(other, &mut out);
            }
        }
        self.keys[key.index()] = KeyState {
            pressed: true,
            interrupted: false,
            pressed_at: now,
            repeats_fired: 0,
        };
        trace!(?key, now, "key down");
        out.push(key.press_command());
        out
    }

    /// A key went up; releases of keys that are not held are ignored
    pub fn key_up(&mut self, key: VirtualKey) -> Commands {
        let mut out = Commands::new();
        let state = self.keys[key.index()];
        if !self.enabled || !state.pressed {
            return out;
        }
        if !state.interrupted {
            if let Some(cmd) = key.release_command() {
                out.push(cmd);
            }
        }
        self.keys[key.index()] = KeyState::default();
        trace!(?key, "key up");
        out
    }

    /// Force-release every interruptible key that is still held
    pub fn interrupt(&mut self) -> Commands {
        let mut out = Commands::new();
        if !self.enabled {
            return out;
        }
        for key in VirtualKey::ALL {
            if key.interruptible() {
                self.interrupt_key(key, &mut out);
            }
        }
        out
    }

    fn interrupt_key(&mut self, key: VirtualKey, out: &mut Commands) {
        let state = &mut self.keys[key.index()];
        if !state.pressed || state.interrupted {
            return;
        }
        state.interrupted = true;
        trace!(?key, "key interrupted");
        if let Some(cmd) = key.release_command() {
            out.push(cmd);
        }
    }

    fn due_at(&self, key: VirtualKey) -> Option<u64> {
        let state = &self.keys[key.index()];
        if !key.repeats() || !state.pressed || state.interrupted {
            return None;
        }
        Some(state.pressed_at + self.timing.repeat_offset(state.repeats_fired))
    }

    /// Time of the earliest pending repeat
    pub fn next_repeat_at(&self) -> Option<u64> {
        if !self.enabled {
            return None;
        }
        VirtualKey::ALL.iter().filter_map(|&k| self.due_at(k)).min()
    }

    /// Fire the earliest repeat due at or before `now`
    pub fn fire_repeat(&mut self, now: u64) -> Option<Command> {
        if !self.enabled {
            return None;
        }
        let (key, at) = VirtualKey::ALL
            .iter()
            .filter_map(|&k| self.due_at(k).map(|at| (k, at)))
            .min_by_key(|&(_, at)| at)?;
        if at > now {
            return None;
        }
        self.keys[key.index()].repeats_fired += 1;
        trace!(?key, at, "key repeat");
        Some(key.press_command())
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(RepeatTiming::default())
    }
}
