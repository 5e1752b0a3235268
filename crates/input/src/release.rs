//! Synthetic key releases.
//!
//! Many terminals only report presses (and OS auto-repeat presses), never
//! releases. A held key keeps producing presses; once no press has been seen
//! for `timeout_ms`, the key is treated as released.

use arrayvec::ArrayVec;

use crate::controller::VirtualKey;

/// Default silence after which a key counts as released
pub const DEFAULT_RELEASE_TIMEOUT_MS: u64 = 150;

/// Tracks the last press of every virtual key
#[derive(Debug, Clone)]
pub struct SyntheticRelease {
    timeout_ms: u64,
    last_seen: [Option<u64>; 7],
}

impl SyntheticRelease {
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            timeout_ms,
            last_seen: [None; 7],
        }
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Record a press (or OS repeat) of `key` at `now`
    pub fn on_press(&mut self, key: VirtualKey, now: u64) {
        self.last_seen[key.index()] = Some(now);
    }

    /// Forget a key released by a real event
    pub fn on_release(&mut self, key: VirtualKey) {
        self.last_seen[key.index()] = None;
    }

    /// Keys whose presses went silent, in key order; they are forgotten
    pub fn expired(&mut self, now: u64) -> ArrayVec<VirtualKey, 7> {
        let mut out = ArrayVec::new();
        for key in VirtualKey::ALL {
            let slot = &mut self.last_seen[key.index()];
            if let Some(at) = *slot {
                if now.saturating_sub(at) > self.timeout_ms {
                    *slot = None;
                    out.push(key);
                }
            }
        }
        out
    }

    /// Earliest time a tracked key would expire
    pub fn next_expiry(&self) -> Option<u64> {
        self.last_seen
            .iter()
            .flatten()
            .map(|at| at + self.timeout_ms + 1)
            .min()
    }

    pub fn clear(&mut self) {
        self.last_seen = [None; 7];
    }
}

impl Default for SyntheticRelease {
    fn default() -> Self {
        Self::new(DEFAULT_RELEASE_TIMEOUT_MS)
    }
}
