//! Broadcast epoch arithmetic.
//!
//! An epoch is a window of `interval` blocks. Broadcast heights are the
//! multiples of `interval`; control messages always target the *next* epoch.

/// Maps block heights to broadcast epochs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EpochCalculator {
    interval: u64,
}

impl EpochCalculator {
    /// Creates a calculator. `interval` must be at least 2; config validation
    /// enforces this before a calculator is built.
    pub fn new(interval: u64) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }

    /// Ordinal of the epoch containing `height`.
    pub fn epoch_of(&self, height: u64) -> u64 {
        height / self.interval
    }

    /// Epoch that messages sent at `height` must target.
    pub fn next_epoch(&self, height: u64) -> u64 {
        self.epoch_of(height) + 1
    }

    /// Returns true if `height` is a broadcast (epoch boundary) height.
    pub fn is_broadcast_height(&self, height: u64) -> bool {
        height % self.interval == 0
    }

    /// The next scheduled broadcast height at or after `height`.
    ///
    /// `None` if that height does not fit in a `u64`.
    pub fn next_broadcast_height(&self, height: u64) -> Option<u64> {
        if self.is_broadcast_height(height) {
            Some(height)
        } else {
            self.next_epoch(height).checked_mul(self.interval)
        }
    }

    /// Modulus for deterministic heartbeat selection.
    pub fn heartbeat_modulus(&self) -> u64 {
        self.interval - 1
    }
}
