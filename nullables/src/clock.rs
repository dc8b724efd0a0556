//! Nullable block clock — deterministic height and time for testing.

use scloud_types::{BlockClock, BlockHeight, Timestamp};
use std::cell::Cell;

/// A deterministic block clock for testing.
///
/// Height and time only advance when you tell them to.
pub struct NullClock {
    height: Cell<BlockHeight>,
    current: Cell<u64>,
}

impl NullClock {
    pub fn new(height: BlockHeight, initial_secs: u64) -> Self {
        Self {
            height: Cell::new(height),
            current: Cell::new(initial_secs),
        }
    }

    /// Move to the next block, `secs` seconds later.
    pub fn advance_block(&self, secs: u64) {
        self.height.set(self.height.get() + 1);
        self.current.set(self.current.get() + secs);
    }

    /// Advance time without producing a block.
    pub fn advance(&self, secs: u64) {
        self.current.set(self.current.get() + secs);
    }

    /// Set height and time to specific values.
    pub fn set(&self, height: BlockHeight, secs: u64) {
        self.height.set(height);
        self.current.set(secs);
    }
}

impl BlockClock for NullClock {
    fn height(&self) -> BlockHeight {
        self.height.get()
    }

    fn time(&self) -> Timestamp {
        Timestamp::new(self.current.get())
    }
}
