//! Block time and height.
//!
//! Timestamps are Unix epoch seconds taken from the block header, never from the
//! local wall clock: every timer in the ledger is a block-time delta so replay is
//! bit-identical on every node.

use serde::{Deserialize, Serialize};
use std::fmt;

pub type BlockHeight = u64;

/// A Unix timestamp in seconds since epoch (UTC), as agreed in a block header.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    pub const fn new(secs: u64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// This timestamp shifted forward by `secs`, saturating at `u64::MAX`.
    pub fn plus_secs(&self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    /// Seconds elapsed since this timestamp (relative to `now`).
    pub fn elapsed_since(&self, now: Timestamp) -> u64 {
        now.0.saturating_sub(self.0)
    }

    /// Whether this timestamp + duration has passed relative to `now`.
    pub fn has_expired(&self, duration_secs: u64, now: Timestamp) -> bool {
        now.0 >= self.0.saturating_add(duration_secs)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

/// Height and time of the block currently being executed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub height: BlockHeight,
    pub time: Timestamp,
}

impl BlockInfo {
    pub fn new(height: BlockHeight, time: Timestamp) -> Self {
        Self { height, time }
    }
}

/// Source of block height and time, driven by the consensus layer.
///
/// Monotonic and identical on every node.
pub trait BlockClock {
    fn height(&self) -> BlockHeight;
    fn time(&self) -> Timestamp;

    fn info(&self) -> BlockInfo {
        BlockInfo::new(self.height(), self.time())
    }
}
