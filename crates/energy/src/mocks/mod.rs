//! Mock implementations for testing
//!
//! Host-side stand-ins for the hardware pieces the arbiter talks to.

#![cfg(any(test, feature = "std"))]

use crate::mode::SleepDepth;
use crate::sleep::SleepBackend;

/// Mock sleep backend that records every sleep entry instead of halting.
pub struct MockSleep {
    entries: heapless::Vec<SleepDepth, 64>,
}

impl MockSleep {
    /// Create a new mock with no recorded entries.
    pub fn new() -> Self {
        Self {
            entries: heapless::Vec::new(),
        }
    }

    /// Every recorded sleep entry, oldest first (up to 64).
    pub fn entries(&self) -> &[SleepDepth] {
        &self.entries
    }

    /// Most recent sleep entry.
    pub fn last(&self) -> Option<SleepDepth> {
        self.entries.last().copied()
    }

    /// Number of recorded entries.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Forget every recorded entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for MockSleep {
    fn default() -> Self {
        Self::new()
    }
}

impl SleepBackend for MockSleep {
    fn enter(&mut self, depth: SleepDepth) {
        // Store entries for verification
        if self.entries.len() < self.entries.capacity() {
            let _ = self.entries.push(depth);
        }
    }
}
