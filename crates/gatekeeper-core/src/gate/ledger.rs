//! Rolling window of failure timestamps

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Failure timestamps in arrival order.
///
/// Entries whose age has reached the window size are dropped by [`prune`],
/// so the ledger length after pruning is the number of failures that still
/// count toward tripping.
///
/// [`prune`]: FailureLedger::prune
#[derive(Debug, Clone, Default)]
pub(crate) struct FailureLedger {
    entries: VecDeque<Instant>,
}

impl FailureLedger {
    pub(crate) fn record(&mut self, at: Instant) {
        self.entries.push_back(at);
    }

    /// Drop every entry at least `window` old as of `now`
    pub(crate) fn prune(&mut self, now: Instant, window: Duration) {
        // Timestamps come from a monotonic clock, so the oldest entries are at the front.
        while let Some(&oldest) = self.entries.front() {
            if now.saturating_duration_since(oldest) >= window {
                self.entries.pop_front();
            } else {
                break;
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
