//! Gate state machine
//!
//! Pure bookkeeping: every method takes "now" and the config explicitly and
//! reports the transition it performed, if any. Locking, logging and
//! observer fan-out live in [`ProtectiveGate`](super::ProtectiveGate).
//!
//! ```text
//! Closed   → Open:     pruned failures >= failure_threshold
//! Open     → HalfOpen: elapsed >= timeout, checked on the next admission
//! HalfOpen → Closed:   successes >= success_threshold
//! HalfOpen → Open:     any failure
//! any      → Closed:   reset
//! ```

use std::time::{Duration, Instant};

use super::ledger::FailureLedger;
use super::types::{GateState, GateStats, Transition};
use crate::config::GateConfig;

/// State plus the data that only exists in that state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    Closed,
    Open {
        opened_at: Instant,
    },
    HalfOpen {
        successes: u32,
    },
}

impl Phase {
    fn state(self) -> GateState {
        match self {
            Self::Closed => GateState::Closed,
            Self::Open { .. } => GateState::Open,
            Self::HalfOpen { .. } => GateState::HalfOpen,
        }
    }
}

/// Why an admission was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Rejection {
    pub(crate) opened_at: Instant,
    pub(crate) next_attempt_at: Instant,
    pub(crate) retry_after: Duration,
}

#[derive(Debug, Clone, Copy, Default)]
struct Totals {
    calls: u64,
    failures: u64,
    successes: u64,
    rejections: u64,
}

#[derive(Debug, Default)]
pub(crate) struct GateCore {
    phase: Phase,
    ledger: FailureLedger,
    last_failure_at: Option<Instant>,
    last_success_at: Option<Instant>,
    totals: Totals,
}

impl GateCore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn state(&self) -> GateState {
        self.phase.state()
    }

    /// Decide whether a call may run. Performs the lazy `Open → HalfOpen`
    /// transition once the timeout has elapsed.
    pub(crate) fn admit(
        &mut self,
        now: Instant,
        config: &GateConfig,
    ) -> Result<Option<Transition>, Rejection> {
        match self.phase {
            Phase::Closed | Phase::HalfOpen { .. } => Ok(None),
            Phase::Open { opened_at } => {
                let elapsed = now.saturating_duration_since(opened_at);
                if elapsed < config.timeout {
                    self.totals.rejections += 1;
                    let retry_after = config.timeout - elapsed;
                    // An unrepresentable deadline reports `now`; `retry_after` stays exact.
                    let next_attempt_at = opened_at.checked_add(config.timeout).unwrap_or(now);
                    return Err(Rejection {
                        opened_at,
                        next_attempt_at,
                        retry_after,
                    });
                }
                Ok(Some(self.enter(Phase::HalfOpen { successes: 0 }, now)))
            }
        }
    }

    pub(crate) fn record_success(
        &mut self,
        now: Instant,
        config: &GateConfig,
    ) -> Option<Transition> {
        self.last_success_at = Some(now);
        self.totals.calls += 1;
        self.totals.successes += 1;

        match self.phase {
            Phase::HalfOpen { successes } => {
                let successes = successes.saturating_add(1);
                if successes >= config.success_threshold {
                    self.ledger.clear();
                    Some(self.enter(Phase::Closed, now))
                } else {
                    self.phase = Phase::HalfOpen { successes };
                    None
                }
            }
            Phase::Closed => {
                self.ledger.prune(now, config.window_size);
                None
            }
            // Admitted before the trip, finished after it.
            Phase::Open { .. } => None,
        }
    }

    pub(crate) fn record_failure(
        &mut self,
        now: Instant,
        config: &GateConfig,
    ) -> Option<Transition> {
        self.last_failure_at = Some(now);
        self.totals.calls += 1;
        self.totals.failures += 1;

        match self.phase {
            Phase::HalfOpen { .. } => Some(self.enter(Phase::Open { opened_at: now }, now)),
            Phase::Closed => {
                self.ledger.record(now);
                self.ledger.prune(now, config.window_size);
                if self.ledger.len() >= config.failure_threshold as usize {
                    Some(self.enter(Phase::Open { opened_at: now }, now))
                } else {
                    None
                }
            }
            Phase::Open { .. } => None,
        }
    }

    /// Prune the ledger and snapshot. Never changes the state.
    pub(crate) fn snapshot(&mut self, now: Instant, config: &GateConfig) -> GateStats {
        self.ledger.prune(now, config.window_size);

        let (successes, opened_at) = match self.phase {
            Phase::Closed => (0, None),
            Phase::Open { opened_at } => (0, Some(opened_at)),
            Phase::HalfOpen { successes } => (successes, None),
        };

        GateStats {
            name: config.name.clone(),
            state: self.state(),
            failures: self.ledger.len(),
            successes,
            last_failure_at: self.last_failure_at,
            last_success_at: self.last_success_at,
            opened_at,
            next_attempt_at: opened_at.and_then(|at| at.checked_add(config.timeout)),
            total_calls: self.totals.calls,
            total_failures: self.totals.failures,
            total_successes: self.totals.successes,
            total_rejections: self.totals.rejections,
        }
    }

    /// Back to a fresh closed gate. Reports a transition only if the state changed.
    pub(crate) fn reset(&mut self, now: Instant) -> Option<Transition> {
        let from = self.state();
        *self = Self::new();
        (from != GateState::Closed).then_some(Transition {
            from,
            to: GateState::Closed,
            at: now,
        })
    }

    fn enter(&mut self, phase: Phase, now: Instant) -> Transition {
        let from = self.state();
        self.phase = phase;
        Transition {
            from,
            to: phase.state(),
            at: now,
        }
    }
}
