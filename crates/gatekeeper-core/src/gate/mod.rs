//! Circuit breaker for unreliable dependencies
//!
//! A [`ProtectiveGate`] counts recent failures of one dependency in a rolling
//! window, fails fast once they reach a threshold, and probes for recovery
//! before admitting traffic again.

mod breaker;
mod ledger;
mod observer;
mod registry;
mod state_machine;
mod types;


pub use breaker::{GateBuilder, GatePermit, ProtectiveGate};
pub use observer::GateObserver;
pub use registry::GateRegistry;
pub use types::{GateState, GateStats, StatsReport, Transition};

#[cfg(test)]
pub(crate) use observer::MockGateObserver;
