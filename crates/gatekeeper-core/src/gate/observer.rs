//! Hooks for external sinks that want to follow gate activity

use super::types::Transition;
use crate::error::GateOpenError;

/// Receives gate events.
///
/// Called after the gate's lock has been released, in registration order,
/// on the task that caused the event. Implementations should return quickly.
#[cfg_attr(test, mockall::automock)]
pub trait GateObserver: Send + Sync {
    /// The gate named `gate` changed state
    fn on_transition(&self, gate: &str, transition: &Transition);

    /// The gate named `gate` turned a call away
    fn on_rejected(&self, gate: &str, rejection: &GateOpenError) {
        let _ = (gate, rejection);
    }
}
