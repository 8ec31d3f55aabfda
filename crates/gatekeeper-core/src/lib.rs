//! Gatekeeper Core Library
//!
//! In-process circuit breaking for calls to unreliable dependencies:
//! the [`ProtectiveGate`] state machine, its configuration and loading,
//! and a [`GateRegistry`] holding one gate per dependency.

pub mod clock;
pub mod config;
pub mod error;
pub mod gate;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{GateConfig, GateOverrides, GatekeeperConfig};
pub use error::{CallError, GateError, GateOpenError, GateResult};
pub use gate::{
    GateBuilder, GateObserver, GatePermit, GateRegistry, GateState, GateStats, ProtectiveGate,
    StatsReport, Transition,
};
