//! Shared helpers for gatekeeper integration tests

#![allow(dead_code)]

use gatekeeper_core::{GateObserver, GateOpenError, GateState, Transition};
use parking_lot::Mutex;

/// Install a test-writer subscriber once per test binary
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatekeeper_core=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Observer that remembers everything it was told
#[derive(Default)]
pub struct RecordingObserver {
    transitions: Mutex<Vec<(GateState, GateState)>>,
    rejections: Mutex<Vec<GateOpenError>>,
}

impl RecordingObserver {
    pub fn transitions(&self) -> Vec<(GateState, GateState)> {
        self.transitions.lock().clone()
    }

    pub fn rejections(&self) -> usize {
        self.rejections.lock().len()
    }
}

impl GateObserver for RecordingObserver {
    fn on_transition(&self, _gate: &str, transition: &Transition) {
        self.transitions.lock().push((transition.from, transition.to));
    }

    fn on_rejected(&self, _gate: &str, rejection: &GateOpenError) {
        self.rejections.lock().push(rejection.clone());
    }
}
