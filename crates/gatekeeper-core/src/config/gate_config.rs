//! Per-gate tunables

use crate::error::{GateError, GateResult};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Default number of in-window failures that trips a gate
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
/// Default number of half-open successes that closes a gate
pub const DEFAULT_SUCCESS_THRESHOLD: u32 = 2;
/// Default time a gate stays open before admitting a probe
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
/// Default length of the rolling failure window
pub const DEFAULT_WINDOW_SIZE: Duration = Duration::from_secs(60);
/// Name used when none is given
pub const DEFAULT_GATE_NAME: &str = "default";

/// Configuration for a single gate
///
/// Durations are written in humantime form in configuration files
/// (`"30s"`, `"1m 30s"`, `"250ms"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Identifying label for logs and stats
    pub name: String,
    /// Failures inside the window that trip the gate
    pub failure_threshold: u32,
    /// Consecutive half-open successes that close the gate
    pub success_threshold: u32,
    /// How long the gate stays open before a probe is admitted
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Age after which a recorded failure stops counting
    #[serde(with = "humantime_serde")]
    pub window_size: Duration,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_GATE_NAME.to_string(),
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            success_threshold: DEFAULT_SUCCESS_THRESHOLD,
            timeout: DEFAULT_TIMEOUT,
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

impl GateConfig {
    /// Default configuration under the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Config for dependencies that should be cut off quickly
    pub fn aggressive(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            failure_threshold: 3,
            success_threshold: 2,
            timeout: Duration::from_secs(15),
            window_size: Duration::from_secs(30),
        }
    }

    /// Config for dependencies that are expected to be flaky
    pub fn lenient(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            failure_threshold: 10,
            success_threshold: 5,
            timeout: Duration::from_secs(60),
            window_size: Duration::from_secs(120),
        }
    }

    /// Set the name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the failure threshold
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Set the success threshold
    pub fn with_success_threshold(mut self, threshold: u32) -> Self {
        self.success_threshold = threshold;
        self
    }

    /// Set the open timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the rolling window size
    pub fn with_window_size(mut self, window_size: Duration) -> Self {
        self.window_size = window_size;
        self
    }

    /// Reject configurations the state machine cannot honour.
    ///
    /// A zero timeout is allowed: the gate then probes on the very next call.
    pub fn validate(&self) -> GateResult<()> {
        if self.name.trim().is_empty() {
            return Err(GateError::config("Gate name cannot be empty"));
        }
        if self.failure_threshold == 0 {
            return Err(GateError::config(format!(
                "failure_threshold must be greater than 0 for gate '{}'",
                self.name
            )));
        }
        if self.success_threshold == 0 {
            return Err(GateError::config(format!(
                "success_threshold must be greater than 0 for gate '{}'",
                self.name
            )));
        }
        if self.window_size.is_zero() {
            return Err(GateError::config(format!(
                "window_size must be greater than 0 for gate '{}'",
                self.name
            )));
        }
        if Instant::now().checked_add(self.timeout).is_none() {
            return Err(GateError::config(format!(
                "timeout {:?} is too large for gate '{}'",
                self.timeout, self.name
            )));
        }
        Ok(())
    }
}
