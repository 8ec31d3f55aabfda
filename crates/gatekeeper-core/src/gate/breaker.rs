//! Protective gate implementation

use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use super::observer::GateObserver;
use super::state_machine::{GateCore, Rejection};
use super::types::{GateState, GateStats, Transition, millis};
use crate::clock::{Clock, SystemClock};
use crate::config::GateConfig;
use crate::error::{CallError, GateOpenError, GateResult};

/// Circuit breaker guarding one logical dependency.
///
/// Share it (usually behind an `Arc`) between every caller of that
/// dependency. All bookkeeping happens under a single lock that is never
/// held while the protected operation runs.
pub struct ProtectiveGate {
    config: GateConfig,
    core: Mutex<GateCore>,
    clock: Arc<dyn Clock>,
    observers: Vec<Arc<dyn GateObserver>>,
}

impl fmt::Debug for ProtectiveGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtectiveGate")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl ProtectiveGate {
    /// Create a gate on the system clock
    pub fn new(config: GateConfig) -> GateResult<Self> {
        Self::builder(config).build()
    }

    /// Create a gate with default tunables
    pub fn with_defaults(name: impl Into<String>) -> GateResult<Self> {
        Self::new(GateConfig::new(name))
    }

    /// Start building a gate with a custom clock or observers
    pub fn builder(config: GateConfig) -> GateBuilder {
        GateBuilder {
            config,
            clock: Arc::new(SystemClock),
            observers: Vec::new(),
        }
    }

    /// Get the gate name
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Get the configuration
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Current state, without pruning or timeout checks
    pub fn state(&self) -> GateState {
        self.core.lock().state()
    }

    /// Run `operation` if the gate admits it.
    ///
    /// Returns [`CallError::Rejected`] without calling `operation` while the
    /// gate is open, and [`CallError::Operation`] with the operation's own
    /// error when it fails. If the returned future is dropped while the
    /// operation is in flight, the call counts as a failure.
    pub async fn execute<T, E, F, Fut>(&self, operation: F) -> Result<T, CallError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let permit = self.try_acquire()?;

        match operation().await {
            Ok(value) => {
                permit.record_success();
                Ok(value)
            }
            Err(error) => {
                permit.record_failure();
                Err(CallError::Operation(error))
            }
        }
    }

    /// Make the admission decision on its own.
    ///
    /// The returned permit must be resolved with
    /// [`record_success`](GatePermit::record_success) or
    /// [`record_failure`](GatePermit::record_failure); dropping it unresolved
    /// records a failure.
    pub fn try_acquire(&self) -> Result<GatePermit<'_>, GateOpenError> {
        let now = self.clock.now();
        let admitted = self.core.lock().admit(now, &self.config);

        match admitted {
            Ok(transition) => {
                if let Some(transition) = transition {
                    self.announce(&transition);
                }
                Ok(GatePermit {
                    gate: self,
                    resolved: false,
                })
            }
            Err(rejection) => {
                let error = self.rejection_error(rejection);
                tracing::debug!(
                    gate = %self.config.name,
                    retry_after_ms = millis(error.retry_after),
                    "Gate open, call rejected"
                );
                for observer in &self.observers {
                    observer.on_rejected(&self.config.name, &error);
                }
                Err(error)
            }
        }
    }

    /// Get gate statistics. Prunes stale failures but never changes the state.
    pub fn stats(&self) -> GateStats {
        let now = self.clock.now();
        self.core.lock().snapshot(now, &self.config)
    }

    /// Manually return the gate to a fresh closed state
    pub fn reset(&self) {
        let now = self.clock.now();
        let transition = self.core.lock().reset(now);
        match transition {
            Some(transition) => {
                tracing::info!(gate = %self.config.name, from = %transition.from, "Gate reset");
                self.notify(&transition);
            }
            None => tracing::debug!(gate = %self.config.name, "Gate reset while closed"),
        }
    }

    fn record_success(&self) {
        let now = self.clock.now();
        let transition = self.core.lock().record_success(now, &self.config);
        if let Some(transition) = transition {
            self.announce(&transition);
        }
    }

    fn record_failure(&self) {
        let now = self.clock.now();
        let transition = self.core.lock().record_failure(now, &self.config);
        if let Some(transition) = transition {
            self.announce(&transition);
        }
    }

    fn rejection_error(&self, rejection: Rejection) -> GateOpenError {
        GateOpenError {
            gate: self.config.name.clone(),
            opened_at: rejection.opened_at,
            next_attempt_at: rejection.next_attempt_at,
            retry_after: rejection.retry_after,
        }
    }

    fn announce(&self, transition: &Transition) {
        match transition.to {
            GateState::Open => tracing::warn!(
                gate = %self.config.name,
                from = %transition.from,
                timeout_ms = millis(self.config.timeout),
                "Gate opened"
            ),
            GateState::HalfOpen => tracing::info!(
                gate = %self.config.name,
                "Gate half-open, probing"
            ),
            GateState::Closed => tracing::info!(
                gate = %self.config.name,
                from = %transition.from,
                "Gate closed"
            ),
        }
        self.notify(transition);
    }

    fn notify(&self, transition: &Transition) {
        for observer in &self.observers {
            observer.on_transition(&self.config.name, transition);
        }
    }
}

/// Builder for [`ProtectiveGate`]
pub struct GateBuilder {
    config: GateConfig,
    clock: Arc<dyn Clock>,
    observers: Vec<Arc<dyn GateObserver>>,
}

impl GateBuilder {
    /// Use `clock` instead of the system clock
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Add an observer
    pub fn observer(mut self, observer: Arc<dyn GateObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Add several observers
    pub fn observers(
        mut self,
        observers: impl IntoIterator<Item = Arc<dyn GateObserver>>,
    ) -> Self {
        self.observers.extend(observers);
        self
    }

    /// Validate the configuration and build the gate
    pub fn build(self) -> GateResult<ProtectiveGate> {
        self.config.validate()?;
        Ok(ProtectiveGate {
            config: self.config,
            core: Mutex::new(GateCore::new()),
            clock: self.clock,
            observers: self.observers,
        })
    }
}

/// Admission granted by [`ProtectiveGate::try_acquire`].
///
/// Resolve it with exactly one outcome. An unresolved permit records a
/// failure when dropped.
#[must_use = "an unresolved permit records a failure when dropped"]
pub struct GatePermit<'a> {
    gate: &'a ProtectiveGate,
    resolved: bool,
}

impl GatePermit<'_> {
    /// The protected call succeeded
    pub fn record_success(mut self) {
        self.resolved = true;
        self.gate.record_success();
    }

    /// The protected call failed
    pub fn record_failure(mut self) {
        self.resolved = true;
        self.gate.record_failure();
    }
}

impl fmt::Debug for GatePermit<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatePermit")
            .field("gate", &self.gate.name())
            .field("resolved", &self.resolved)
            .finish()
    }
}

impl Drop for GatePermit<'_> {
    fn drop(&mut self) {
        if !self.resolved {
            tracing::debug!(
                gate = %self.gate.name(),
                "Permit dropped without an outcome, counting as failure"
            );
            self.gate.record_failure();
        }
    }
}
