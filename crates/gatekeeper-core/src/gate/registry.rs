//! Gate registry for managing one gate per dependency

use std::sync::Arc;

use super::breaker::ProtectiveGate;
use super::observer::GateObserver;
use super::types::GateStats;
use crate::clock::{Clock, SystemClock};
use crate::config::{GateConfig, GatekeeperConfig};
use crate::error::GateResult;

/// Collection of gates keyed by dependency name
pub struct GateRegistry {
    gates: dashmap::DashMap<String, Arc<ProtectiveGate>>,
    config: GatekeeperConfig,
    clock: Arc<dyn Clock>,
    observers: Vec<Arc<dyn GateObserver>>,
}

impl GateRegistry {
    /// Create a registry with default config
    pub fn new() -> Self {
        Self {
            gates: dashmap::DashMap::new(),
            config: GatekeeperConfig::default(),
            clock: Arc::new(SystemClock),
            observers: Vec::new(),
        }
    }

    /// Create a registry from loaded configuration, validating every entry up front
    pub fn from_config(config: GatekeeperConfig) -> GateResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new()
        })
    }

    /// Use `clock` for every gate created from now on
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Attach `observer` to every gate created from now on
    pub fn with_observer(mut self, observer: Arc<dyn GateObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Get or create the gate for `name`
    pub fn get(&self, name: &str) -> GateResult<Arc<ProtectiveGate>> {
        if let Some(gate) = self.gates.get(name) {
            return Ok(gate.clone());
        }
        let config = self.config.gate_config(name);
        self.get_with_config(config)
    }

    /// Get or create with custom config. An existing gate keeps its original config.
    pub fn get_with_config(&self, config: GateConfig) -> GateResult<Arc<ProtectiveGate>> {
        let entry = self
            .gates
            .entry(config.name.clone())
            .or_try_insert_with(|| self.build(config).map(Arc::new))?;
        Ok(entry.clone())
    }

    /// Get all gate names
    pub fn names(&self) -> Vec<String> {
        self.gates.iter().map(|e| e.key().clone()).collect()
    }

    /// Get stats for all gates, sorted by name
    pub fn all_stats(&self) -> Vec<GateStats> {
        let gates: Vec<Arc<ProtectiveGate>> =
            self.gates.iter().map(|e| e.value().clone()).collect();
        let mut stats: Vec<GateStats> = gates.iter().map(|gate| gate.stats()).collect();
        stats.sort_by(|a, b| a.name.cmp(&b.name));
        stats
    }

    /// Reset all gates
    pub fn reset_all(&self) {
        let gates: Vec<Arc<ProtectiveGate>> =
            self.gates.iter().map(|e| e.value().clone()).collect();
        for gate in gates {
            gate.reset();
        }
    }

    /// Forget the gate for `name`. Callers still holding it keep a working gate.
    pub fn remove(&self, name: &str) -> Option<Arc<ProtectiveGate>> {
        self.gates.remove(name).map(|(_, gate)| gate)
    }

    fn build(&self, config: GateConfig) -> GateResult<ProtectiveGate> {
        tracing::debug!(gate = %config.name, "Creating gate");
        ProtectiveGate::builder(config)
            .clock(self.clock.clone())
            .observers(self.observers.iter().cloned())
            .build()
    }
}

impl Default for GateRegistry {
    fn default() -> Self {
        Self::new()
    }
}
