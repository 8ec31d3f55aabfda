//! Configuration for a set of gates: shared defaults plus per-dependency overrides

use super::gate_config::GateConfig;
use crate::error::GateResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Partial gate configuration layered over the defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateOverrides {
    pub failure_threshold: Option<u32>,
    pub success_threshold: Option<u32>,
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,
    #[serde(with = "humantime_serde")]
    pub window_size: Option<Duration>,
}

impl GateOverrides {
    /// Apply these overrides on top of `base`
    pub fn apply(&self, mut base: GateConfig) -> GateConfig {
        if let Some(threshold) = self.failure_threshold {
            base.failure_threshold = threshold;
        }
        if let Some(threshold) = self.success_threshold {
            base.success_threshold = threshold;
        }
        if let Some(timeout) = self.timeout {
            base.timeout = timeout;
        }
        if let Some(window_size) = self.window_size {
            base.window_size = window_size;
        }
        base
    }
}

/// Top-level configuration file layout
///
/// ```toml
/// [defaults]
/// failure_threshold = 5
/// timeout = "60s"
///
/// [gates.payments]
/// failure_threshold = 3
/// timeout = "15s"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatekeeperConfig {
    /// Settings every gate starts from
    pub defaults: GateConfig,
    /// Per-dependency overrides, keyed by gate name
    pub gates: BTreeMap<String, GateOverrides>,
}

impl GatekeeperConfig {
    /// Resolve the effective configuration for the gate called `name`
    pub fn gate_config(&self, name: &str) -> GateConfig {
        let base = self.defaults.clone().with_name(name);
        match self.gates.get(name) {
            Some(overrides) => overrides.apply(base),
            None => base,
        }
    }

    /// Add or replace the overrides for one gate
    pub fn with_gate(mut self, name: impl Into<String>, overrides: GateOverrides) -> Self {
        self.gates.insert(name.into(), overrides);
        self
    }

    /// Validate the defaults and every resolved override
    pub fn validate(&self) -> GateResult<()> {
        self.defaults.validate()?;
        for name in self.gates.keys() {
            self.gate_config(name).validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GateError;

    fn sample() -> GatekeeperConfig {
        GatekeeperConfig::default().with_gate(
            "payments",
            GateOverrides {
                failure_threshold: Some(3),
                timeout: Some(Duration::from_secs(15)),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_gate_config_uses_defaults_for_unknown_names() {
        let config = sample().gate_config("search");
        assert_eq!(config.name, "search");
        assert_eq!(config.failure_threshold, 5);
        assert_eq!(config.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_gate_config_applies_overrides() {
        let config = sample().gate_config("payments");
        assert_eq!(config.name, "payments");
        assert_eq!(config.failure_threshold, 3);
        assert_eq!(config.success_threshold, 2);
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.window_size, Duration::from_secs(60));
    }

    #[test]
    fn test_validate_catches_bad_override() {
        let config = sample().with_gate(
            "broken",
            GateOverrides {
                success_threshold: Some(0),
                ..Default::default()
            },
        );

        let err = config.validate().unwrap_err();
        assert!(matches!(err, GateError::Config(msg) if msg.contains("'broken'")));
    }

    #[test]
    fn test_overrides_parse_from_toml() {
        let config: GatekeeperConfig = toml::from_str(
            r#"
            [defaults]
            window_size = "30s"

            [gates.inventory]
            timeout = "500ms"
            "#,
        )
        .unwrap();

        let inventory = config.gate_config("inventory");
        assert_eq!(inventory.timeout, Duration::from_millis(500));
        assert_eq!(inventory.window_size, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }
}
