//! Loading gate configuration from files and the environment

use super::gatekeeper_config::GatekeeperConfig;
use crate::error::{GateError, GateResult};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "GATEKEEPER_";

/// Load configuration from a file
///
/// Supports JSON, TOML, and YAML formats based on file extension.
/// Returns default config if file doesn't exist.
pub fn load_from_file(path: &Path) -> GateResult<GatekeeperConfig> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No gate config file, using defaults");
        return Ok(GatekeeperConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|e| {
        GateError::Io(format!(
            "Failed to read config file '{}': {}",
            path.display(),
            e
        ))
    })?;

    let config: GatekeeperConfig = match path.extension().and_then(|s| s.to_str()) {
        Some("toml") => toml::from_str(&content)?,
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
        _ => serde_json::from_str(&content)?,
    };

    Ok(config)
}

/// Load a file, apply environment overrides and validate the result
pub fn load(path: &Path) -> GateResult<GatekeeperConfig> {
    let mut config = load_from_file(path)?;
    apply_env_overrides(&mut config, std::env::vars())?;
    config.validate()?;
    Ok(config)
}

/// Apply `GATEKEEPER_*` variables to the shared defaults
///
/// Recognised keys: `FAILURE_THRESHOLD`, `SUCCESS_THRESHOLD`, `TIMEOUT`,
/// `WINDOW_SIZE`. Durations use humantime syntax. Unrelated variables are
/// ignored.
pub fn apply_env_overrides<I, K, V>(config: &mut GatekeeperConfig, vars: I) -> GateResult<()>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    for (key, value) in vars {
        let Some(field) = key.as_ref().strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let value = value.as_ref().trim();
        let defaults = &mut config.defaults;
        match field {
            "FAILURE_THRESHOLD" => defaults.failure_threshold = parse_count(key.as_ref(), value)?,
            "SUCCESS_THRESHOLD" => defaults.success_threshold = parse_count(key.as_ref(), value)?,
            "TIMEOUT" => defaults.timeout = parse_duration(key.as_ref(), value)?,
            "WINDOW_SIZE" => defaults.window_size = parse_duration(key.as_ref(), value)?,
            _ => continue,
        }
        tracing::debug!(variable = key.as_ref(), value, "Applied gate config override");
    }
    Ok(())
}

fn parse_count(key: &str, value: &str) -> GateResult<u32> {
    value
        .parse()
        .map_err(|_| GateError::config(format!("Invalid {} value: '{}'", key, value)))
}

fn parse_duration(key: &str, value: &str) -> GateResult<Duration> {
    humantime_serde::re::humantime::parse_duration(value)
        .map_err(|e| GateError::config(format!("Invalid {} value '{}': {}", key, value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_from_file(&temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, GatekeeperConfig::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gates.toml");
        fs::write(
            &path,
            r#"
[defaults]
failure_threshold = 4
timeout = "10s"

[gates.payments]
failure_threshold = 2
"#,
        )
        .unwrap();

        let config = load_from_file(&path).unwrap();
        assert_eq!(config.defaults.failure_threshold, 4);
        assert_eq!(config.defaults.timeout, Duration::from_secs(10));
        assert_eq!(config.gate_config("payments").failure_threshold, 2);
        assert_eq!(config.gate_config("payments").timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_load_from_yaml_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gates.yaml");
        fs::write(
            &path,
            "defaults:\n  success_threshold: 4\n  window_size: 90s\ngates:\n  search:\n    timeout: 5s\n",
        )
        .unwrap();

        let config = load_from_file(&path).unwrap();
        assert_eq!(config.defaults.success_threshold, 4);
        assert_eq!(config.defaults.window_size, Duration::from_secs(90));
        assert_eq!(config.gate_config("search").timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_load_from_json_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gates.json");
        fs::write(
            &path,
            r#"{"defaults": {"failure_threshold": 7, "timeout": "2m"}}"#,
        )
        .unwrap();

        let config = load_from_file(&path).unwrap();
        assert_eq!(config.defaults.failure_threshold, 7);
        assert_eq!(config.defaults.timeout, Duration::from_secs(120));
        assert!(config.gates.is_empty());
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gates.toml");
        fs::write(&path, "[defaults\nfailure_threshold = ").unwrap();

        let err = load_from_file(&path).unwrap_err();
        assert!(matches!(err, GateError::Parse(msg) if msg.starts_with("TOML")));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = GatekeeperConfig::default();
        apply_env_overrides(
            &mut config,
            [
                ("GATEKEEPER_FAILURE_THRESHOLD", "9"),
                ("GATEKEEPER_TIMEOUT", "45s"),
                ("GATEKEEPER_WINDOW_SIZE", "2m 30s"),
                ("GATEKEEPER_UNKNOWN", "ignored"),
                ("PATH", "/usr/bin"),
            ],
        )
        .unwrap();

        assert_eq!(config.defaults.failure_threshold, 9);
        assert_eq!(config.defaults.success_threshold, 2);
        assert_eq!(config.defaults.timeout, Duration::from_secs(45));
        assert_eq!(config.defaults.window_size, Duration::from_secs(150));
    }

    #[test]
    fn test_env_overrides_reject_garbage() {
        let mut config = GatekeeperConfig::default();
        let err = apply_env_overrides(&mut config, [("GATEKEEPER_SUCCESS_THRESHOLD", "two")])
            .unwrap_err();
        assert!(matches!(err, GateError::Config(msg) if msg.contains("GATEKEEPER_SUCCESS_THRESHOLD")));

        let err = apply_env_overrides(&mut config, [("GATEKEEPER_TIMEOUT", "soon")]).unwrap_err();
        assert!(matches!(err, GateError::Config(_)));
    }

    #[test]
    fn test_load_validates() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gates.toml");
        fs::write(&path, "[gates.bad]\nfailure_threshold = 0\n").unwrap();

        assert!(matches!(load(&path), Err(GateError::Config(_))));
    }
}
