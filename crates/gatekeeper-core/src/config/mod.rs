//! Gate configuration
//!
//! - [`GateConfig`]: tunables for one gate
//! - [`GatekeeperConfig`]: shared defaults plus per-dependency overrides
//! - [`loader`]: file (TOML/YAML/JSON) and `GATEKEEPER_*` environment loading

mod gate_config;
mod gatekeeper_config;
pub mod loader;

pub use gate_config::{
    DEFAULT_FAILURE_THRESHOLD, DEFAULT_GATE_NAME, DEFAULT_SUCCESS_THRESHOLD, DEFAULT_TIMEOUT,
    DEFAULT_WINDOW_SIZE, GateConfig,
};
pub use gatekeeper_config::{GateOverrides, GatekeeperConfig};
pub use loader::{load, load_from_file};
