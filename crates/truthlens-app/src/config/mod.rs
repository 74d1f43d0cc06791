//! Configuration for TruthLens
//!
//! Supports:
//! - `.truthlens/config.toml` - service address, upload limits, history size
//! - `TRUTHLENS_API_URL` - overrides the service address

pub mod settings;
pub mod types;

pub use settings::{
    apply_env_overrides, init_config_dir, load_settings, resolve_config_dir, service_url,
    API_URL_ENV_VAR,
};
pub use types::*;
