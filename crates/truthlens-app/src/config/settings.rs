//! Settings parser for .truthlens/config.toml

use std::path::{Path, PathBuf};

use truthlens_core::prelude::*;
use truthlens_transport::normalize_base_url;
use url::Url;

use super::types::Settings;

const CONFIG_FILENAME: &str = "config.toml";
const TRUTHLENS_DIR: &str = ".truthlens";

/// Environment variable that replaces `service.base_url`.
pub const API_URL_ENV_VAR: &str = "TRUTHLENS_API_URL";

/// Directory holding `.truthlens/`: the explicit one, else the current
/// directory, else the home directory.
pub fn resolve_config_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| std::env::current_dir().ok())
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Load settings from `.truthlens/config.toml` under `dir`, then apply
/// environment overrides.
///
/// A missing or malformed file yields defaults.
pub fn load_settings(dir: &Path) -> Settings {
    let mut settings = read_settings_file(dir);
    apply_env_overrides(&mut settings);
    settings
}

fn read_settings_file(dir: &Path) -> Settings {
    let config_path = dir.join(TRUTHLENS_DIR).join(CONFIG_FILENAME);

    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return Settings::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", config_path);
                settings
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", config_path, e);
                Settings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", config_path, e);
            Settings::default()
        }
    }
}

/// Apply `TRUTHLENS_API_URL` if set and non-empty.
pub fn apply_env_overrides(settings: &mut Settings) {
    if let Ok(url) = std::env::var(API_URL_ENV_VAR) {
        let url = url.trim();
        if !url.is_empty() {
            debug!("{} overrides service.base_url with {}", API_URL_ENV_VAR, url);
            settings.service.base_url = url.to_string();
        }
    }
}

/// Validate the configured service address.
pub fn service_url(settings: &Settings) -> Result<Url> {
    normalize_base_url(&settings.service.base_url)
}

/// Create the default config file in the .truthlens/ directory.
///
/// Returns the path of the config file. An existing file is left untouched.
pub fn init_config_dir(dir: &Path) -> Result<PathBuf> {
    let truthlens_dir = dir.join(TRUTHLENS_DIR);

    if !truthlens_dir.exists() {
        std::fs::create_dir_all(&truthlens_dir)
            .map_err(|e| Error::config(format!("Failed to create .truthlens dir: {}", e)))?;
    }

    let config_path = truthlens_dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        let default_content = r#"# TruthLens Configuration

[service]
# Detection service address, including the API prefix.
# TRUTHLENS_API_URL overrides this value.
base_url = "http://localhost:8000/api/v1"
timeout_secs = 120      # 0 = no timeout

[upload]
max_size_mb = 100
# Other types are still accepted, with a warning
allowed_mime_types = ["video/mp4", "video/x-msvideo", "video/quicktime"]

[history]
limit = 10
"#;
        std::fs::write(&config_path, default_content)
            .map_err(|e| Error::config(format!("Failed to write config.toml: {}", e)))?;
        info!("Created default config at {:?}", config_path);
    }

    Ok(config_path)
}
