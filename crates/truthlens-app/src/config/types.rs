//! Configuration types

use std::time::Duration;

use serde::{Deserialize, Serialize};
use truthlens_core::BYTES_PER_MB;

/// Default service address, including the API prefix.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";

/// Application settings (.truthlens/config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub service: ServiceSettings,

    #[serde(default)]
    pub upload: UploadSettings,

    #[serde(default)]
    pub history: HistorySettings,
}

impl Settings {
    /// Options injected into the upload session and history view.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            max_size_mb: self.upload.max_size_mb,
            allowed_mime_types: self.upload.allowed_mime_types.clone(),
            history_limit: self.history.limit,
        }
    }
}

/// Detection service connection settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceSettings {
    /// Base address, e.g. `http://localhost:8000/api/v1`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Whole-request timeout in seconds (0 = no timeout)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ServiceSettings {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Upload validation settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadSettings {
    #[serde(default = "default_max_size_mb")]
    pub max_size_mb: u64,

    /// Soft hint only; other types are accepted with a warning
    #[serde(default = "default_allowed_mime_types")]
    pub allowed_mime_types: Vec<String>,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            max_size_mb: default_max_size_mb(),
            allowed_mime_types: default_allowed_mime_types(),
        }
    }
}

/// History view settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HistorySettings {
    /// Entries requested per refresh
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            limit: default_history_limit(),
        }
    }
}

/// Options injected at session construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub max_size_mb: u64,
    pub allowed_mime_types: Vec<String>,
    pub history_limit: usize,
}

impl SessionConfig {
    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_mb.saturating_mul(BYTES_PER_MB)
    }

    pub fn is_mime_allowed(&self, mime_type: &str) -> bool {
        self.allowed_mime_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(mime_type))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Settings::default().session_config()
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_size_mb() -> u64 {
    100
}

fn default_allowed_mime_types() -> Vec<String> {
    vec![
        "video/mp4".to_string(),
        "video/x-msvideo".to_string(),
        "video/quicktime".to_string(),
    ]
}

fn default_history_limit() -> usize {
    10
}
