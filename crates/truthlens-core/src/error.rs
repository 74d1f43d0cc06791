//! Application error types with rich context
//!
//! Two families live here:
//! - [`Error`] - infrastructure failures (IO, config, channels, client setup)
//! - [`DetectError`] - the detection workflow taxonomy surfaced to the user

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    ConfigInvalid { message: String },

    // ─────────────────────────────────────────────────────────────
    // Channel/Communication Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Channel send error: {message}")]
    ChannelSend { message: String },

    #[error("Channel closed unexpectedly")]
    ChannelClosed,

    // ─────────────────────────────────────────────────────────────
    // Transport Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Transport setup error: {message}")]
    Transport { message: String },

    #[error("Invalid service address '{url}': {reason}")]
    InvalidServiceUrl { url: String, reason: String },

    #[error("Not a file: {path}")]
    NotAFile { path: PathBuf },
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            message: message.into(),
        }
    }

    pub fn channel_send(message: impl Into<String>) -> Self {
        Self::ChannelSend {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn invalid_service_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidServiceUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Check if this is a recoverable error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::ChannelSend { .. } | Error::NotAFile { .. })
    }

    /// Check if this error should trigger application exit
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::ConfigInvalid { .. }
                | Error::InvalidServiceUrl { .. }
                | Error::Transport { .. }
                | Error::ChannelClosed
        )
    }
}

// ─────────────────────────────────────────────────────────────────
// Detection Workflow Errors
// ─────────────────────────────────────────────────────────────────

/// Generic text shown when the service could not be reached at all.
pub const SERVICE_UNREACHABLE: &str =
    "Service unreachable. Check your connection and the service address.";

/// Error taxonomy for a single detection request or history read.
///
/// Every variant is terminal for the transition that produced it; the upload
/// session stores it in `Failed` and nothing propagates past the session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectError {
    /// The file failed the local size/type check before any network call.
    #[error("{message}")]
    Validation { message: String },

    /// The service answered with a non-2xx status. `body` is the raw body text.
    #[error("Server error {status}: {body}")]
    Server { status: u16, body: String },

    /// No response was received (connectivity, timeout, dropped connection).
    #[error("Network error: {reason}")]
    Network { reason: String },

    /// Any other local failure (unreadable file, bad request, undecodable reply).
    #[error("{message}")]
    Local { message: String },
}

impl DetectError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn server(status: u16, body: impl Into<String>) -> Self {
        Self::Server {
            status,
            body: body.into(),
        }
    }

    pub fn network(reason: impl Into<String>) -> Self {
        Self::Network {
            reason: reason.into(),
        }
    }

    pub fn local(message: impl Into<String>) -> Self {
        Self::Local {
            message: message.into(),
        }
    }

    /// Short machine-friendly kind label.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::Server { .. } => "server",
            Self::Network { .. } => "network",
            Self::Local { .. } => "local",
        }
    }

    /// Text shown to the user for this error.
    ///
    /// Server bodies holding JSON are rendered without quotes, so
    /// `{"detail":"model unavailable"}` reads `{detail: model unavailable}`.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message } | Self::Local { message } => message.clone(),
            Self::Server { status, body } => {
                format!("Server error {}: {}", status, relaxed_body(body))
            }
            Self::Network { .. } => SERVICE_UNREACHABLE.to_string(),
        }
    }
}

/// Render a response body for display, loosening JSON punctuation.
fn relaxed_body(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => relaxed_json(&value),
        Err(_) => body.trim().to_string(),
    }
}

fn relaxed_json(value: &serde_json::Value) -> String {
    use serde_json::Value;
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(relaxed_json).collect();
            format!("[{}]", parts.join(", "))
        }
        Value::Object(map) => {
            let parts: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", k, relaxed_json(v)))
                .collect();
            format!("{{{}}}", parts.join(", "))
        }
        other => other.to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", f(), err);
            err
        })
    }
}
