//! Transport outcome classification
//!
//! Maps what happened on the wire to [`DetectError`]:
//! - request could not be built → `Local`
//! - no response (connect failure, timeout, dropped body) → `Network`
//! - non-2xx response → `Server(status, body)`
//! - 2xx with an undecodable or inconsistent body → `Local`

use serde::de::DeserializeOwned;
use serde::Deserialize;
use truthlens_core::{DetectError, DetectionResult, HistoryEntry, SessionStats};

/// Classify an error returned while sending a request or reading its body.
pub fn classify_send_error(err: &reqwest::Error) -> DetectError {
    if err.is_builder() {
        DetectError::local(format!("Could not build request: {}", err))
    } else if err.is_timeout() {
        DetectError::network(format!("request timed out: {}", err))
    } else if err.is_connect() {
        DetectError::network(format!("could not connect: {}", err))
    } else {
        DetectError::network(err.to_string())
    }
}

/// Decode a completed response into `T`.
pub fn decode_response<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, DetectError> {
    if !(200..300).contains(&status) {
        return Err(DetectError::server(status, body));
    }
    serde_json::from_str(body).map_err(|e| malformed(e.to_string()))
}

/// Decode a detection response and check its invariants.
pub fn decode_detection(status: u16, body: &str) -> Result<DetectionResult, DetectError> {
    let result: DetectionResult = decode_response(status, body)?;
    result.validate().map_err(malformed)?;
    Ok(result)
}

/// History list envelope.
#[derive(Debug, Deserialize)]
struct HistoryEnvelope {
    // Early service builds answered with `detections`.
    #[serde(default, alias = "detections")]
    results: Vec<HistoryEntry>,
}

/// Decode a history response, checking every entry.
pub fn decode_history(status: u16, body: &str) -> Result<Vec<HistoryEntry>, DetectError> {
    let envelope: HistoryEnvelope = decode_response(status, body)?;
    for entry in &envelope.results {
        entry.result.validate().map_err(|reason| {
            malformed(format!(
                "history entry {}: {}",
                entry.result.request_id, reason
            ))
        })?;
    }
    Ok(envelope.results)
}

/// Decode a stats response and check its aggregate invariants.
pub fn decode_stats(status: u16, body: &str) -> Result<SessionStats, DetectError> {
    let stats: SessionStats = decode_response(status, body)?;
    stats.validate().map_err(malformed)?;
    Ok(stats)
}

fn malformed(reason: impl std::fmt::Display) -> DetectError {
    DetectError::local(format!("Malformed response: {}", reason))
}
