//! # truthlens-transport - Detection Service Transport
//!
//! HTTP access to the detection service: multipart video upload with
//! progress, history, stats and health reads. Every failure is classified
//! into [`truthlens_core::DetectError`] before it leaves this crate.
//!
//! Depends on [`truthlens_core`] for domain types and error handling.
//!
//! ## Public API
//!
//! ### Client Contract
//! - [`TransportClient`] - `Send` async trait the application drives
//! - [`LocalTransportClient`] - Non-`Send` variant of the same trait
//!
//! ### HTTP Implementation
//! - [`HttpTransport`] - reqwest-backed client rooted at a base URL
//! - [`normalize_base_url()`] - Validate and normalise a configured base URL
//!
//! ### Progress
//! - [`ProgressReporter`] - Monotonic, clamped percentage sender
//! - [`ProgressReceiver`] - Receiving half of the progress channel
//!
//! ### Outcome Classification
//! - [`classify_send_error()`] - reqwest error → `Network` / `Local`
//! - [`decode_detection()`], [`decode_history()`], [`decode_stats()`] - status + body → typed result

pub mod client;
pub mod http;
pub mod outcome;
pub mod progress;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;

pub use client::{LocalTransportClient, TransportClient};
pub use http::{normalize_base_url, HttpTransport, UPLOAD_CHUNK_SIZE, UPLOAD_FIELD_NAME};
pub use outcome::{
    classify_send_error, decode_detection, decode_history, decode_response, decode_stats,
};
pub use progress::{ProgressReceiver, ProgressReporter};
