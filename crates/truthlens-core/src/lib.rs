//! # truthlens-core - Core Domain Types
//!
//! Foundation crate for the TruthLens client. Provides domain types, the
//! verdict presentation lookup, error handling and logging setup.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, chrono, thiserror, tracing).
//!
//! ## Public API
//!
//! ### Domain Types (`types`)
//! - [`SelectedFile`] - A file picked for submission
//! - [`DetectionResult`] - Service verdict for one request
//! - [`VerdictCode`] - Verdict enumeration with an open `Unknown` case
//! - [`HistoryEntry`], [`SessionStats`] - Session history and aggregates
//! - [`HealthStatus`] - Informational service health payload
//! - [`LoadState`] - Fetch lifecycle of a cached view
//!
//! ### Verdicts (`verdict`)
//! - [`classify()`] - Verdict → [`VerdictDescriptor`] (fails open to demo mode)
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Infrastructure errors with `fatal` vs `recoverable` classification
//! - [`DetectError`] - Validation / server / network / local workflow errors
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use truthlens_core::prelude::*;
//! ```

pub mod error;
pub mod logging;
pub mod prelude;
pub mod types;
pub mod verdict;

// Re-export commonly used types at crate root for convenience
pub use error::{DetectError, Error, Result, ResultExt, SERVICE_UNREACHABLE};
pub use types::{
    mime_for_path, DetectionResult, HealthStatus, HistoryEntry, LoadState, SelectedFile,
    SessionStats, VerdictCode, BYTES_PER_MB, FALLBACK_MIME_TYPE,
};
pub use verdict::{classify, VerdictDescriptor};
