//! Prelude for common imports used throughout all TruthLens crates

pub use crate::error::{DetectError, Error, Result, ResultExt};
pub use tracing::{debug, error, info, instrument, trace, warn};
