//! TruthLens command-line client
//!
//! A thin adapter over the workspace crates: it parses commands, drives the
//! `truthlens_app::Engine` and renders its events as terminal text or NDJSON.

pub mod cli;
pub mod headless;
pub mod render;
pub mod report;
pub mod runner;
pub mod signals;

// Re-export main entry points
pub use cli::Command;
pub use headless::{HeadlessEvent, HeadlessReporter};
pub use render::HumanReporter;
pub use report::Reporter;
pub use runner::run;
