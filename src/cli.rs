//! Command-line surface

use std::path::PathBuf;

use clap::Subcommand;

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Submit a media file and print the verdict
    Detect {
        /// File to analyze
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },

    /// Show recent detections and session stats
    History {
        /// Number of entries to fetch (overrides history.limit)
        #[arg(long, value_name = "N")]
        limit: Option<usize>,
    },

    /// Check the detection service health
    Health,

    /// Write a default .truthlens/config.toml
    Init,
}
