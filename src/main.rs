//! TruthLens - command-line client for the deepfake detection service
//!
//! This is the binary entry point. All logic lives in the library.

use std::path::PathBuf;

use clap::Parser;
use truthlens::{Command, HeadlessEvent, HeadlessReporter, HumanReporter};
use truthlens_app::config::resolve_config_dir;

/// TruthLens - submit media files for deepfake detection
#[derive(Parser, Debug)]
#[command(name = "truthlens")]
#[command(about = "Submit media files to the TruthLens detection service", long_about = None)]
struct Args {
    /// Directory holding .truthlens/config.toml (default: current directory)
    #[arg(long, value_name = "DIR", global = true)]
    config_dir: Option<PathBuf>,

    /// Run in headless mode (NDJSON output)
    #[arg(long, global = true)]
    headless: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    truthlens_core::logging::init()?;

    let args = Args::parse();
    let config_dir = resolve_config_dir(args.config_dir);

    let result = if args.headless {
        truthlens::run(args.command, &config_dir, &mut HeadlessReporter::stdout()).await
    } else {
        truthlens::run(args.command, &config_dir, &mut HumanReporter::stdout()).await
    };

    match result {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(1),
        Err(e) if args.headless => {
            tracing::error!("Command failed: {}", e);
            HeadlessEvent::error(e.to_string(), true).emit();
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!("Command failed: {}", e);
            if let Ok(log_file) = truthlens_core::logging::get_current_log_file() {
                eprint!("{}", truthlens::render::format_log_hint(&log_file));
            }
            Err(e.into())
        }
    }
}
