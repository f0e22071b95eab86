//! Command-line interface definitions for form-replay.

use std::path::PathBuf;

use clap::Parser;
use logging::LogArgs;

/// Command-line interface for the `form-replay` binary.
#[derive(Parser, Debug)]
#[command(
    name = "form-replay",
    about = "Replay a scripted session against a form declaration",
    version
)]
pub struct Cli {
    /// Logging controls shared across formwork binaries.
    #[command(flatten)]
    pub log: LogArgs,

    /// Form declaration (`.json` or `.ron`).
    #[arg(long, value_name = "FILE")]
    pub form: PathBuf,

    /// Session script: a JSON array of `edit` and `submit` steps.
    #[arg(long, value_name = "FILE")]
    pub script: PathBuf,
}
