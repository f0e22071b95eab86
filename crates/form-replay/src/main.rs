#![warn(missing_docs)]

//! Entry point for the `form-replay` binary.
//!
//! Loads a form declaration, mounts it on an in-memory host and replays a
//! script of edits and submits, printing the render plan after each step.

mod cli;
mod error;
mod replay;

use std::{io, process};

use clap::Parser;
use tracing::error;

use crate::{cli::Cli, error::Result};

fn main() {
    if let Err(err) = run() {
        error!("{err}");
        eprintln!("error: {err}");
        process::exit(1);
    }
}

/// Parse CLI arguments, install logging, and replay the session.
fn run() -> Result<()> {
    let Cli { log, form, script } = Cli::parse();
    logging::init(&log.spec());

    let spec = form_config::load_from_path(&form)?;
    let steps = replay::load_script(&script)?;
    let stdout = io::stdout();
    replay::run(spec, &steps, &mut stdout.lock())
}
