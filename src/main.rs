//! # imsframe
//!
//! Command-line front end for ion mobility frame reconstruction.
//!
//! ## Usage
//!
//! ```bash
//! # Generate a synthetic TIMS run
//! imsframe demo demo_tims_run.jsonl
//!
//! # Reconstruct frames and write a JSON summary next to the input
//! imsframe -v import demo_tims_run.jsonl --instrument tims
//!
//! # Several files, settings from a config file, summaries in one directory
//! imsframe import run01.jsonl run02.jsonl --config imsframe.toml --output summaries/
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

use cli::{dispatch, init_logging, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbosity());
    dispatch(cli)
}
