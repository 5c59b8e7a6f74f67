use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use imsframe::ingest::MobilityType;

mod config;
mod demo;
mod import;

pub use config::StorageKind;

/// imsframe - Ion Mobility Frame Reconstruction
#[derive(Parser)]
#[command(name = "imsframe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Mobility technique of the acquiring instrument.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum InstrumentArg {
    /// Trapped ion mobility (descending sweeps)
    Tims,
    /// Drift tube ion mobility
    DriftTube,
    /// Travelling wave ion mobility
    TravellingWave,
    /// FT-ICR coupled ion mobility
    FticrIms,
    /// No ion mobility (LC-MS)
    None,
}

impl From<InstrumentArg> for MobilityType {
    fn from(arg: InstrumentArg) -> Self {
        match arg {
            InstrumentArg::Tims => MobilityType::Tims,
            InstrumentArg::DriftTube => MobilityType::DriftTube,
            InstrumentArg::TravellingWave => MobilityType::TravellingWave,
            InstrumentArg::FticrIms => MobilityType::FticrIms,
            InstrumentArg::None => MobilityType::None,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Reconstruct frames from JSON Lines scan dumps and write JSON summaries
    Import {
        /// Input JSON Lines files, one decoded mobility scan per line
        #[arg(value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,

        /// Instrument mobility technique (default: config file, then tims)
        #[arg(short, long, value_enum)]
        instrument: Option<InstrumentArg>,

        /// Load settings from a TOML config file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Directory for the summaries (default: next to each input)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Where scan payloads are kept during import
        #[arg(long, value_enum)]
        storage: Option<StorageKind>,
    },

    /// Generate a synthetic TIMS run as JSON Lines
    Demo {
        /// Output JSON Lines file path
        #[arg(value_name = "OUTPUT", default_value = "demo_tims_run.jsonl")]
        output: PathBuf,

        /// Number of frames to generate
        #[arg(short, long, default_value = "40")]
        frames: u32,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Import {
            inputs,
            instrument,
            config,
            output,
            storage,
        } => import::run(
            inputs,
            instrument.map(MobilityType::from),
            config,
            output,
            storage,
        ),
        Commands::Demo { output, frames } => demo::run(output, frames),
    }
}
