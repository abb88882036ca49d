pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod labels;
pub mod patterns;
pub mod processor;
pub mod rectify;
pub mod segments;

pub use config::ReaderConfig;
pub use error::{LabelError, ReadError};
pub use format::{format_reading, DataType, RECOGNITION_FAILED};
pub use labels::{parse_labels, Point, RegionDescriptor};
pub use patterns::{resolve, Symbol};
pub use processor::{run as read_panel, Recognition};

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Command-line entry point.
pub fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // RUST_LOG wins over -v; logs go to stderr so stdout only carries the reading.
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    cli::execute(cli)
}
