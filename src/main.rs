//! CLI entry point for tiling and reassembling images

use clap::Parser;
use patchmaker::io::cli::{Cli, FileProcessor};

fn main() -> patchmaker::Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_level()))
        .init();

    let mut processor = FileProcessor::new(cli)?;
    processor.process()
}
