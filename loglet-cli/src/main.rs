//! loglet CLI entry point

mod cli;
mod pipe;

use std::fs::File;
use std::io::{BufRead, BufReader, IsTerminal};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use loglet_core::config::SinkConfig;
use loglet_pipeline::SinkWriterBuilder;

use crate::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let mut config = match &cli.config {
        Some(path) => SinkConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => {
            let mut config = SinkConfig::default();
            config.apply_env_overrides();
            config
        }
    };
    cli.apply(&mut config);
    config.validate().context("invalid configuration")?;

    let color = config.color && std::io::stdout().is_terminal();
    let writer = SinkWriterBuilder::from_config(&config)?
        .color(color)
        .output(std::io::stdout())
        .build()?;

    let input: Box<dyn BufRead> = match &cli.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?,
        )),
        None => Box::new(std::io::stdin().lock()),
    };

    let lines = pipe::pipe(input, &writer)?;
    writer.flush()?;
    tracing::info!(lines, write_errors = writer.write_errors(), "input drained");

    Ok(())
}
