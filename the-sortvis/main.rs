mod algorithms;
mod cli;
mod config;
mod report;

use std::io::{
  self,
  Write,
};

use anyhow::{
  Context,
  Result,
};
use clap::Parser;
use the_tracker::Tracker;

use crate::{
  cli::Cli,
  config::OutputFormat,
  report::Report,
};

fn main() -> Result<()> {
  let cli = Cli::parse();

  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log_filter())),
    )
    .with_writer(io::stderr)
    .init();

  let config = cli.resolve()?;
  tracing::info!(
    algorithm = %config.algorithm,
    len = config.values.len(),
    "tracing sort"
  );

  let mut tracker = Tracker::new(config.values.iter().copied());
  config
    .algorithm
    .run(&mut tracker)
    .with_context(|| format!("{} sort failed", config.algorithm))?;
  tracker
    .verify_replay()
    .context("recorded actions do not replay to the final state")?;
  tracing::info!(actions = tracker.actions().len(), "sort finished");

  let report = Report::new(config.algorithm, &tracker);
  let mut out = io::stdout().lock();
  match config.format {
    OutputFormat::Text => report.write_text(&mut out)?,
    OutputFormat::Json => report.write_json(&mut out)?,
  }
  out.flush()?;
  Ok(())
}
