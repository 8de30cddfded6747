use std::path::PathBuf;

use anyhow::Result;
use clap::{
  ArgAction,
  Parser,
};

use crate::{
  algorithms::Algorithm,
  config::{
    Config,
    OutputFormat,
  },
};

const DEFAULT_CONFIG: &str = "sortvis.toml";

#[derive(Parser, Debug)]
#[command(name = "the-sortvis", about, long_about = None, version)]
pub struct Cli {
  /// Load configuration from a specific file
  #[arg(short = 'c', long = "config", value_name = "FILE")]
  pub config_file: Option<PathBuf>,

  /// Sorting algorithm to trace (overrides the config)
  #[arg(short = 'a', long, value_enum)]
  pub algorithm: Option<Algorithm>,

  /// Comma separated starting values (overrides the config)
  #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
  pub values: Option<Vec<i64>>,

  /// Output format (overrides the config)
  #[arg(short = 'f', long, value_enum)]
  pub format: Option<OutputFormat>,

  /// Increase logging verbosity (repeat for more detail)
  #[arg(short = 'v', action = ArgAction::Count)]
  pub verbosity: u8,
}

impl Cli {
  /// Loads the config file and applies command line overrides on top.
  pub fn resolve(&self) -> Result<Config> {
    let path = self
      .config_file
      .clone()
      .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let mut config = Config::load(&path)?;
    if let Some(algorithm) = self.algorithm {
      config.algorithm = algorithm;
    }
    if let Some(values) = &self.values {
      config.values = values.clone();
    }
    if let Some(format) = self.format {
      config.format = format;
    }
    Ok(config)
  }

  /// Default log filter when `RUST_LOG` is unset.
  pub fn log_filter(&self) -> &'static str {
    match self.verbosity {
      0 => "warn",
      1 => "info",
      2 => "debug",
      _ => "trace",
    }
  }
}
