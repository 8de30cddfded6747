use std::{
  fs,
  io::ErrorKind,
  path::Path,
};

use anyhow::{
  Context,
  Result,
};
use clap::ValueEnum;
use serde::{
  Deserialize,
  Serialize,
};

use crate::algorithms::Algorithm;

/// Starting values used when neither the config nor the command line gives
/// any.
pub const DEFAULT_VALUES: [i64; 7] = [8, 50, 22, 98, 41, 78, 3];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
  /// One description per action, then totals.
  #[default]
  Text,
  /// The whole run as JSON, for an external renderer.
  Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct Config {
  pub algorithm: Algorithm,
  pub values:    Vec<i64>,
  pub format:    OutputFormat,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      algorithm: Algorithm::default(),
      values:    DEFAULT_VALUES.to_vec(),
      format:    OutputFormat::default(),
    }
  }
}

impl Config {
  pub fn from_toml(source: &str) -> Result<Self, toml::de::Error> {
    toml::from_str(source)
  }

  /// Loads the config at `path`. A missing file yields the defaults; a file
  /// that exists but does not parse is an error.
  pub fn load(path: &Path) -> Result<Self> {
    let source = match fs::read_to_string(path) {
      Ok(source) => source,
      Err(err) if err.kind() == ErrorKind::NotFound => {
        tracing::info!("no config at {}, using defaults", path.display());
        return Ok(Self::default());
      },
      Err(err) => {
        return Err(err).with_context(|| format!("failed to read {}", path.display()));
      },
    };
    Self::from_toml(&source).with_context(|| format!("invalid config in {}", path.display()))
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn test_empty_config_is_default() {
    assert_eq!(Config::from_toml("").unwrap(), Config::default());
  }

  #[test]
  fn test_full_config() {
    let config = Config::from_toml(
      r#"
        algorithm = "shift-insertion"
        values = [5, -2, 9]
        format = "json"
      "#,
    )
    .unwrap();
    assert_eq!(config, Config {
      algorithm: Algorithm::ShiftInsertion,
      values:    vec![5, -2, 9],
      format:    OutputFormat::Json,
    });
  }

  #[test]
  fn test_unknown_fields_rejected() {
    assert!(Config::from_toml("speed = 3").is_err());
    assert!(Config::from_toml(r#"algorithm = "bogo""#).is_err());
  }

  #[test]
  fn test_missing_file_uses_defaults() {
    let config = Config::load(Path::new("/nonexistent/the-sortvis.toml")).unwrap();
    assert_eq!(config, Config::default());
  }
}
