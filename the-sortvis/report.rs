//! Renders a finished run for the terminal or for an external renderer.

use std::io::Write;

use anyhow::Result;
use serde::Serialize;
use the_tracker::{
  Action,
  ActionStats,
  Tracker,
};

use crate::algorithms::Algorithm;

#[derive(Debug, Serialize)]
pub struct Report<'a> {
  pub algorithm: Algorithm,
  pub initial:   &'a [i64],
  #[serde(rename = "final")]
  pub last:      Vec<i64>,
  pub actions:   &'a [Action],
  pub stats:     ActionStats,
}

impl<'a> Report<'a> {
  pub fn new(algorithm: Algorithm, tracker: &'a Tracker) -> Self {
    Self {
      algorithm,
      initial: tracker.initial_values(),
      last: tracker.values(),
      actions: tracker.actions(),
      stats: tracker.stats(),
    }
  }

  pub fn write_text(&self, out: &mut impl Write) -> Result<()> {
    writeln!(out, "{} sort of {:?}", self.algorithm, self.initial)?;
    let width = self.actions.len().to_string().len();
    for (step, action) in self.actions.iter().enumerate() {
      writeln!(out, "{:>width$}  {action}", step + 1)?;
    }
    writeln!(out, "result: {:?}", self.last)?;
    writeln!(out, "{}", self.stats)?;
    Ok(())
  }

  pub fn write_json(&self, out: &mut impl Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, self)?;
    writeln!(out)?;
    Ok(())
  }
}
