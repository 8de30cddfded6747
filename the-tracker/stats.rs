//! Per-kind counts over an action log.

use std::fmt;

use serde::{
  Deserialize,
  Serialize,
};

use crate::action::Action;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionStats {
  pub compares:      usize,
  pub copies:        usize,
  pub swaps:         usize,
  pub moves:         usize,
  pub range_shifts:  usize,
  /// Cells written by range shifts.
  pub shifted_cells: usize,
}

impl ActionStats {
  pub fn from_actions<'a>(actions: impl IntoIterator<Item = &'a Action>) -> Self {
    let mut stats = Self::default();
    for action in actions {
      stats.record(action);
    }
    stats
  }

  pub fn record(&mut self, action: &Action) {
    match action {
      Action::Compare { .. } => self.compares += 1,
      Action::Copy { .. } => self.copies += 1,
      Action::Swap { .. } => self.swaps += 1,
      Action::Move { .. } => self.moves += 1,
      Action::RangeShift { count, .. } => {
        self.range_shifts += 1;
        self.shifted_cells += count;
      },
    }
  }

  /// Number of recorded actions.
  pub fn total(&self) -> usize {
    self.compares + self.copies + self.swaps + self.moves + self.range_shifts
  }
}

impl fmt::Display for ActionStats {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} compares, {} copies, {} swaps, {} moves, {} range shifts ({} cells)",
      self.compares, self.copies, self.swaps, self.moves, self.range_shifts, self.shifted_cells
    )
  }
}
