//! Sample learner algorithms, written only against the public tracker API.

use std::fmt;

use clap::ValueEnum;
use serde::{
  Deserialize,
  Serialize,
};
use the_tracker::{
  Tracker,
  tracker::Result,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
  #[default]
  Bubble,
  Selection,
  Insertion,
  ShiftInsertion,
  Merge,
}

impl Algorithm {
  pub fn run(self, tracker: &mut Tracker) -> Result<()> {
    match self {
      Self::Bubble => bubble(tracker),
      Self::Selection => selection(tracker),
      Self::Insertion => insertion(tracker),
      Self::ShiftInsertion => shift_insertion(tracker),
      Self::Merge => merge(tracker),
    }
  }

  pub const fn name(self) -> &'static str {
    match self {
      Self::Bubble => "bubble",
      Self::Selection => "selection",
      Self::Insertion => "insertion",
      Self::ShiftInsertion => "shift-insertion",
      Self::Merge => "merge",
    }
  }
}

impl fmt::Display for Algorithm {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

pub fn bubble(tracker: &mut Tracker) -> Result<()> {
  let len = tracker.len();
  for pass in 0..len {
    let mut swapped = false;
    for j in 0..len - pass - 1 {
      if tracker.greater(&tracker.get(j)?, &tracker.get(j + 1)?)? {
        tracker.swap(j, j + 1)?;
        swapped = true;
      }
    }
    if !swapped {
      break;
    }
  }
  Ok(())
}

pub fn selection(tracker: &mut Tracker) -> Result<()> {
  let len = tracker.len();
  for i in 0..len {
    tracker.set("min", &tracker.get(i)?)?;
    let mut min_index = i;
    for j in i + 1..len {
      if tracker.less(&tracker.get(j)?, &tracker.get("min")?)? {
        tracker.set("min", &tracker.get(j)?)?;
        min_index = j;
      }
    }
    if min_index != i {
      tracker.swap(i, min_index)?;
    }
  }
  Ok(())
}

pub fn insertion(tracker: &mut Tracker) -> Result<()> {
  for i in 1..tracker.len() {
    tracker.set("key", &tracker.get(i)?)?;
    let mut j = i;
    while j > 0 && tracker.greater(&tracker.get(j - 1)?, &tracker.get("key")?)? {
      tracker.set(j, &tracker.get(j - 1)?)?;
      j -= 1;
    }
    tracker.move_item("key", j)?;
  }
  Ok(())
}

/// Insertion sort that opens the gap with one range shift instead of a chain
/// of single writes.
pub fn shift_insertion(tracker: &mut Tracker) -> Result<()> {
  for i in 1..tracker.len() {
    let mut j = i;
    while j > 0 && tracker.greater(&tracker.get(j - 1)?, &tracker.get(i)?)? {
      j -= 1;
    }
    if j == i {
      continue;
    }
    tracker.set("key", &tracker.get(i)?)?;
    tracker.shift_range(j, i - j, 1)?;
    tracker.move_item("key", j)?;
  }
  Ok(())
}

pub fn merge(tracker: &mut Tracker) -> Result<()> {
  let len = tracker.len();
  merge_sort(tracker, 0, len)
}

fn merge_sort(tracker: &mut Tracker, lo: usize, hi: usize) -> Result<()> {
  if hi - lo < 2 {
    return Ok(());
  }
  let mid = lo + (hi - lo) / 2;
  merge_sort(tracker, lo, mid)?;
  merge_sort(tracker, mid, hi)?;

  // The left run is parked in slots; the right run is merged in place.
  let left_len = mid - lo;
  for k in 0..left_len {
    tracker.set(format!("left{k}"), &tracker.get(lo + k)?)?;
  }
  let (mut i, mut j, mut out) = (0, mid, lo);
  while i < left_len && j < hi {
    let left = tracker.get(format!("left{i}"))?;
    let right = tracker.get(j)?;
    if tracker.less_or_equal(&left, &right)? {
      tracker.set(out, &left)?;
      i += 1;
    } else {
      tracker.set(out, &right)?;
      j += 1;
    }
    out += 1;
  }
  while i < left_len {
    tracker.move_item(format!("left{i}"), out)?;
    i += 1;
    out += 1;
  }
  Ok(())
}
