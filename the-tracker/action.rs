//! Recorded operations and their forward/inverse replay.
//!
//! Every observable operation on a [`Tracker`](crate::tracker::Tracker)
//! appends exactly one [`Action`] to its log. An action is an immutable
//! snapshot of the values and locations involved, carrying enough information
//! to be replayed against, or unwound from, a raw backing sequence:
//!
//! ```ignore
//! let mut values = tracker.initial_values().to_vec();
//! for action in tracker.actions() {
//!     action.apply(&mut values)?;
//! }
//! assert_eq!(values, tracker.values());
//!
//! for action in tracker.actions().iter().rev() {
//!     action.undo(&mut values)?;
//! }
//! assert_eq!(values, tracker.initial_values());
//! ```
//!
//! Slots have no representation in the raw sequence. Writes into a slot are
//! no-ops on replay; writes out of a slot carry the value they wrote, so the
//! sequence can always be reconstructed.

use std::{
  cmp::Ordering,
  fmt,
  ops::Range,
};

use serde::{
  Deserialize,
  Serialize,
};
use smallvec::SmallVec;
use thiserror::Error;

use crate::location::Location;

pub type Result<T> = std::result::Result<T, ReplayError>;

/// Values captured from the uncovered part of a range shift's destination.
pub type Overwritten = SmallVec<[i64; 4]>;

/// Errors raised when an action does not fit the sequence it is replayed on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ReplayError {
  #[error("replay index {index} is out of bounds for sequence length {len}")]
  IndexOutOfBounds { index: usize, len: usize },
  #[error("replay range {start}..{end} is out of bounds for sequence length {len}")]
  RangeOutOfBounds { start: i64, end: i64, len: usize },
  #[error("cannot undo a write to {location}: no overwritten value was recorded")]
  MissingOverwritten { location: Location },
  #[error("range shift recorded {actual} overwritten values, expected {expected}")]
  OverwrittenMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareMode {
  /// Three-way comparison yielding an [`Ordering`].
  CompareTo,
  Equal,
  NotEqual,
  Less,
  Greater,
  LessOrEqual,
  GreaterOrEqual,
}

impl CompareMode {
  /// Whether an ordering satisfies this mode. `CompareTo` always holds.
  pub fn holds(self, ordering: Ordering) -> bool {
    match self {
      Self::CompareTo => true,
      Self::Equal => ordering.is_eq(),
      Self::NotEqual => ordering.is_ne(),
      Self::Less => ordering.is_lt(),
      Self::Greater => ordering.is_gt(),
      Self::LessOrEqual => ordering.is_le(),
      Self::GreaterOrEqual => ordering.is_ge(),
    }
  }

  pub const fn symbol(self) -> &'static str {
    match self {
      Self::CompareTo => "<=>",
      Self::Equal => "==",
      Self::NotEqual => "!=",
      Self::Less => "<",
      Self::Greater => ">",
      Self::LessOrEqual => "<=",
      Self::GreaterOrEqual => ">=",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
  Compare {
    value_a:    i64,
    location_a: Location,
    value_b:    i64,
    location_b: Location,
    mode:       CompareMode,
  },
  /// Single-slot write. `overwritten` is present iff the destination held a
  /// previous item.
  Copy {
    from:        Location,
    to:          Location,
    value:       i64,
    overwritten: Option<i64>,
  },
  /// Locations are the pre-swap locations of each value.
  Swap {
    value_left:     i64,
    location_left:  Location,
    value_right:    i64,
    location_right: Location,
  },
  /// A relocation rather than a duplication.
  Move {
    from:        Location,
    to:          Location,
    value:       i64,
    overwritten: Option<i64>,
  },
  /// Block copy of `count` cells from `start` to `start + offset`.
  /// `overwritten` holds the destination cells outside the source run, in
  /// ascending index order, captured before the shift.
  RangeShift {
    start:       usize,
    count:       usize,
    offset:      isize,
    overwritten: Overwritten,
  },
}

impl Action {
  /// Whether replaying this action can change state.
  #[inline]
  pub fn is_mutating(&self) -> bool {
    !matches!(self, Self::Compare { .. })
  }

  /// Short name of the variant.
  pub const fn kind(&self) -> &'static str {
    match self {
      Self::Compare { .. } => "compare",
      Self::Copy { .. } => "copy",
      Self::Swap { .. } => "swap",
      Self::Move { .. } => "move",
      Self::RangeShift { .. } => "shift",
    }
  }

  /// Replays the action forward on `values`.
  ///
  /// Fails without touching `values` if the action does not fit.
  pub fn apply(&self, values: &mut [i64]) -> Result<()> {
    match self {
      Self::Compare { .. } => Ok(()),
      Self::Copy { to, value, .. } | Self::Move { to, value, .. } => {
        if let Location::Sequence(index) = to {
          *cell(values, *index)? = *value;
        }
        Ok(())
      },
      Self::Swap {
        value_left,
        location_left,
        value_right,
        location_right,
      } => write_pair(values, (location_left, *value_right), (location_right, *value_left)),
      Self::RangeShift {
        start,
        count,
        offset,
        ..
      } => {
        let dest = shift_destination(*start, *count, *offset, values.len())?;
        values.copy_within(*start..*start + *count, dest);
        Ok(())
      },
    }
  }

  /// Unwinds the action from `values`, which must be in the state right after
  /// the action was applied.
  ///
  /// Fails without touching `values` if the action does not fit.
  pub fn undo(&self, values: &mut [i64]) -> Result<()> {
    match self {
      Self::Compare { .. } => Ok(()),
      Self::Copy {
        to, overwritten, ..
      }
      | Self::Move {
        to, overwritten, ..
      } => {
        if let Location::Sequence(index) = to {
          let previous = overwritten.ok_or_else(|| {
            ReplayError::MissingOverwritten {
              location: to.clone(),
            }
          })?;
          *cell(values, *index)? = previous;
        }
        Ok(())
      },
      Self::Swap {
        value_left,
        location_left,
        value_right,
        location_right,
      } => write_pair(values, (location_left, *value_left), (location_right, *value_right)),
      Self::RangeShift {
        start,
        count,
        offset,
        overwritten,
      } => {
        let dest = shift_destination(*start, *count, *offset, values.len())?;
        let uncovered = uncovered_range(*start, *count, *offset);
        if uncovered.len() != overwritten.len() {
          return Err(ReplayError::OverwrittenMismatch {
            expected: uncovered.len(),
            actual:   overwritten.len(),
          });
        }
        values.copy_within(dest..dest + *count, *start);
        values[uncovered].copy_from_slice(overwritten);
        Ok(())
      },
    }
  }
}

impl fmt::Display for Action {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Compare {
        value_a,
        location_a,
        value_b,
        location_b,
        mode,
      } => {
        write!(
          f,
          "compare {} {} {}",
          Described(*value_a, location_a),
          mode.symbol(),
          Described(*value_b, location_b)
        )
      },
      Self::Copy {
        from,
        to,
        value,
        overwritten,
      } => {
        write!(f, "copy {} to {to}", Described(*value, from))?;
        if let Some(previous) = overwritten {
          write!(f, ", replacing {previous}")?;
        }
        Ok(())
      },
      Self::Swap {
        value_left,
        location_left,
        value_right,
        location_right,
      } => {
        write!(
          f,
          "swap {} with {}",
          Described(*value_left, location_left),
          Described(*value_right, location_right)
        )
      },
      Self::Move {
        from,
        to,
        value,
        overwritten,
      } => {
        write!(f, "move {value} from {from} to {to}")?;
        if let Some(previous) = overwritten {
          write!(f, ", replacing {previous}")?;
        }
        Ok(())
      },
      Self::RangeShift {
        start,
        count,
        offset,
        overwritten,
      } => {
        let direction = if *offset < 0 { "left" } else { "right" };
        write!(
          f,
          "shift [{start}..{}) {direction} by {}",
          start + count,
          offset.unsigned_abs()
        )?;
        if !overwritten.is_empty() {
          f.write_str(", overwriting ")?;
          for (i, value) in overwritten.iter().enumerate() {
            if i > 0 {
              f.write_str(", ")?;
            }
            write!(f, "{value}")?;
          }
        }
        Ok(())
      },
    }
  }
}

/// A value with the place it was read from, for descriptions.
struct Described<'a>(i64, &'a Location);

impl fmt::Display for Described<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.1 {
      Location::Untracked => write!(f, "{}", self.0),
      location => write!(f, "{} at {location}", self.0),
    }
  }
}

fn cell(values: &mut [i64], index: usize) -> Result<&mut i64> {
  let len = values.len();
  values
    .get_mut(index)
    .ok_or(ReplayError::IndexOutOfBounds { index, len })
}

/// Writes up to two sequence cells, validating both before writing either.
fn write_pair(
  values: &mut [i64],
  (first, first_value): (&Location, i64),
  (second, second_value): (&Location, i64),
) -> Result<()> {
  let len = values.len();
  for location in [first, second] {
    if let Location::Sequence(index) = location
      && *index >= len
    {
      return Err(ReplayError::IndexOutOfBounds { index: *index, len });
    }
  }
  if let Location::Sequence(index) = first {
    values[*index] = first_value;
  }
  if let Location::Sequence(index) = second {
    values[*index] = second_value;
  }
  Ok(())
}

/// Start of a range shift's destination, checking that both the source and
/// the destination run fit in `len`.
fn shift_destination(start: usize, count: usize, offset: isize, len: usize) -> Result<usize> {
  let source_end = start.checked_add(count).filter(|&end| end <= len);
  let dest = start
    .checked_add_signed(offset)
    .filter(|dest| dest.checked_add(count).is_some_and(|end| end <= len));
  match (source_end, dest) {
    (Some(_), Some(dest)) => Ok(dest),
    (None, _) => {
      Err(ReplayError::RangeOutOfBounds {
        start: signed(start),
        end: signed(start).saturating_add(signed(count)),
        len,
      })
    },
    (_, None) => {
      let dest = signed(start).saturating_add(offset as i64);
      Err(ReplayError::RangeOutOfBounds {
        start: dest,
        end: dest.saturating_add(signed(count)),
        len,
      })
    },
  }
}

/// Widens an index or count for error reporting, saturating at `i64::MAX`.
pub(crate) fn signed(n: usize) -> i64 {
  i64::try_from(n).unwrap_or(i64::MAX)
}

/// Destination cells of a range shift that lie outside its source run.
///
/// Its length is `min(|offset|, count)`: when the runs overlap only the
/// leading (or trailing) `|offset|` cells are new, otherwise the whole
/// destination is. Assumes the shift is in bounds.
pub(crate) fn uncovered_range(start: usize, count: usize, offset: isize) -> Range<usize> {
  let dest = start.saturating_add_signed(offset);
  if offset >= 0 {
    (start + count).max(dest)..dest + count
  } else {
    dest..start.min(dest + count)
  }
}

#[cfg(test)]
mod test {
  use smallvec::smallvec;

  use super::*;

  fn round_trip(action: &Action, before: &[i64], after: &[i64]) {
    let mut values = before.to_vec();
    action.apply(&mut values).unwrap();
    assert_eq!(values, after, "apply {action}");
    action.undo(&mut values).unwrap();
    assert_eq!(values, before, "undo {action}");
  }

  #[test]
  fn test_compare_mode_holds() {
    use Ordering::*;

    assert!(CompareMode::CompareTo.holds(Greater));
    assert!(CompareMode::Equal.holds(Equal));
    assert!(!CompareMode::Equal.holds(Less));
    assert!(CompareMode::NotEqual.holds(Less));
    assert!(CompareMode::Less.holds(Less));
    assert!(!CompareMode::Less.holds(Equal));
    assert!(CompareMode::LessOrEqual.holds(Equal));
    assert!(CompareMode::Greater.holds(Greater));
    assert!(CompareMode::GreaterOrEqual.holds(Equal));
    assert!(!CompareMode::GreaterOrEqual.holds(Less));
  }

  #[test]
  fn test_compare_is_inert() {
    let action = Action::Compare {
      value_a:    1,
      location_a: Location::Sequence(0),
      value_b:    2,
      location_b: Location::Untracked,
      mode:       CompareMode::Less,
    };
    assert!(!action.is_mutating());
    round_trip(&action, &[1, 2], &[1, 2]);
  }

  #[test]
  fn test_copy_into_sequence() {
    let action = Action::Copy {
      from:        Location::Sequence(2),
      to:          Location::Sequence(0),
      value:       22,
      overwritten: Some(8),
    };
    round_trip(&action, &[8, 50, 22], &[22, 50, 22]);
  }

  #[test]
  fn test_copy_into_slot_is_noop_on_sequence() {
    let action = Action::Copy {
      from:        Location::Sequence(2),
      to:          Location::slot("temp"),
      value:       22,
      overwritten: None,
    };
    round_trip(&action, &[8, 50, 22], &[8, 50, 22]);
  }

  #[test]
  fn test_undo_copy_without_overwritten() {
    let action = Action::Copy {
      from:        Location::Untracked,
      to:          Location::Sequence(0),
      value:       5,
      overwritten: None,
    };
    let mut values = vec![5];
    assert_eq!(
      action.undo(&mut values),
      Err(ReplayError::MissingOverwritten {
        location: Location::Sequence(0),
      })
    );
  }

  #[test]
  fn test_swap_sequence_and_slot() {
    let action = Action::Swap {
      value_left:     8,
      location_left:  Location::Sequence(0),
      value_right:    99,
      location_right: Location::slot("temp"),
    };
    round_trip(&action, &[8, 50], &[99, 50]);

    let both = Action::Swap {
      value_left:     8,
      location_left:  Location::Sequence(0),
      value_right:    50,
      location_right: Location::Sequence(1),
    };
    round_trip(&both, &[8, 50], &[50, 8]);
  }

  #[test]
  fn test_swap_out_of_bounds_is_atomic() {
    let action = Action::Swap {
      value_left:     8,
      location_left:  Location::Sequence(0),
      value_right:    50,
      location_right: Location::Sequence(7),
    };
    let mut values = vec![8, 50];
    assert_eq!(
      action.apply(&mut values),
      Err(ReplayError::IndexOutOfBounds { index: 7, len: 2 })
    );
    assert_eq!(values, [8, 50]);
  }

  #[test]
  fn test_move_into_sequence() {
    let action = Action::Move {
      from:        Location::slot("key"),
      to:          Location::Sequence(1),
      value:       3,
      overwritten: Some(50),
    };
    round_trip(&action, &[8, 50], &[8, 3]);
  }

  #[test]
  fn test_range_shift_disjoint() {
    let action = Action::RangeShift {
      start:       1,
      count:       2,
      offset:      2,
      overwritten: smallvec![98, 41],
    };
    round_trip(
      &action,
      &[8, 50, 22, 98, 41, 78, 3],
      &[8, 50, 22, 50, 22, 78, 3],
    );
  }

  #[test]
  fn test_range_shift_overlapping_right() {
    let action = Action::RangeShift {
      start:       1,
      count:       3,
      offset:      1,
      overwritten: smallvec![4],
    };
    round_trip(&action, &[0, 1, 2, 3, 4], &[0, 1, 1, 2, 3]);
  }

  #[test]
  fn test_range_shift_overlapping_left() {
    let action = Action::RangeShift {
      start:       2,
      count:       3,
      offset:      -2,
      overwritten: smallvec![0, 1],
    };
    round_trip(&action, &[0, 1, 2, 3, 4], &[2, 3, 4, 3, 4]);
  }

  #[test]
  fn test_range_shift_bounds() {
    let action = Action::RangeShift {
      start:       3,
      count:       2,
      offset:      1,
      overwritten: smallvec![0],
    };
    let mut values = vec![0; 5];
    assert_eq!(
      action.apply(&mut values),
      Err(ReplayError::RangeOutOfBounds {
        start: 4,
        end:   6,
        len:   5,
      })
    );
  }

  #[test]
  fn test_range_shift_huge_fields_saturate() {
    let mut values = vec![0; 5];
    let source = Action::RangeShift {
      start:       usize::MAX,
      count:       1,
      offset:      1,
      overwritten: smallvec![0],
    };
    assert_eq!(
      source.undo(&mut values),
      Err(ReplayError::RangeOutOfBounds {
        start: i64::MAX,
        end:   i64::MAX,
        len:   5,
      })
    );

    let destination = Action::RangeShift {
      start:       2,
      count:       1,
      offset:      isize::MAX,
      overwritten: smallvec![0],
    };
    assert_eq!(
      destination.apply(&mut values),
      Err(ReplayError::RangeOutOfBounds {
        start: i64::MAX,
        end:   i64::MAX,
        len:   5,
      })
    );
    assert_eq!(values, [0; 5]);
  }

  #[test]
  fn test_range_shift_overwritten_mismatch() {
    let action = Action::RangeShift {
      start:       0,
      count:       2,
      offset:      1,
      overwritten: smallvec![],
    };
    let mut values = vec![1, 1, 2];
    assert_eq!(
      action.undo(&mut values),
      Err(ReplayError::OverwrittenMismatch {
        expected: 1,
        actual:   0,
      })
    );
    assert_eq!(values, [1, 1, 2]);
  }

  #[test]
  fn test_uncovered_range() {
    assert_eq!(uncovered_range(1, 2, 2), 3..5);
    assert_eq!(uncovered_range(1, 3, 1), 4..5);
    assert_eq!(uncovered_range(2, 3, -2), 0..2);
    assert_eq!(uncovered_range(4, 2, -4), 0..2);
    assert_eq!(uncovered_range(0, 2, 5), 5..7);
    assert_eq!(uncovered_range(0, 0, 3), 3..3);
  }

  #[test]
  fn test_descriptions() {
    let compare = Action::Compare {
      value_a:    8,
      location_a: Location::Sequence(0),
      value_b:    5,
      location_b: Location::Untracked,
      mode:       CompareMode::Less,
    };
    assert_eq!(compare.to_string(), "compare 8 at [0] < 5");

    let copy = Action::Copy {
      from:        Location::Sequence(2),
      to:          Location::slot("temp"),
      value:       22,
      overwritten: None,
    };
    assert_eq!(copy.to_string(), "copy 22 at [2] to slot `temp`");

    let shift = Action::RangeShift {
      start:       1,
      count:       2,
      offset:      2,
      overwritten: smallvec![98, 41],
    };
    assert_eq!(shift.to_string(), "shift [1..3) right by 2, overwriting 98, 41");

    let moved = Action::Move {
      from:        Location::slot("key"),
      to:          Location::Sequence(1),
      value:       3,
      overwritten: Some(50),
    };
    assert_eq!(moved.to_string(), "move 3 from slot `key` to [1], replacing 50");
  }

  #[test]
  fn test_serializes_for_renderers() {
    let action = Action::RangeShift {
      start:       1,
      count:       2,
      offset:      -1,
      overwritten: smallvec![7],
    };
    let json = serde_json::to_string(&action).unwrap();
    let back: Action = serde_json::from_str(&json).unwrap();
    assert_eq!(back, action);
  }
}
