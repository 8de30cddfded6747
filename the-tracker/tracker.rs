//! The tracked container.
//!
//! A [`Tracker`] owns a main sequence of [`Item`]s, a map of named auxiliary
//! slots and an append-only log of [`Action`]s. Algorithm code reads and
//! writes through it and every observable operation lands in the log:
//!
//! ```ignore
//! let mut tracker = Tracker::new([8, 50, 22, 98, 41]);
//!
//! if tracker.greater(&tracker.get(0)?, &tracker.get(1)?)? {
//!     tracker.swap(0, 1)?;
//! }
//! tracker.set("temp", &tracker.get(2)?)?;
//! tracker.shift_range(1, 2, 2)?;
//!
//! for action in tracker.actions() {
//!     println!("{action}");
//! }
//! ```
//!
//! # Failure atomicity
//!
//! Every operation validates all of its indices and slot names before it
//! touches storage. A failed call returns a [`TrackerError`] and leaves the
//! sequence, the slots and the log exactly as they were.
//!
//! # Locations
//!
//! Storage is authoritative. Every stored item has an identity, and the
//! tracker maps each identity to the position that holds it. A single
//! internal primitive places items and keeps that map in step, so
//! [`Tracker::location_of`] always names an item's most recent placement,
//! even for a handle read before later swaps or shifts. Placing an item
//! elsewhere leaves a copy of its value under a new identity. Once an item is
//! overwritten its handles resolve to [`Location::Untracked`].

use std::{
  cmp::Ordering,
  collections::HashMap,
  fmt,
  time::Instant,
};

use thiserror::Error;

use crate::{
  action::{
    self,
    Action,
    CompareMode,
    Overwritten,
    ReplayError,
    signed,
  },
  item::{
    Item,
    ItemId,
    Operand,
    TrackerId,
  },
  location::{
    Location,
    Place,
    SlotName,
  },
  playback::Playback,
  stats::ActionStats,
};

pub type Result<T> = std::result::Result<T, TrackerError>;

/// The tracker operation that was attempted when an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
  Get,
  Set,
  Compare,
  Swap,
  Move,
  ShiftRange,
}

impl Operation {
  pub const fn name(self) -> &'static str {
    match self {
      Self::Get => "get",
      Self::Set => "set",
      Self::Compare => "compare",
      Self::Swap => "swap",
      Self::Move => "move",
      Self::ShiftRange => "shift range",
    }
  }
}

impl fmt::Display for Operation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Which run of a range shift fell outside the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftBound {
  Source,
  Destination,
}

impl fmt::Display for ShiftBound {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Source => "source",
      Self::Destination => "destination",
    })
  }
}

/// Mistakes made by the algorithm driving a tracker.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TrackerError {
  #[error("cannot {operation} index {index}: sequence length is {len}")]
  IndexOutOfRange {
    index:     i64,
    len:       usize,
    operation: Operation,
  },
  #[error("cannot {operation} slot `{slot}`: it has never been assigned")]
  SlotNotFound { slot: SlotName, operation: Operation },
  #[error("cannot {operation}: item belongs to a different tracker")]
  ForeignItem { operation: Operation },
  #[error("cannot shift range: {bound} run {start}..{end} is outside 0..{len}")]
  ShiftOutOfRange {
    bound: ShiftBound,
    start: i64,
    end:   i64,
    len:   usize,
  },
  #[error("replaying the action log produced {replayed:?}, expected {expected:?}")]
  ReplayMismatch {
    replayed: Vec<i64>,
    expected: Vec<i64>,
  },
  #[error(transparent)]
  Replay(#[from] ReplayError),
}

fn rejected(err: TrackerError) -> TrackerError {
  tracing::debug!("rejected: {err}");
  err
}

#[derive(Debug)]
pub struct Tracker {
  id:         TrackerId,
  initial:    Vec<i64>,
  sequence:   Vec<Item>,
  slots:      HashMap<SlotName, Item>,
  placements: HashMap<ItemId, Location>,
  log:        Vec<Action>,
}

impl Tracker {
  /// Creates a tracker holding one item per value, at `[0]`, `[1]`, ...
  pub fn new(values: impl IntoIterator<Item = i64>) -> Self {
    let id = TrackerId::fresh();
    let initial: Vec<i64> = values.into_iter().collect();
    let sequence: Vec<Item> = initial.iter().map(|&value| Item::new(value, id)).collect();
    let placements = sequence
      .iter()
      .enumerate()
      .map(|(index, item)| (item.id(), Location::Sequence(index)))
      .collect();
    Self {
      id,
      initial,
      sequence,
      slots: HashMap::new(),
      placements,
      log: Vec::new(),
    }
  }

  #[inline]
  pub fn id(&self) -> TrackerId {
    self.id
  }

  /// Length of the main sequence. Fixed for the lifetime of the tracker.
  #[inline]
  pub fn len(&self) -> usize {
    self.sequence.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.sequence.is_empty()
  }

  /// The values the tracker was created with.
  pub fn initial_values(&self) -> &[i64] {
    &self.initial
  }

  /// Current raw values of the main sequence. Not logged.
  pub fn values(&self) -> Vec<i64> {
    self.sequence.iter().map(Item::value).collect()
  }

  /// The stored items of the main sequence, in index order.
  pub fn items(&self) -> &[Item] {
    &self.sequence
  }

  /// The assigned slots, in no particular order.
  pub fn slots(&self) -> impl Iterator<Item = (&str, &Item)> {
    self.slots.iter().map(|(name, item)| (name.as_str(), item))
  }

  /// The full action log, oldest first.
  pub fn actions(&self) -> &[Action] {
    &self.log
  }

  pub fn last_action(&self) -> Option<&Action> {
    self.log.last()
  }

  pub fn stats(&self) -> ActionStats {
    ActionStats::from_actions(&self.log)
  }

  /// An untracked item owned by this tracker, for introducing a new value
  /// with [`Tracker::set`].
  pub fn literal(&self, value: i64) -> Item {
    Item::new(value, self.id)
  }

  /// Where `item` is stored now, or [`Location::Untracked`] if it has been
  /// overwritten, was never placed, or belongs to another tracker.
  pub fn location_of(&self, item: &Item) -> Location {
    if item.owner() != self.id {
      return Location::Untracked;
    }
    self
      .placements
      .get(&item.id())
      .cloned()
      .unwrap_or(Location::Untracked)
  }

  /// Returns the item at `place`. Reads are not logged.
  pub fn get(&self, place: impl Into<Place>) -> Result<Item> {
    let (_, item) = self.occupied(place.into(), Operation::Get)?;
    Ok(item)
  }

  /// Writes `item` into `place` and logs a [`Action::Copy`].
  ///
  /// Assigning an unset slot creates it. Sequence indices must be in range.
  pub fn set(&mut self, place: impl Into<Place>, item: &Item) -> Result<()> {
    let to = self.locate(place.into(), Operation::Set)?;
    self.check_owner(item, Operation::Set)?;

    let from = self.location_of(item);
    let previous = self.relocate(item.clone(), to.clone());
    self.record(Action::Copy {
      from,
      to,
      value: item.value(),
      overwritten: previous.map(|previous| previous.value()),
    });
    Ok(())
  }

  /// Writes a new, untracked value into `place`.
  pub fn write(&mut self, place: impl Into<Place>, value: i64) -> Result<()> {
    let literal = self.literal(value);
    self.set(place, &literal)
  }

  /// Compares two operands, logging one [`Action::Compare`] with the operands
  /// in the order they were passed, and returns the ordering of their values.
  ///
  /// # Errors
  /// Returns [`TrackerError::ForeignItem`] (and logs nothing) if either
  /// operand is an item owned by a different tracker.
  pub fn compare<'a>(
    &mut self,
    lhs: impl Into<Operand<'a>>,
    rhs: impl Into<Operand<'a>>,
    mode: CompareMode,
  ) -> Result<Ordering> {
    let (lhs, rhs) = (lhs.into(), rhs.into());
    for operand in [lhs, rhs] {
      if operand.owner().is_some_and(|owner| owner != self.id) {
        return Err(rejected(TrackerError::ForeignItem {
          operation: Operation::Compare,
        }));
      }
    }

    self.record(Action::Compare {
      value_a: lhs.value(),
      location_a: self.operand_location(&lhs),
      value_b: rhs.value(),
      location_b: self.operand_location(&rhs),
      mode,
    });
    Ok(lhs.value().cmp(&rhs.value()))
  }

  /// Three-way comparison, logged as [`CompareMode::CompareTo`].
  pub fn three_way<'a>(
    &mut self,
    lhs: impl Into<Operand<'a>>,
    rhs: impl Into<Operand<'a>>,
  ) -> Result<Ordering> {
    self.compare(lhs, rhs, CompareMode::CompareTo)
  }

  pub fn equal<'a>(
    &mut self,
    lhs: impl Into<Operand<'a>>,
    rhs: impl Into<Operand<'a>>,
  ) -> Result<bool> {
    self.test(lhs, rhs, CompareMode::Equal)
  }

  pub fn not_equal<'a>(
    &mut self,
    lhs: impl Into<Operand<'a>>,
    rhs: impl Into<Operand<'a>>,
  ) -> Result<bool> {
    self.test(lhs, rhs, CompareMode::NotEqual)
  }

  pub fn less<'a>(
    &mut self,
    lhs: impl Into<Operand<'a>>,
    rhs: impl Into<Operand<'a>>,
  ) -> Result<bool> {
    self.test(lhs, rhs, CompareMode::Less)
  }

  pub fn greater<'a>(
    &mut self,
    lhs: impl Into<Operand<'a>>,
    rhs: impl Into<Operand<'a>>,
  ) -> Result<bool> {
    self.test(lhs, rhs, CompareMode::Greater)
  }

  pub fn less_or_equal<'a>(
    &mut self,
    lhs: impl Into<Operand<'a>>,
    rhs: impl Into<Operand<'a>>,
  ) -> Result<bool> {
    self.test(lhs, rhs, CompareMode::LessOrEqual)
  }

  pub fn greater_or_equal<'a>(
    &mut self,
    lhs: impl Into<Operand<'a>>,
    rhs: impl Into<Operand<'a>>,
  ) -> Result<bool> {
    self.test(lhs, rhs, CompareMode::GreaterOrEqual)
  }

  fn test<'a>(
    &mut self,
    lhs: impl Into<Operand<'a>>,
    rhs: impl Into<Operand<'a>>,
    mode: CompareMode,
  ) -> Result<bool> {
    Ok(mode.holds(self.compare(lhs, rhs, mode)?))
  }

  /// Exchanges the contents of two places, each a sequence index or an
  /// assigned slot, and logs one [`Action::Swap`] oriented as called.
  ///
  /// Swapping a place with itself is valid and still logged.
  pub fn swap(&mut self, left: impl Into<Place>, right: impl Into<Place>) -> Result<()> {
    let (location_left, left) = self.occupied(left.into(), Operation::Swap)?;
    let (location_right, right) = self.occupied(right.into(), Operation::Swap)?;

    self.record(Action::Swap {
      value_left:     left.value(),
      location_left:  location_left.clone(),
      value_right:    right.value(),
      location_right: location_right.clone(),
    });
    self.relocate(left, location_right);
    self.relocate(right, location_left);
    Ok(())
  }

  /// Exchanges two item handles in place, e.g. loop variables.
  ///
  /// The swap is logged with each handle's own value and current location.
  /// Where a handle is still stored, the other handle's item takes its place
  /// in storage. Handles whose item has been overwritten or never placed are
  /// untracked and only the handles change.
  pub fn swap_items(&mut self, left: &mut Item, right: &mut Item) -> Result<()> {
    self.check_owner(left, Operation::Swap)?;
    self.check_owner(right, Operation::Swap)?;

    let location_left = self.location_of(left);
    let location_right = self.location_of(right);
    self.record(Action::Swap {
      value_left:     left.value(),
      location_left:  location_left.clone(),
      value_right:    right.value(),
      location_right: location_right.clone(),
    });

    if location_left.is_tracked() {
      self.relocate(right.clone(), location_left);
    }
    if location_right.is_tracked() {
      self.relocate(left.clone(), location_right);
    }
    std::mem::swap(left, right);
    Ok(())
  }

  /// Relocates the item at `from` into `to` and logs an [`Action::Move`].
  ///
  /// A slot source is vacated. A sequence source keeps its cell, since the
  /// sequence has no holes. Moving a place onto itself does nothing.
  pub fn move_item(&mut self, from: impl Into<Place>, to: impl Into<Place>) -> Result<()> {
    let (from, item) = self.occupied(from.into(), Operation::Move)?;
    let to = self.locate(to.into(), Operation::Move)?;
    if from == to {
      return Ok(());
    }

    if let Location::Slot(name) = &from {
      self.slots.remove(name);
    }
    let value = item.value();
    let previous = self.relocate(item, to.clone());
    self.record(Action::Move {
      from,
      to,
      value,
      overwritten: previous.map(|previous| previous.value()),
    });
    Ok(())
  }

  /// Copies the run `[start, start + count)` onto `[start + offset, start +
  /// count + offset)`, overwriting the destination, and logs an
  /// [`Action::RangeShift`].
  ///
  /// Both runs must lie within `0..len`. Cells outside the destination keep
  /// their values, so this is a copy with overwrite, not a rotation. A zero
  /// `count` or `offset` is a valid no-op and logs nothing.
  pub fn shift_range(&mut self, start: usize, count: usize, offset: isize) -> Result<()> {
    let len = self.sequence.len();
    if start.checked_add(count).is_none_or(|end| end > len) {
      return Err(rejected(TrackerError::ShiftOutOfRange {
        bound: ShiftBound::Source,
        start: signed(start),
        end: signed(start).saturating_add(signed(count)),
        len,
      }));
    }
    let dest_start = signed(start).saturating_add(offset as i64);
    let dest_end = dest_start.saturating_add(signed(count));
    if dest_start < 0 || dest_end > signed(len) {
      return Err(rejected(TrackerError::ShiftOutOfRange {
        bound: ShiftBound::Destination,
        start: dest_start,
        end: dest_end,
        len,
      }));
    }
    if count == 0 || offset == 0 {
      return Ok(());
    }

    let dest = start.saturating_add_signed(offset);
    let overwritten: Overwritten = self.sequence[action::uncovered_range(start, count, offset)]
      .iter()
      .map(Item::value)
      .collect();
    let moved = self.sequence[start..start + count].to_vec();
    for (k, item) in moved.into_iter().enumerate() {
      self.relocate(item, Location::Sequence(dest + k));
    }
    self.record(Action::RangeShift {
      start,
      count,
      offset,
      overwritten,
    });
    Ok(())
  }

  /// A playback over this tracker's initial values and log, positioned at the
  /// start.
  pub fn replay(&self) -> Playback<'_> {
    Playback::new(self.initial.clone(), &self.log)
  }

  /// Replays the whole log forward from the initial values and checks it
  /// reproduces the live sequence, then unwinds it again and checks it
  /// arrives back at the initial values.
  pub fn verify_replay(&self) -> Result<()> {
    let started = tracing::enabled!(tracing::Level::DEBUG).then(Instant::now);
    let mut values = self.initial.clone();

    for action in &self.log {
      action.apply(&mut values)?;
    }
    let live = self.values();
    if values != live {
      return Err(TrackerError::ReplayMismatch {
        replayed: values,
        expected: live,
      });
    }

    for action in self.log.iter().rev() {
      action.undo(&mut values)?;
    }
    if values != self.initial {
      return Err(TrackerError::ReplayMismatch {
        replayed: values,
        expected: self.initial.clone(),
      });
    }

    if let Some(started) = started {
      tracing::debug!(
        "replayed {} actions both ways in {}s",
        self.log.len(),
        Instant::now().duration_since(started).as_secs_f64()
      );
    }
    Ok(())
  }

  /// Validates `place` as a write target. Slots need not exist.
  fn locate(&self, place: Place, operation: Operation) -> Result<Location> {
    match place {
      Place::Index(index) => self.index(index, operation).map(Location::Sequence),
      Place::Slot(name) => Ok(Location::Slot(name)),
    }
  }

  fn index(&self, index: i64, operation: Operation) -> Result<usize> {
    usize::try_from(index)
      .ok()
      .filter(|&index| index < self.sequence.len())
      .ok_or_else(|| {
        rejected(TrackerError::IndexOutOfRange {
          index,
          len: self.sequence.len(),
          operation,
        })
      })
  }

  /// Validates `place` as a read source and returns its occupant.
  fn occupied(&self, place: Place, operation: Operation) -> Result<(Location, Item)> {
    match place {
      Place::Index(index) => {
        let index = self.index(index, operation)?;
        Ok((Location::Sequence(index), self.sequence[index].clone()))
      },
      Place::Slot(name) => {
        match self.slots.get(&name).cloned() {
          Some(item) => Ok((Location::Slot(name), item)),
          None => Err(rejected(TrackerError::SlotNotFound { slot: name, operation })),
        }
      },
    }
  }

  fn operand_location(&self, operand: &Operand<'_>) -> Location {
    operand
      .item()
      .map_or(Location::Untracked, |item| self.location_of(item))
  }

  fn check_owner(&self, item: &Item, operation: Operation) -> Result<()> {
    if item.owner() != self.id {
      return Err(rejected(TrackerError::ForeignItem { operation }));
    }
    Ok(())
  }

  /// Stores `item` at a validated `location` and returns the previous
  /// occupant. Every mutation goes through here and it is the only place
  /// placements change.
  ///
  /// If the item is currently stored elsewhere, the copy left behind there
  /// keeps the value under a fresh identity. The previous occupant, unless it
  /// is the same item, becomes untracked.
  fn relocate(&mut self, item: Item, location: Location) -> Option<Item> {
    if !location.is_tracked() {
      return None;
    }
    let id = item.id();
    if let Some(placed) = self.placements.get(&id).cloned() {
      if placed != location {
        self.reidentify(&placed, id);
      }
    }

    let previous = match &location {
      Location::Sequence(index) => Some(std::mem::replace(&mut self.sequence[*index], item)),
      Location::Slot(name) => self.slots.insert(name.clone(), item),
      Location::Untracked => None,
    };
    if let Some(previous) = &previous {
      if previous.id() != id {
        self.placements.remove(&previous.id());
      }
    }
    self.placements.insert(id, location);
    previous
  }

  /// Gives the item stored at `location` a fresh identity if it is `id`.
  fn reidentify(&mut self, location: &Location, id: ItemId) {
    let stored = match location {
      Location::Sequence(index) => self.sequence.get_mut(*index),
      Location::Slot(name) => self.slots.get_mut(name),
      Location::Untracked => None,
    };
    if let Some(stored) = stored {
      if stored.id() == id {
        *stored = stored.reidentified();
        self.placements.insert(stored.id(), location.clone());
      }
    }
  }

  fn record(&mut self, action: Action) {
    tracing::trace!("#{} {action}", self.log.len());
    self.log.push(action);
  }
}
