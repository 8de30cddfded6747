//! Instrumented values handed out by a tracker.
//!
//! An [`Item`] is one immutable value with an [`ItemId`] identity, tagged with
//! the [`TrackerId`] of the tracker that owns it. The tracker records where
//! each identity is currently stored, so a handle kept across mutations still
//! resolves to its item's latest placement through
//! [`Tracker::location_of`](crate::tracker::Tracker::location_of).
//!
//! Items implement neither `PartialEq` nor `PartialOrd`. Comparisons go
//! through [`Tracker::compare`](crate::tracker::Tracker::compare) and its
//! shorthands, which log them.

use std::{
  num::NonZeroU64,
  sync::atomic::{
    AtomicU64,
    Ordering,
  },
};

/// Identity of a tracker, used to reject items from a different tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackerId(NonZeroU64);

impl TrackerId {
  pub(crate) fn fresh() -> Self {
    static NEXT_ID: AtomicU64 = AtomicU64::new(1);
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed).max(1);
    Self(NonZeroU64::new(id).unwrap_or(NonZeroU64::MIN))
  }

  pub fn get(self) -> u64 {
    self.0.get()
  }
}

/// Identity of one stored value. At most one position holds a given id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemId(NonZeroU64);

impl ItemId {
  pub(crate) fn fresh() -> Self {
    static NEXT_ID: AtomicU64 = AtomicU64::new(1);
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed).max(1);
    Self(NonZeroU64::new(id).unwrap_or(NonZeroU64::MIN))
  }

  pub fn get(self) -> u64 {
    self.0.get()
  }
}

#[derive(Debug, Clone)]
pub struct Item {
  value: i64,
  id:    ItemId,
  owner: TrackerId,
}

impl Item {
  pub(crate) fn new(value: i64, owner: TrackerId) -> Self {
    Self {
      value,
      id: ItemId::fresh(),
      owner,
    }
  }

  /// The raw value. Reading it is not logged; use it for display, not for
  /// deciding what the algorithm does next.
  #[inline]
  pub fn value(&self) -> i64 {
    self.value
  }

  #[inline]
  pub fn id(&self) -> ItemId {
    self.id
  }

  #[inline]
  pub fn owner(&self) -> TrackerId {
    self.owner
  }

  /// The same value under a new identity, for the copy left behind when an
  /// item is placed somewhere else.
  pub(crate) fn reidentified(&self) -> Self {
    Self::new(self.value, self.owner)
  }
}

/// One side of a comparison: a tracked item or a bare literal.
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a> {
  Item(&'a Item),
  Literal(i64),
}

impl Operand<'_> {
  #[inline]
  pub fn value(&self) -> i64 {
    match self {
      Self::Item(item) => item.value,
      Self::Literal(value) => *value,
    }
  }

  /// The item behind the operand, if any.
  pub fn item(&self) -> Option<&Item> {
    match self {
      Self::Item(item) => Some(*item),
      Self::Literal(_) => None,
    }
  }

  /// The owning tracker, if the operand is an item.
  pub fn owner(&self) -> Option<TrackerId> {
    match self {
      Self::Item(item) => Some(item.owner),
      Self::Literal(_) => None,
    }
  }
}

impl<'a> From<&'a Item> for Operand<'a> {
  fn from(item: &'a Item) -> Self {
    Self::Item(item)
  }
}

impl<'a> From<&'a mut Item> for Operand<'a> {
  fn from(item: &'a mut Item) -> Self {
    Self::Item(item)
  }
}

impl From<i64> for Operand<'_> {
  fn from(value: i64) -> Self {
    Self::Literal(value)
  }
}

impl From<i32> for Operand<'_> {
  fn from(value: i32) -> Self {
    Self::Literal(value.into())
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn test_fresh_ids_are_distinct() {
    let a = TrackerId::fresh();
    let b = TrackerId::fresh();
    assert_ne!(a, b);
    assert!(b.get() > a.get());
    assert_ne!(ItemId::fresh(), ItemId::fresh());
  }

  #[test]
  fn test_operands() {
    let owner = TrackerId::fresh();
    let item = Item::new(8, owner);

    let operand = Operand::from(&item);
    assert_eq!(operand.value(), 8);
    assert_eq!(operand.item().map(Item::id), Some(item.id()));
    assert_eq!(operand.owner(), Some(owner));

    let literal = Operand::from(5);
    assert_eq!(literal.value(), 5);
    assert!(literal.item().is_none());
    assert_eq!(literal.owner(), None);
  }

  #[test]
  fn test_reidentified_keeps_value() {
    let owner = TrackerId::fresh();
    let item = Item::new(8, owner);
    let copy = item.reidentified();
    assert_eq!(copy.value(), 8);
    assert_eq!(copy.owner(), owner);
    assert_ne!(copy.id(), item.id());
  }
}
