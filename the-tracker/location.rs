//! Where a tracked value lives.
//!
//! A [`Location`] is metadata: it describes the position an item occupied at
//! the moment it was handed out or logged. A [`Place`] is the argument form
//! used to address storage when calling into a
//! [`Tracker`](crate::tracker::Tracker).
//!
//! ```text
//! Location::Sequence(3)       "[3]"
//! Location::Slot("temp")      "slot `temp`"
//! Location::Untracked         "untracked"   (bare literal)
//! ```

use std::fmt;

use serde::{
  Deserialize,
  Serialize,
};
use smartstring::{
  LazyCompact,
  SmartString,
};

/// Name of an auxiliary slot. Most names are short (`"temp"`, `"key"`), so
/// they stay inline.
pub type SlotName = SmartString<LazyCompact>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
  /// In the main sequence at this index.
  Sequence(usize),
  /// In a named auxiliary slot.
  Slot(SlotName),
  /// Not part of tracked state, e.g. a literal used in a comparison.
  Untracked,
}

impl Location {
  pub fn slot(name: impl Into<SlotName>) -> Self {
    Self::Slot(name.into())
  }

  /// Returns the sequence index, if the location is in the main sequence.
  #[inline]
  pub fn index(&self) -> Option<usize> {
    match self {
      Self::Sequence(index) => Some(*index),
      _ => None,
    }
  }

  #[inline]
  pub fn slot_name(&self) -> Option<&str> {
    match self {
      Self::Slot(name) => Some(name),
      _ => None,
    }
  }

  #[inline]
  pub fn is_tracked(&self) -> bool {
    !matches!(self, Self::Untracked)
  }
}

impl fmt::Display for Location {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Sequence(index) => write!(f, "[{index}]"),
      Self::Slot(name) => write!(f, "slot `{name}`"),
      Self::Untracked => f.write_str("untracked"),
    }
  }
}

/// An addressable position: a sequence index or a named slot.
///
/// Indices are signed so that an algorithm computing `j - 1` past the front
/// of the sequence gets an `IndexOutOfRange` error carrying the attempted
/// index instead of an arithmetic panic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Place {
  Index(i64),
  Slot(SlotName),
}

impl fmt::Display for Place {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Index(index) => write!(f, "[{index}]"),
      Self::Slot(name) => write!(f, "slot `{name}`"),
    }
  }
}

impl From<i32> for Place {
  fn from(index: i32) -> Self {
    Self::Index(index.into())
  }
}

impl From<i64> for Place {
  fn from(index: i64) -> Self {
    Self::Index(index)
  }
}

impl From<usize> for Place {
  fn from(index: usize) -> Self {
    Self::Index(i64::try_from(index).unwrap_or(i64::MAX))
  }
}

impl From<&str> for Place {
  fn from(name: &str) -> Self {
    Self::Slot(name.into())
  }
}

impl From<String> for Place {
  fn from(name: String) -> Self {
    Self::Slot(name.into())
  }
}

impl From<SlotName> for Place {
  fn from(name: SlotName) -> Self {
    Self::Slot(name)
  }
}

impl From<&SlotName> for Place {
  fn from(name: &SlotName) -> Self {
    Self::Slot(name.clone())
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn test_display() {
    assert_eq!(Location::Sequence(3).to_string(), "[3]");
    assert_eq!(Location::slot("temp").to_string(), "slot `temp`");
    assert_eq!(Location::Untracked.to_string(), "untracked");
    assert_eq!(Place::from(-1).to_string(), "[-1]");
  }

  #[test]
  fn test_accessors() {
    assert_eq!(Location::Sequence(2).index(), Some(2));
    assert_eq!(Location::slot("key").index(), None);
    assert_eq!(Location::slot("key").slot_name(), Some("key"));
    assert!(!Location::Untracked.is_tracked());
    assert!(Location::Sequence(0).is_tracked());
  }

  #[test]
  fn test_place_conversions() {
    assert_eq!(Place::from(4usize), Place::Index(4));
    assert_eq!(Place::from(-2i64), Place::Index(-2));
    assert_eq!(Place::from("min"), Place::Slot("min".into()));
    assert_eq!(Place::from(format!("left{}", 3)), Place::Slot("left3".into()));
    assert_eq!(Place::from(usize::MAX), Place::Index(i64::MAX));
  }

  #[test]
  fn test_serde_shape() {
    let json = serde_json::to_string(&Location::slot("temp")).unwrap();
    assert_eq!(json, r#"{"Slot":"temp"}"#);
    let back: Location = serde_json::from_str(&json).unwrap();
    assert_eq!(back, Location::slot("temp"));
  }
}
