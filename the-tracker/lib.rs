//! An instrumented integer array that records every observable operation.
//!
//! Sorting algorithms drive a [`Tracker`] as if it were a plain indexable
//! sequence. Each comparison, write, swap, move and range shift is appended to
//! an ordered log of [`Action`]s that a renderer can later replay forward and
//! backward with a [`Playback`].

pub mod action;
pub mod item;
pub mod location;
pub mod playback;
pub mod stats;
pub mod tracker;

pub use action::{
  Action,
  CompareMode,
};
pub use item::{
  Item,
  ItemId,
};
pub use location::{
  Location,
  Place,
};
pub use playback::Playback;
pub use stats::ActionStats;
pub use tracker::{
  Tracker,
  TrackerError,
};
