//! Scrubbing forward and backward through an action log.
//!
//! A [`Playback`] holds a raw copy of the sequence and a cursor into the log.
//! Position `n` means the first `n` actions have been applied; position 0 is
//! the initial state and position `len()` is the final one. Navigation that
//! fails leaves the playback where it was.

use thiserror::Error;

use crate::{
  action::{
    Action,
    ReplayError,
  },
  stats::ActionStats,
};

pub type Result<T> = std::result::Result<T, PlaybackError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PlaybackError {
  #[error("replay error: {0}")]
  Replay(#[from] ReplayError),
  #[error("playback position {index} is out of bounds (max: {max})")]
  PositionOutOfBounds { index: usize, max: usize },
}

#[derive(Debug, Clone)]
pub struct Playback<'a> {
  actions:  &'a [Action],
  values:   Vec<i64>,
  position: usize,
}

impl<'a> Playback<'a> {
  /// Starts at position 0 with `initial` as the current values.
  pub fn new(initial: Vec<i64>, actions: &'a [Action]) -> Self {
    Self {
      actions,
      values: initial,
      position: 0,
    }
  }

  /// The raw sequence at the current position.
  #[inline]
  pub fn values(&self) -> &[i64] {
    &self.values
  }

  #[inline]
  pub fn position(&self) -> usize {
    self.position
  }

  /// Number of actions in the log.
  #[inline]
  pub fn len(&self) -> usize {
    self.actions.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.actions.is_empty()
  }

  #[inline]
  pub const fn at_start(&self) -> bool {
    self.position == 0
  }

  #[inline]
  pub fn at_end(&self) -> bool {
    self.position == self.actions.len()
  }

  /// The most recently applied action.
  pub fn current(&self) -> Option<&'a Action> {
    let actions = self.actions;
    self.position.checked_sub(1).map(|n| &actions[n])
  }

  /// The action that the next [`step_forward`](Self::step_forward) applies.
  pub fn upcoming(&self) -> Option<&'a Action> {
    let actions = self.actions;
    actions.get(self.position)
  }

  /// Statistics for the actions applied so far.
  pub fn stats(&self) -> ActionStats {
    ActionStats::from_actions(&self.actions[..self.position])
  }

  /// Applies the next action. Returns `None` at the end of the log.
  pub fn step_forward(&mut self) -> Result<Option<&'a Action>> {
    let Some(action) = self.upcoming() else {
      return Ok(None);
    };
    action.apply(&mut self.values)?;
    self.position += 1;
    Ok(Some(action))
  }

  /// Undoes the most recent action. Returns `None` at the start of the log.
  pub fn step_backward(&mut self) -> Result<Option<&'a Action>> {
    let Some(action) = self.current() else {
      return Ok(None);
    };
    action.undo(&mut self.values)?;
    self.position -= 1;
    Ok(Some(action))
  }

  /// Moves to `position` by applying or undoing the actions in between.
  ///
  /// # Errors
  /// Returns an error if `position` is past the end of the log, or if an
  /// action does not fit the sequence. In both cases the playback stays at
  /// its current position.
  pub fn jump_to(&mut self, position: usize) -> Result<()> {
    if position > self.actions.len() {
      return Err(PlaybackError::PositionOutOfBounds {
        index: position,
        max:   self.actions.len(),
      });
    }

    let checkpoint = (self.values.clone(), self.position);
    let moved = if position >= self.position {
      (self.position..position).try_for_each(|n| self.actions[n].apply(&mut self.values))
    } else {
      (position..self.position)
        .rev()
        .try_for_each(|n| self.actions[n].undo(&mut self.values))
    };

    match moved {
      Ok(()) => {
        self.position = position;
        Ok(())
      },
      Err(err) => {
        tracing::debug!("playback jump to {position} failed: {err}");
        (self.values, self.position) = checkpoint;
        Err(err.into())
      },
    }
  }

  /// Moves forward by up to `steps` actions, stopping at the end.
  pub fn jump_forward(&mut self, steps: usize) -> Result<()> {
    let target = self.position.saturating_add(steps).min(self.actions.len());
    self.jump_to(target)
  }

  /// Moves backward by up to `steps` actions, stopping at the start.
  pub fn jump_backward(&mut self, steps: usize) -> Result<()> {
    self.jump_to(self.position.saturating_sub(steps))
  }

  /// Moves forward to just after the next action that changes state, skipping
  /// comparisons. Returns that action, or `None` if there is none left.
  pub fn next_mutation(&mut self) -> Result<Option<&'a Action>> {
    let Some(offset) = self.actions[self.position..]
      .iter()
      .position(Action::is_mutating)
    else {
      return Ok(None);
    };
    let target = self.position + offset + 1;
    self.jump_to(target)?;
    Ok(self.current())
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::{
    location::Location,
    tracker::Tracker,
  };

  fn sorted_tracker() -> Tracker {
    let mut tracker = Tracker::new([3, 1, 2]);
    if tracker
      .greater(&tracker.get(0).unwrap(), &tracker.get(1).unwrap())
      .unwrap()
    {
      tracker.swap(0, 1).unwrap();
    }
    if tracker
      .greater(&tracker.get(1).unwrap(), &tracker.get(2).unwrap())
      .unwrap()
    {
      tracker.swap(1, 2).unwrap();
    }
    tracker
  }

  #[test]
  fn test_step_forward_and_back() {
    let tracker = sorted_tracker();
    assert_eq!(tracker.values(), [1, 2, 3]);

    let mut playback = tracker.replay();
    assert!(playback.at_start());
    assert_eq!(playback.len(), 4);
    assert_eq!(playback.values(), [3, 1, 2]);

    let compare = playback.step_forward().unwrap().unwrap();
    assert!(!compare.is_mutating());
    assert_eq!(playback.values(), [3, 1, 2]);

    playback.step_forward().unwrap();
    assert_eq!(playback.values(), [1, 3, 2]);

    playback.step_backward().unwrap();
    assert_eq!(playback.values(), [3, 1, 2]);
    assert_eq!(playback.position(), 1);

    playback.jump_to(playback.len()).unwrap();
    assert!(playback.at_end());
    assert_eq!(playback.values(), tracker.values());
    assert!(playback.step_forward().unwrap().is_none());

    playback.jump_to(0).unwrap();
    assert_eq!(playback.values(), tracker.initial_values());
    assert!(playback.step_backward().unwrap().is_none());
  }

  #[test]
  fn test_jump_clamps() {
    let tracker = sorted_tracker();
    let mut playback = tracker.replay();
    playback.jump_forward(100).unwrap();
    assert!(playback.at_end());
    playback.jump_backward(3).unwrap();
    assert_eq!(playback.position(), 1);
    playback.jump_backward(100).unwrap();
    assert!(playback.at_start());
  }

  #[test]
  fn test_jump_out_of_bounds() {
    let tracker = sorted_tracker();
    let mut playback = tracker.replay();
    playback.jump_to(2).unwrap();
    assert_eq!(playback.jump_to(5).unwrap_err(), PlaybackError::PositionOutOfBounds {
      index: 5,
      max:   4,
    });
    assert_eq!(playback.position(), 2);
  }

  #[test]
  fn test_failed_jump_restores_state() {
    let actions = [
      Action::Copy {
        from:        Location::Untracked,
        to:          Location::Sequence(0),
        value:       9,
        overwritten: Some(1),
      },
      Action::Copy {
        from:        Location::Untracked,
        to:          Location::Sequence(4),
        value:       9,
        overwritten: Some(1),
      },
    ];
    let mut playback = Playback::new(vec![1, 2], &actions);
    let err = playback.jump_to(2).unwrap_err();
    assert_eq!(
      err,
      PlaybackError::Replay(ReplayError::IndexOutOfBounds { index: 4, len: 2 })
    );
    assert_eq!(playback.position(), 0);
    assert_eq!(playback.values(), [1, 2]);
  }

  #[test]
  fn test_next_mutation_skips_compares() {
    let tracker = sorted_tracker();
    let mut playback = tracker.replay();
    let action = playback.next_mutation().unwrap().unwrap();
    assert_eq!(action.kind(), "swap");
    assert_eq!(playback.position(), 2);
    assert_eq!(playback.stats().compares, 1);
    assert_eq!(playback.stats().swaps, 1);

    playback.next_mutation().unwrap();
    assert!(playback.at_end());
    assert!(playback.next_mutation().unwrap().is_none());
  }
}
