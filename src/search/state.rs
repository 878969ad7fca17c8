//! Controller state snapshot.
//!
//! [`SearchState`] is a value: every transition consumes the current snapshot and
//! returns the next one, so the controller can swap it under its lock and publish a
//! consistent view of it to the highlight engine.

use crate::search::mapper::{remap_after_replace, shift_ranges};
use crate::search::types::MatchRange;

/// Coarse lifecycle of a search session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    /// Nothing searched yet, or the last search found nothing
    Idle,
    /// A search for the current generation is awaiting its matcher
    Searching,
    /// Matches are available
    Active,
    /// A bulk replace is running
    Replacing,
    /// Cleared by dispose; the next search starts over
    Disposed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    generation: u64,
    pending: Option<u64>,
    ranges: Vec<MatchRange>,
    active: Option<usize>,
    replacing: bool,
    disposed: bool,
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn ranges(&self) -> &[MatchRange] {
        &self.ranges
    }

    pub fn count(&self) -> usize {
        self.ranges.len()
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn active_range(&self) -> Option<&MatchRange> {
        self.active.and_then(|index| self.ranges.get(index))
    }

    pub fn is_replacing(&self) -> bool {
        self.replacing
    }

    pub fn phase(&self) -> SearchPhase {
        if self.replacing {
            SearchPhase::Replacing
        } else if self.pending == Some(self.generation) {
            SearchPhase::Searching
        } else if !self.ranges.is_empty() {
            SearchPhase::Active
        } else if self.disposed {
            SearchPhase::Disposed
        } else {
            SearchPhase::Idle
        }
    }

    /// Whether results computed for `generation` may still be applied.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Start a new search; returns the generation its results must carry.
    pub fn begin_search(mut self) -> (Self, u64) {
        self.generation += 1;
        self.pending = Some(self.generation);
        let generation = self.generation;
        (self, generation)
    }

    /// Results of the current search; clears the active match.
    pub fn with_ranges(mut self, ranges: Vec<MatchRange>) -> Self {
        self.ranges = ranges;
        self.active = None;
        self.pending = None;
        self.disposed = false;
        self
    }

    /// The search for `generation` failed; matches stay as they were.
    pub fn abandon_search(mut self, generation: u64) -> Self {
        if self.pending == Some(generation) {
            self.pending = None;
        }
        self
    }

    /// Supersede any in-flight search without touching the current matches.
    pub fn cancelled(mut self) -> Self {
        self.generation += 1;
        self.pending = None;
        self
    }

    /// Set or clear the active match. Out-of-range indexes clear it.
    pub fn with_active(mut self, index: Option<usize>) -> Self {
        self.active = index.filter(|index| *index < self.ranges.len());
        self
    }

    /// Index after the active one, wrapping; the first match when none is active.
    pub fn next_index(&self) -> Option<usize> {
        if self.ranges.is_empty() {
            return None;
        }
        Some(match self.active {
            Some(index) => (index + 1) % self.ranges.len(),
            None => 0,
        })
    }

    /// Index before the active one, wrapping; the last match when none is active.
    pub fn previous_index(&self) -> Option<usize> {
        let last = self.ranges.len().checked_sub(1)?;
        Some(match self.active {
            Some(0) | None => last,
            Some(index) => index - 1,
        })
    }

    /// Match `index` was replaced by text `delta` characters longer.
    pub fn after_replace(mut self, index: usize, delta: isize) -> Self {
        self.ranges = remap_after_replace(&self.ranges, index, delta);
        self
    }

    pub fn begin_replacing(mut self) -> Self {
        self.replacing = true;
        self
    }

    /// Drop the first `processed` matches and shift the rest by the batch's net delta.
    pub fn after_batch(mut self, processed: usize, delta: isize) -> Self {
        let processed = processed.min(self.ranges.len());
        self.ranges = shift_ranges(&self.ranges[processed..], delta);
        self.active = None;
        self
    }

    /// Clear matches, the active match and replace mode. The generation survives.
    pub fn disposed(self) -> Self {
        Self {
            generation: self.generation,
            pending: self.pending,
            disposed: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_matches(count: usize) -> SearchState {
        let ranges = (0..count)
            .map(|i| MatchRange::new("text", i * 10, i * 10 + 3))
            .collect();
        let (state, _) = SearchState::new().begin_search();
        state.with_ranges(ranges)
    }

    #[test]
    fn phases_follow_transitions() {
        let state = SearchState::new();
        assert_eq!(state.phase(), SearchPhase::Idle);

        let (state, generation) = state.begin_search();
        assert_eq!(generation, 1);
        assert_eq!(state.phase(), SearchPhase::Searching);

        let state = state.with_ranges(vec![MatchRange::new("text", 0, 3)]);
        assert_eq!(state.phase(), SearchPhase::Active);

        let state = state.begin_replacing();
        assert_eq!(state.phase(), SearchPhase::Replacing);

        let state = state.disposed();
        assert_eq!(state.phase(), SearchPhase::Disposed);
        assert_eq!(state.count(), 0);
        assert!(!state.is_replacing());
        assert_eq!(state.generation(), 1);
    }

    #[test]
    fn newer_search_supersedes_older_generation() {
        let (state, first) = SearchState::new().begin_search();
        let (state, second) = state.begin_search();
        assert!(!state.is_current(first));
        assert!(state.is_current(second));

        let state = state.cancelled();
        assert!(!state.is_current(second));
        assert_eq!(state.phase(), SearchPhase::Idle);
    }

    #[test]
    fn cancel_keeps_matches() {
        let state = with_matches(3).cancelled();
        assert_eq!(state.count(), 3);
    }

    #[test]
    fn active_index_is_bounded() {
        let state = with_matches(2).with_active(Some(5));
        assert_eq!(state.active(), None);
        let state = state.with_active(Some(1));
        assert_eq!(state.active_range().map(|r| r.position.from), Some(10));
    }

    #[test]
    fn navigation_wraps() {
        let state = with_matches(3);
        assert_eq!(state.next_index(), Some(0));
        assert_eq!(state.previous_index(), Some(2));

        let state = state.with_active(Some(2));
        assert_eq!(state.next_index(), Some(0));
        assert_eq!(state.previous_index(), Some(1));

        assert_eq!(SearchState::new().next_index(), None);
        assert_eq!(SearchState::new().previous_index(), None);
    }

    #[test]
    fn batch_drops_processed_prefix_and_shifts_rest() {
        let state = with_matches(4).with_active(Some(0)).after_batch(2, 2);
        let starts: Vec<usize> = state.ranges().iter().map(|r| r.position.from).collect();
        assert_eq!(starts, vec![22, 32]);
        assert_eq!(state.active(), None);
    }

    #[test]
    fn failed_search_leaves_matches() {
        let state = with_matches(2);
        let (state, generation) = state.begin_search();
        let state = state.abandon_search(generation);
        assert_eq!(state.phase(), SearchPhase::Active);
        assert_eq!(state.count(), 2);
    }
}
