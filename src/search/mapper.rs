//! Translation of chunk-relative matches into document ranges, and the arithmetic
//! that keeps those ranges valid across replacements.

use crate::document::{SectionTable, Span};
use crate::search::types::{Chunk, MatchRange, RawMatch};
use log::trace;
use std::cmp::Ordering;

/// Convert raw matches into absolute, section-tagged ranges sorted by start.
///
/// Matches whose chunk id is unknown, or that run past the end of their chunk, are
/// dropped.
pub fn map_matches_to_ranges(
    chunks: &[Chunk],
    raw: &[RawMatch],
    sections: &SectionTable,
) -> Vec<MatchRange> {
    let mut ranges: Vec<MatchRange> = raw
        .iter()
        .filter_map(|found| {
            let chunk = find_chunk(chunks, found.chunk_id)?;
            if found.length == 0 || found.index + found.length > chunk.len {
                trace!(
                    "dropping match {}+{} outside chunk {}",
                    found.index,
                    found.length,
                    found.chunk_id
                );
                return None;
            }
            let from = chunk.start + found.index;
            let section = sections.section_at(from);
            Some(MatchRange {
                section,
                position: Span::new(from, from + found.length),
            })
        })
        .collect();
    // Stable: equal starts keep matcher order
    ranges.sort_by_key(|range| range.position.from);
    ranges
}

fn find_chunk(chunks: &[Chunk], id: usize) -> Option<&Chunk> {
    chunks
        .binary_search_by_key(&id, |chunk| chunk.id)
        .ok()
        .map(|index| &chunks[index])
}

/// Ranges after replacing match `replaced` with text `delta` characters longer.
///
/// Earlier ranges are untouched, the replaced range keeps its start and changes its
/// length, later ranges shift by `delta`.
pub fn remap_after_replace(ranges: &[MatchRange], replaced: usize, delta: isize) -> Vec<MatchRange> {
    ranges
        .iter()
        .enumerate()
        .map(|(index, range)| match index.cmp(&replaced) {
            Ordering::Less => range.clone(),
            Ordering::Equal => range.with_position(range.position.resized(delta)),
            Ordering::Greater => range.with_position(range.position.shifted(delta)),
        })
        .collect()
}

/// Shift every range by `delta`.
pub fn shift_ranges(ranges: &[MatchRange], delta: isize) -> Vec<MatchRange> {
    ranges
        .iter()
        .map(|range| range.with_position(range.position.shifted(delta)))
        .collect()
}
