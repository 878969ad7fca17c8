//! Batch planning for bulk replace.

use crate::document::{ReplaceStep, Transaction};
use crate::search::types::MatchRange;

/// Origin tag of every transaction the search controller dispatches.
pub const REPLACE_ORIGIN: &str = "search-replace";

/// Outcome of a whole `replace_all` run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaceSummary {
    pub replaced: usize,
    pub skipped: usize,
    pub batches: usize,
}

/// One batch ready for dispatch.
#[derive(Debug)]
pub struct BatchPlan {
    /// Replace steps, with history recording suppressed
    pub transaction: Transaction,
    pub applied: usize,
    pub skipped: usize,
    /// Net length change of the batch, in characters
    pub delta: isize,
}

/// Plan the replacement of `batch` (sorted, non-overlapping) with `replacement`.
///
/// Steps are applied in sequence, so each match is addressed at its position shifted
/// by the replacements planned before it. Matches for which `is_protected` holds are
/// skipped and do not contribute to the delta.
pub fn plan_batch<F>(batch: &[MatchRange], replacement: &str, mut is_protected: F) -> BatchPlan
where
    F: FnMut(&MatchRange) -> bool,
{
    let inserted = replacement.chars().count() as isize;
    let mut transaction = Transaction::new()
        .without_history()
        .with_origin(REPLACE_ORIGIN);
    let mut delta = 0isize;
    let mut applied = 0;
    let mut skipped = 0;

    for range in batch {
        if is_protected(range) {
            skipped += 1;
            continue;
        }
        let at = range.position.shifted(delta);
        transaction.push(ReplaceStep::new(at.from, at.to, replacement));
        delta += inserted - range.position.len() as isize;
        applied += 1;
    }

    BatchPlan {
        transaction,
        applied,
        skipped,
        delta,
    }
}
