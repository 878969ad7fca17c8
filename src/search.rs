//! Incremental search and replace over a [`DocumentHost`](crate::document::DocumentHost).
//!
//! Text leaves are extracted into chunks, matched by a [`PatternMatcher`], mapped
//! back into section-tagged document ranges and published to the highlight engine.
//! [`SearchController`] owns the match list and drives replacement.

pub mod controller;
pub mod extractor;
pub mod mapper;
pub mod matcher;
pub mod replace;
pub mod state;
pub mod types;
pub mod worker;

pub use controller::{ControllerBuilder, DocumentSession, SearchController};
pub use extractor::extract_chunks;
pub use mapper::{map_matches_to_ranges, remap_after_replace, shift_ranges};
pub use matcher::{GrepMatcher, PatternMatcher};
pub use replace::{plan_batch, BatchPlan, ReplaceSummary, REPLACE_ORIGIN};
pub use state::{SearchPhase, SearchState};
pub use types::{Chunk, ChunkText, MatchRange, MatchRequest, RawMatch, SearchCriteria};
pub use worker::{matcher_worker_loop, MatcherCommand, RequestId, WorkerMatcher};
