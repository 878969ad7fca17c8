//! Document collaborator interface and the in-memory reference document.
//!
//! The search core never touches a document tree directly. Walking text leaves with
//! their absolute positions, reading text back and dispatching replace transactions
//! all go through [`DocumentHost`].
//!
//! ## Position model
//!
//! Positions are counted in characters (Unicode scalar values). A text leaf occupies
//! one position per character; a block occupies its content plus one position for its
//! opening and one for its closing boundary. The root has no boundaries, so text that
//! sits directly under the root starts at position 0.

pub mod in_memory;
pub mod node;
pub mod protection;
pub mod sections;
pub mod span;
pub mod transaction;
pub mod tree;

pub use in_memory::InMemoryDocument;
pub use node::{Block, Node};
pub use protection::{ProtectedBlocks, ProtectedSpans, ProtectionPolicy};
pub use sections::{
    section_at, BlockSections, SectionLookup, SectionRange, SectionTable, DEFAULT_SECTION,
};
pub use span::Span;
pub use transaction::{Assoc, Mapping, ReplaceStep, StepMap, Transaction};
pub use tree::Document;

use crate::error::Result;
use crate::view::ListenerGuard;
use tokio::sync::mpsc::UnboundedSender;

/// A block visited by [`DocumentHost::walk_blocks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo<'a> {
    /// Node type name (`"paragraph"`, `"heading"`, `"footer"`, ...)
    pub kind: &'a str,
    /// Position of the opening boundary
    pub from: usize,
    /// Position just past the closing boundary
    pub to: usize,
    /// Nesting depth, 0 for children of the root
    pub depth: usize,
    /// Whether the block refuses text replacement
    pub protected: bool,
}

/// A transaction the host applied, as reported to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpdate {
    /// Position mapping from the previous document state to the new one
    pub mapping: Mapping,
    /// Origin tag of the transaction, `None` for ordinary edits
    pub origin: Option<&'static str>,
    /// Host version after the update
    pub version: u64,
}

/// Live document the search core is attached to.
///
/// Implementations own their locking; every method takes `&self` so a host can be
/// shared between the controller, the view and the embedding application. Visitor
/// callbacks must not call back into the same host.
pub trait DocumentHost: Send + Sync {
    /// Total size of the position space
    fn size(&self) -> usize;

    /// Depth-first walk over every non-empty text leaf, in document order.
    ///
    /// `visit` receives the leaf's absolute start position and its text.
    fn walk_text(&self, visit: &mut dyn FnMut(usize, &str));

    /// Depth-first (pre-order) walk over every block.
    fn walk_blocks(&self, visit: &mut dyn FnMut(&BlockInfo<'_>));

    /// Text covered by `from..to`, skipping block boundaries.
    ///
    /// Returns `None` when the range is inverted or runs past the end.
    fn text_between(&self, from: usize, to: usize) -> Option<String>;

    /// Apply a transaction atomically and return the position mapping it produced.
    ///
    /// Either every step applies or the document is left untouched.
    fn dispatch(&self, transaction: Transaction) -> Result<Mapping>;

    /// Register `sink` for every applied update, in application order, until the
    /// returned guard is dropped. Updates are sent while the change is applied, so a
    /// subscriber never observes a later update before an earlier one.
    fn subscribe(&self, sink: UnboundedSender<DocumentUpdate>) -> ListenerGuard;
}
