//! Protected-range predicate: decides whether replacement at a range is allowed.

use crate::document::span::Span;
use crate::document::DocumentHost;

/// Replacement refusal policy.
pub trait ProtectionPolicy: Send + Sync {
    /// True when replacing the text at `span` must be refused.
    fn is_protected(&self, span: Span, document: &dyn DocumentHost) -> bool;

    /// Predicate for checking many spans against the current state of `document`.
    ///
    /// The predicate is only valid until the document changes.
    fn prepare<'a>(&'a self, document: &'a dyn DocumentHost) -> Box<dyn Fn(Span) -> bool + 'a> {
        Box::new(move |span| self.is_protected(span, document))
    }
}

/// Refuses replacement inside any block flagged as protected.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProtectedBlocks;

impl ProtectionPolicy for ProtectedBlocks {
    fn is_protected(&self, span: Span, document: &dyn DocumentHost) -> bool {
        ProtectedSpans::collect(document).intersects(span)
    }

    fn prepare<'a>(&'a self, document: &'a dyn DocumentHost) -> Box<dyn Fn(Span) -> bool + 'a> {
        let spans = ProtectedSpans::collect(document);
        Box::new(move |span| spans.intersects(span))
    }
}

/// Protected block ranges of one document state, merged and sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtectedSpans {
    spans: Vec<Span>,
}

impl ProtectedSpans {
    pub fn collect(document: &dyn DocumentHost) -> Self {
        let mut spans: Vec<Span> = Vec::new();
        // Pre-order walk: blocks arrive sorted by start, nested ones inside their parent
        document.walk_blocks(&mut |block| {
            if !block.protected {
                return;
            }
            match spans.last_mut() {
                Some(last) if block.from <= last.to => last.to = last.to.max(block.to),
                _ => spans.push(Span::new(block.from, block.to)),
            }
        });
        Self { spans }
    }

    pub fn as_slice(&self) -> &[Span] {
        &self.spans
    }

    /// Whether `span` shares a position with any protected block.
    pub fn intersects(&self, span: Span) -> bool {
        let candidate = self.spans.partition_point(|protected| protected.to <= span.from);
        self.spans
            .get(candidate)
            .is_some_and(|protected| protected.intersects(span))
    }
}
