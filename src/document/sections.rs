//! Logical sections used to classify matches (header, footer, table, ...).

use crate::document::DocumentHost;
use std::sync::Arc;

/// Section assigned to positions no section range contains.
pub const DEFAULT_SECTION: &str = "text";

/// A logical section of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionRange {
    pub kind: Arc<str>,
    pub from: usize,
    pub to: usize,
}

impl SectionRange {
    pub fn new(kind: &str, from: usize, to: usize) -> Self {
        Self {
            kind: Arc::from(kind),
            from,
            to,
        }
    }
}

/// Ordered section ranges plus the fallback section name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionTable {
    ranges: Vec<SectionRange>,
    fallback: Arc<str>,
}

impl Default for SectionTable {
    fn default() -> Self {
        Self::new(Vec::new(), DEFAULT_SECTION)
    }
}

impl SectionTable {
    pub fn new(mut ranges: Vec<SectionRange>, fallback: &str) -> Self {
        ranges.sort_by_key(|range| range.from);
        Self {
            ranges,
            fallback: Arc::from(fallback),
        }
    }

    pub fn ranges(&self) -> &[SectionRange] {
        &self.ranges
    }

    /// Innermost section containing `pos`, or the fallback.
    pub fn section_at(&self, pos: usize) -> Arc<str> {
        section_at(&self.ranges, pos)
            .map(|range| Arc::clone(&range.kind))
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }
}

/// Innermost range of `sections` (sorted by `from`) that contains `pos`.
pub fn section_at(sections: &[SectionRange], pos: usize) -> Option<&SectionRange> {
    let started = sections.partition_point(|range| range.from <= pos);
    sections[..started]
        .iter()
        .rev()
        .find(|range| pos < range.to)
}

/// Section-range collaborator: computes the document's sections once per search.
pub trait SectionLookup: Send + Sync {
    fn sections(&self, document: &dyn DocumentHost) -> SectionTable;
}

/// Treats every block whose kind is in a configured set as a section.
#[derive(Debug, Clone)]
pub struct BlockSections {
    kinds: Vec<String>,
    fallback: String,
}

impl BlockSections {
    pub fn new<I, S>(kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kinds: kinds.into_iter().map(Into::into).collect(),
            fallback: DEFAULT_SECTION.to_string(),
        }
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    pub fn from_config(config: &crate::config::SectionConfig) -> Self {
        Self::new(config.kinds.iter().cloned()).with_fallback(config.default_section.clone())
    }
}

impl Default for BlockSections {
    fn default() -> Self {
        Self::from_config(&crate::config::SectionConfig::default())
    }
}

impl SectionLookup for BlockSections {
    fn sections(&self, document: &dyn DocumentHost) -> SectionTable {
        let mut ranges = Vec::new();
        document.walk_blocks(&mut |block| {
            if self.kinds.iter().any(|kind| kind == block.kind) {
                ranges.push(SectionRange::new(block.kind, block.from, block.to));
            }
        });
        SectionTable::new(ranges, &self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{InMemoryDocument, Node, Document};

    #[test]
    fn innermost_section_wins() {
        let table = SectionTable::new(
            vec![
                SectionRange::new("footer", 10, 30),
                SectionRange::new("table", 14, 20),
            ],
            DEFAULT_SECTION,
        );
        assert_eq!(&*table.section_at(12), "footer");
        assert_eq!(&*table.section_at(15), "table");
        assert_eq!(&*table.section_at(25), "footer");
        assert_eq!(&*table.section_at(30), DEFAULT_SECTION);
        assert_eq!(&*table.section_at(3), DEFAULT_SECTION);
    }

    #[test]
    fn block_sections_follow_configured_kinds() {
        let doc = InMemoryDocument::new(Document::new(vec![
            Node::heading("Intro"),
            Node::paragraph("body"),
            Node::block("footer", vec![Node::paragraph("page 1")]),
        ]));
        let table = BlockSections::new(["heading", "footer"]).sections(&doc);
        let kinds: Vec<(&str, usize, usize)> = table
            .ranges()
            .iter()
            .map(|r| (&*r.kind, r.from, r.to))
            .collect();
        assert_eq!(kinds, vec![("heading", 0, 7), ("footer", 13, 23)]);
        assert_eq!(&*table.section_at(9), DEFAULT_SECTION);
        assert_eq!(&*table.section_at(15), "footer");
    }

    #[test]
    fn custom_fallback() {
        let doc = InMemoryDocument::from_text("plain");
        let table = BlockSections::new(Vec::<String>::new())
            .with_fallback("body")
            .sections(&doc);
        assert_eq!(&*table.section_at(2), "body");
    }
}
