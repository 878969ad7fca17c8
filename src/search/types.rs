//! Data carried between the extractor, the pattern matcher and the controller.

use crate::document::Span;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One contiguous run of text extracted from a document text leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Sequential id, in document order
    pub id: usize,
    pub text: Arc<str>,
    /// Absolute position of the first character
    pub start: usize,
    /// Length in characters
    pub len: usize,
}

impl Chunk {
    pub fn new(id: usize, text: &str, start: usize) -> Self {
        Self {
            id,
            text: Arc::from(text),
            start,
            len: text.chars().count(),
        }
    }

    /// Position just past the last character
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Chunk payload sent to a matcher. Positions stay on the controller side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkText {
    pub id: usize,
    pub text: Arc<str>,
}

/// Input of one [`PatternMatcher`](crate::search::PatternMatcher) call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    pub chunks: Vec<ChunkText>,
    pub search_term: String,
    pub case_sensitive: bool,
    pub whole_words: bool,
}

impl MatchRequest {
    pub fn new(chunks: &[Chunk], criteria: &SearchCriteria) -> Self {
        Self {
            chunks: chunks
                .iter()
                .map(|chunk| ChunkText {
                    id: chunk.id,
                    text: Arc::clone(&chunk.text),
                })
                .collect(),
            search_term: criteria.term.clone(),
            case_sensitive: criteria.case_sensitive,
            whole_words: criteria.whole_words,
        }
    }
}

/// A match reported by a matcher, relative to its chunk.
///
/// `index` and `length` count characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMatch {
    pub chunk_id: usize,
    pub index: usize,
    pub length: usize,
}

/// What to look for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    pub term: String,
    pub case_sensitive: bool,
    pub whole_words: bool,
}

impl SearchCriteria {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            ..Self::default()
        }
    }

    pub fn case_sensitive(mut self, enabled: bool) -> Self {
        self.case_sensitive = enabled;
        self
    }

    pub fn whole_words(mut self, enabled: bool) -> Self {
        self.whole_words = enabled;
        self
    }
}

/// A match located in the document, tagged with the logical section it starts in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRange {
    pub section: Arc<str>,
    pub position: Span,
}

impl MatchRange {
    pub fn new(section: &str, from: usize, to: usize) -> Self {
        Self {
            section: Arc::from(section),
            position: Span::new(from, to),
        }
    }

    pub fn with_position(&self, position: Span) -> Self {
        Self {
            section: Arc::clone(&self.section),
            position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_length_counts_characters() {
        let chunk = Chunk::new(0, "héllo", 4);
        assert_eq!(chunk.len, 5);
        assert_eq!(chunk.end(), 9);
    }

    #[test]
    fn match_request_uses_camel_case_on_the_wire() {
        let chunks = vec![Chunk::new(0, "cat bat", 1)];
        let request = MatchRequest::new(&chunks, &SearchCriteria::new("cat").whole_words(true));
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["searchTerm"], "cat");
        assert_eq!(json["caseSensitive"], false);
        assert_eq!(json["wholeWords"], true);
        assert_eq!(json["chunks"][0]["text"], "cat bat");

        let raw: RawMatch =
            serde_json::from_str(r#"{"chunkId":3,"index":4,"length":2}"#).unwrap();
        assert_eq!(
            raw,
            RawMatch {
                chunk_id: 3,
                index: 4,
                length: 2
            }
        );
    }
}
