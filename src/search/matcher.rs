//! Pattern matcher collaborator and its `grep-regex` reference implementation.

use crate::error::{Result, RichfindError};
use crate::search::types::{MatchRequest, RawMatch};
use async_trait::async_trait;
use grep_matcher::Matcher;
use grep_regex::{RegexMatcher, RegexMatcherBuilder};
use log::trace;

/// Finds raw matches inside extracted chunks.
///
/// Implementations must be side-effect free: the controller may issue a request and
/// ignore its answer when a newer search superseded it. Results need not be sorted.
#[async_trait]
pub trait PatternMatcher: Send + Sync {
    async fn find_matches(&self, request: MatchRequest) -> Result<Vec<RawMatch>>;
}

/// Literal matcher backed by `grep-regex`, run on the blocking thread pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct GrepMatcher;

impl GrepMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Run a request synchronously on the current thread.
    pub fn match_chunks(request: &MatchRequest) -> Result<Vec<RawMatch>> {
        if request.search_term.is_empty() {
            return Ok(Vec::new());
        }
        let matcher = build_matcher(request)?;
        let mut found = Vec::new();
        for chunk in &request.chunks {
            let mut offsets = CharOffsets::new(&chunk.text);
            matcher
                .find_iter(chunk.text.as_bytes(), |m| {
                    let index = offsets.char_offset(m.start());
                    let end = offsets.char_offset(m.end());
                    if end > index {
                        found.push(RawMatch {
                            chunk_id: chunk.id,
                            index,
                            length: end - index,
                        });
                    }
                    true
                })
                .map_err(|err| RichfindError::matcher(err.to_string()))?;
        }
        trace!(
            "matched {:?} {} time(s) across {} chunk(s)",
            request.search_term,
            found.len(),
            request.chunks.len()
        );
        Ok(found)
    }
}

#[async_trait]
impl PatternMatcher for GrepMatcher {
    async fn find_matches(&self, request: MatchRequest) -> Result<Vec<RawMatch>> {
        tokio::task::spawn_blocking(move || Self::match_chunks(&request))
            .await
            .map_err(|err| RichfindError::matcher(format!("matcher task failed: {}", err)))?
    }
}

fn build_matcher(request: &MatchRequest) -> Result<RegexMatcher> {
    RegexMatcherBuilder::new()
        .fixed_strings(true)
        .case_insensitive(!request.case_sensitive)
        .word(request.whole_words)
        .build(&request.search_term)
        .map_err(|err| {
            RichfindError::matcher(format!(
                "invalid search term {:?}: {}",
                request.search_term, err
            ))
        })
}

/// Converts ascending byte offsets of one string into character offsets.
struct CharOffsets<'a> {
    text: &'a str,
    byte: usize,
    chars: usize,
}

impl<'a> CharOffsets<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            byte: 0,
            chars: 0,
        }
    }

    fn char_offset(&mut self, byte: usize) -> usize {
        if byte < self.byte {
            return self.text[..byte].chars().count();
        }
        self.chars += self.text[self.byte..byte].chars().count();
        self.byte = byte;
        self.chars
    }
}
