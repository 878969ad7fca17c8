//! Search controller: owns the match list and drives search, navigation and replace.
//!
//! State lives in a [`SearchState`] snapshot behind a `parking_lot::Mutex`. The lock
//! is never held across an `.await`: a search takes a generation, releases the lock
//! while the matcher runs, and only applies its results if no newer search or cancel
//! bumped the generation in the meantime. Every failure path degrades to "no effect"
//! and is logged rather than returned.

use crate::config::{EngineConfig, DEFAULT_BATCH_SIZE};
use crate::document::{
    BlockSections, DocumentHost, ProtectedBlocks, ProtectionPolicy, SectionLookup, Transaction,
};
use crate::highlight::HighlightEngine;
use crate::search::extractor::extract_chunks;
use crate::search::mapper::map_matches_to_ranges;
use crate::search::matcher::PatternMatcher;
use crate::search::replace::{plan_batch, ReplaceSummary, REPLACE_ORIGIN};
use crate::search::state::{SearchPhase, SearchState};
use crate::search::types::{MatchRange, MatchRequest, SearchCriteria};
use crate::view::ViewAdapter;
use log::{debug, trace, warn};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// The document, view and highlight engine a controller works against.
#[derive(Clone)]
pub struct DocumentSession {
    pub document: Arc<dyn DocumentHost>,
    pub view: Arc<dyn ViewAdapter>,
    pub highlights: HighlightEngine,
}

impl DocumentSession {
    pub fn new(
        document: Arc<dyn DocumentHost>,
        view: Arc<dyn ViewAdapter>,
        highlights: HighlightEngine,
    ) -> Self {
        Self {
            document,
            view,
            highlights,
        }
    }
}

/// Configures a [`SearchController`].
pub struct ControllerBuilder {
    matcher: Arc<dyn PatternMatcher>,
    sections: Arc<dyn SectionLookup>,
    protection: Arc<dyn ProtectionPolicy>,
    batch_size: usize,
}

impl ControllerBuilder {
    pub fn sections(mut self, sections: Arc<dyn SectionLookup>) -> Self {
        self.sections = sections;
        self
    }

    pub fn protection(mut self, protection: Arc<dyn ProtectionPolicy>) -> Self {
        self.protection = protection;
        self
    }

    /// Matches replaced per transaction by `replace_all`.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Take batch size and section kinds from `config`.
    pub fn config(self, config: &EngineConfig) -> Self {
        self.batch_size(config.replace.batch_size)
            .sections(Arc::new(BlockSections::from_config(&config.sections)))
    }

    pub fn build(self) -> SearchController {
        SearchController {
            inner: Arc::new(ControllerInner {
                state: Mutex::new(SearchState::new()),
                session: RwLock::new(None),
                matcher: self.matcher,
                sections: self.sections,
                protection: self.protection,
                batch_size: self.batch_size,
            }),
        }
    }
}

/// Cheaply cloneable handle; clones share one controller.
#[derive(Clone)]
pub struct SearchController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    state: Mutex<SearchState>,
    session: RwLock<Option<DocumentSession>>,
    matcher: Arc<dyn PatternMatcher>,
    sections: Arc<dyn SectionLookup>,
    protection: Arc<dyn ProtectionPolicy>,
    batch_size: usize,
}

impl SearchController {
    /// Controller with block-kind sections, protected-block refusal and default
    /// batching.
    pub fn new(matcher: Arc<dyn PatternMatcher>) -> Self {
        Self::builder(matcher).build()
    }

    pub fn builder(matcher: Arc<dyn PatternMatcher>) -> ControllerBuilder {
        ControllerBuilder {
            matcher,
            sections: Arc::new(BlockSections::default()),
            protection: Arc::new(ProtectedBlocks),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Bind to a document session. Matches from a previous session are kept until the
    /// next search or dispose.
    ///
    /// The session's highlight engine starts following document updates, so edits
    /// made outside the controller keep its decorations on the matched text.
    pub fn attach(&self, session: DocumentSession) {
        let previous = self.inner.session.write().replace(session.clone());
        if let Some(previous) = previous {
            previous.highlights.untrack();
        }
        session.highlights.track(session.document.as_ref());
        debug!("search controller attached");
    }

    pub fn detach(&self) -> Option<DocumentSession> {
        let session = self.inner.session.write().take();
        if let Some(session) = &session {
            session.highlights.untrack();
            debug!("search controller detached");
        }
        session
    }

    pub fn is_attached(&self) -> bool {
        self.inner.session.read().is_some()
    }

    fn session(&self) -> Option<DocumentSession> {
        self.inner.session.read().clone()
    }

    fn transition<R>(&self, f: impl FnOnce(SearchState) -> (SearchState, R)) -> R {
        let mut state = self.inner.state.lock();
        let (next, out) = f(std::mem::take(&mut *state));
        *state = next;
        out
    }

    /// Search the attached document and publish the matches.
    ///
    /// Returns the number of matches, or 0 when unattached, when the document has no
    /// text, when the matcher failed, or when a newer search superseded this one.
    pub async fn search(&self, term: &str, case_sensitive: bool, whole_words: bool) -> usize {
        let criteria = SearchCriteria::new(term)
            .case_sensitive(case_sensitive)
            .whole_words(whole_words);
        self.search_with(&criteria).await
    }

    pub async fn search_with(&self, criteria: &SearchCriteria) -> usize {
        let Some(session) = self.session() else {
            debug!("search ignored: controller is not attached");
            return 0;
        };
        let chunks = extract_chunks(session.document.as_ref());
        if chunks.is_empty() {
            debug!("search ignored: document has no text");
            return 0;
        }

        let generation = self.transition(SearchState::begin_search);
        debug!(
            "search {} for {:?} over {} chunk(s)",
            generation,
            criteria.term,
            chunks.len()
        );

        let request = MatchRequest::new(&chunks, criteria);
        let raw = match self.inner.matcher.find_matches(request).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!("search {} failed: {}", generation, err);
                self.transition(|state| (state.abandon_search(generation), ()));
                return 0;
            }
        };

        let sections = self.inner.sections.sections(session.document.as_ref());
        let ranges = map_matches_to_ranges(&chunks, &raw, &sections);

        let mut state = self.inner.state.lock();
        if !state.is_current(generation) {
            debug!(
                "discarding superseded search {} (current {})",
                generation,
                state.generation()
            );
            return 0;
        }
        *state = std::mem::take(&mut *state).with_ranges(ranges);
        session.highlights.set_all(state.ranges().to_vec(), None);
        debug!("search {} found {} match(es)", generation, state.count());
        state.count()
    }

    /// Supersede any in-flight search. Current matches are kept.
    pub fn cancel(&self) {
        self.transition(|state| (state.cancelled(), ()));
        trace!("search cancelled");
    }

    /// Make match `index` active and scroll it into view.
    pub fn set_active(&self, index: Option<usize>) {
        let Some(index) = index else {
            return;
        };
        let session = self.session();
        let from = {
            let mut state = self.inner.state.lock();
            if index >= state.count() {
                return;
            }
            *state = std::mem::take(&mut *state).with_active(Some(index));
            if let Some(session) = &session {
                session.highlights.set_active(Some(index));
            }
            state.ranges()[index].position.from
        };
        if let Some(session) = session {
            session.view.scroll_into_view(from);
        }
    }

    pub fn clear_active(&self) {
        let session = self.session();
        let mut state = self.inner.state.lock();
        *state = std::mem::take(&mut *state).with_active(None);
        if let Some(session) = session {
            session.highlights.set_active(None);
        }
    }

    /// Activate the match after the active one, wrapping around.
    pub fn next_match(&self) -> Option<usize> {
        let index = self.inner.state.lock().next_index()?;
        self.set_active(Some(index));
        Some(index)
    }

    /// Activate the match before the active one, wrapping around.
    pub fn previous_match(&self) -> Option<usize> {
        let index = self.inner.state.lock().previous_index()?;
        self.set_active(Some(index));
        Some(index)
    }

    /// True when there is no active match or the active match may not be replaced.
    pub fn disable_replace(&self) -> bool {
        let Some(session) = self.session() else {
            return true;
        };
        let span = match self.inner.state.lock().active_range() {
            Some(range) => range.position,
            None => return true,
        };
        self.inner
            .protection
            .is_protected(span, session.document.as_ref())
    }

    /// Replace match `index` with `replacement` in one undoable transaction.
    ///
    /// Returns the match count afterwards, or `None` when the replacement was refused.
    pub fn replace_one(&self, replacement: &str, index: usize) -> Option<usize> {
        let Some(session) = self.session() else {
            debug!("replace refused: controller is not attached");
            return None;
        };
        if self.disable_replace() {
            debug!("replace refused: no replaceable active match");
            return None;
        }
        let target = self.inner.state.lock().ranges().get(index).cloned()?;
        let document = session.document.as_ref();
        if self.inner.protection.is_protected(target.position, document) {
            debug!("replace refused: match {} is protected", index);
            return None;
        }

        let delta = replacement.chars().count() as isize - target.position.len() as isize;
        let transaction = Transaction::new()
            .replace(target.position.from, target.position.to, replacement)
            .with_origin(REPLACE_ORIGIN);
        if let Err(err) = document.dispatch(transaction) {
            warn!("replace of match {} failed: {}", index, err);
            return None;
        }

        let mut state = self.inner.state.lock();
        *state = std::mem::take(&mut *state).after_replace(index, delta);
        session
            .highlights
            .set_all(state.ranges().to_vec(), state.active());
        trace!("replaced match {} (delta {})", index, delta);
        Some(state.count())
    }

    /// Replace every match in batches, yielding to the runtime between batches.
    ///
    /// Protected matches are skipped. When the last batch is done the controller is
    /// disposed.
    pub async fn replace_all(&self, replacement: &str) -> ReplaceSummary {
        let mut summary = ReplaceSummary::default();
        let Some(session) = self.session() else {
            debug!("replace all ignored: controller is not attached");
            return summary;
        };
        let started = self.transition(|state| {
            if state.count() == 0 || state.is_replacing() {
                (state, false)
            } else {
                (state.begin_replacing(), true)
            }
        });
        if !started {
            debug!("replace all ignored: no matches or already replacing");
            return summary;
        }

        let document = session.document.as_ref();
        loop {
            let batch: Vec<MatchRange> = {
                let state = self.inner.state.lock();
                if !state.is_replacing() {
                    debug!("replace all interrupted");
                    break;
                }
                state
                    .ranges()
                    .iter()
                    .take(self.inner.batch_size)
                    .cloned()
                    .collect()
            };
            if batch.is_empty() {
                break;
            }

            let protected = self.inner.protection.prepare(document);
            let plan = plan_batch(&batch, replacement, |range| protected(range.position));
            if plan.skipped > 0 {
                debug!("skipping {} protected match(es)", plan.skipped);
            }
            if !plan.transaction.is_empty() {
                if let Err(err) = document.dispatch(plan.transaction) {
                    warn!("replace batch {} failed: {}", summary.batches + 1, err);
                    break;
                }
            }
            summary.replaced += plan.applied;
            summary.skipped += plan.skipped;
            summary.batches += 1;

            let remaining = {
                let mut state = self.inner.state.lock();
                *state = std::mem::take(&mut *state).after_batch(batch.len(), plan.delta);
                session.highlights.set_all(state.ranges().to_vec(), None);
                state.count()
            };
            debug!(
                "replace batch {}: {} replaced, {} remaining",
                summary.batches, plan.applied, remaining
            );
            if remaining == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }

        self.dispose();
        summary
    }

    /// Drop every match, the active match, replace mode and the overlay.
    pub fn dispose(&self) {
        let session = self.session();
        let mut state = self.inner.state.lock();
        *state = std::mem::take(&mut *state).disposed();
        if let Some(session) = session {
            session.highlights.clear();
        }
        trace!("search disposed");
    }

    pub fn matches(&self) -> Vec<MatchRange> {
        self.inner.state.lock().ranges().to_vec()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.inner.state.lock().active()
    }

    pub fn count(&self) -> usize {
        self.inner.state.lock().count()
    }

    pub fn is_in_replace_mode(&self) -> bool {
        self.inner.state.lock().is_replacing()
    }

    pub fn phase(&self) -> SearchPhase {
        self.inner.state.lock().phase()
    }

    pub fn generation(&self) -> u64 {
        self.inner.state.lock().generation()
    }

    /// Copy of the current state snapshot.
    pub fn state(&self) -> SearchState {
        self.inner.state.lock().clone()
    }
}

impl std::fmt::Debug for SearchController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("SearchController")
            .field("generation", &state.generation())
            .field("matches", &state.count())
            .field("active", &state.active())
            .field("phase", &state.phase())
            .finish()
    }
}
