//! Application orchestration layer
//!
//! Wires a loaded document, a headless grid view, the highlight engine and a search
//! controller (backed by a background matcher worker) for one command-line run.

use crate::config::EngineConfig;
use crate::document::{DocumentHost, InMemoryDocument};
use crate::error::{Result, RichfindError};
use crate::highlight::{HighlightEngine, HighlightNotice};
use crate::search::{
    DocumentSession, GrepMatcher, PatternMatcher, ReplaceSummary, SearchController,
    WorkerMatcher,
};
use crate::view::GridView;
use log::{debug, warn};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

const WORKER_QUEUE: usize = 8;

/// What one run should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub term: String,
    pub case_sensitive: bool,
    pub whole_words: bool,
    /// Replacement text; `None` only searches
    pub replace: Option<String>,
    /// Replace only the first match instead of all of them
    pub first_only: bool,
    /// Write the resulting text here instead of printing it
    pub output: Option<PathBuf>,
}

impl RunOptions {
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            case_sensitive: false,
            whole_words: false,
            replace: None,
            first_only: false,
            output: None,
        }
    }
}

/// One match as reported to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchLine {
    pub index: usize,
    pub section: String,
    pub from: usize,
    pub to: usize,
    pub text: String,
}

/// Outcome of a replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    /// `replace_one` result: remaining match count, or `None` if refused
    First(Option<usize>),
    All(ReplaceSummary),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub matches: Vec<MatchLine>,
    /// Decorations in the initial viewport
    pub visible: usize,
    pub replaced: Option<ReplaceOutcome>,
    /// Document text after replacement, unless it was written to a file
    pub text: Option<String>,
}

impl RunReport {
    /// Human-readable summary printed by the binary.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.matches {
            let _ = writeln!(
                out,
                "{:>4}  {:<10} {:>6}..{:<6} {}",
                line.index, line.section, line.from, line.to, line.text
            );
        }
        let _ = writeln!(
            out,
            "{} match(es), {} highlighted in view",
            self.matches.len(),
            self.visible
        );
        match self.replaced {
            Some(ReplaceOutcome::First(Some(remaining))) => {
                let _ = writeln!(out, "replaced first match, {} remaining", remaining);
            }
            Some(ReplaceOutcome::First(None)) => {
                let _ = writeln!(out, "first match is protected, nothing replaced");
            }
            Some(ReplaceOutcome::All(summary)) => {
                let _ = writeln!(
                    out,
                    "replaced {} match(es) in {} batch(es), skipped {} protected",
                    summary.replaced, summary.batches, summary.skipped
                );
            }
            None => {}
        }
        if let Some(text) = &self.text {
            out.push_str("---\n");
            out.push_str(text);
            out.push('\n');
        }
        out
    }
}

/// Application orchestrator - owns the components of one session
pub struct Application {
    document: Arc<InMemoryDocument>,
    view: Arc<GridView>,
    highlights: HighlightEngine,
    notices: UnboundedReceiver<HighlightNotice>,
    controller: SearchController,
    matcher: WorkerMatcher,
    worker: JoinHandle<()>,
}

impl Application {
    /// Load `path` and build a session around it. Must run inside a tokio runtime.
    pub async fn open(path: &Path, config: &EngineConfig, rows: usize, cols: usize) -> Result<Self> {
        let document = InMemoryDocument::load(path).await?;
        Ok(Self::new(document, config, rows, cols))
    }

    pub fn new(document: InMemoryDocument, config: &EngineConfig, rows: usize, cols: usize) -> Self {
        let document = Arc::new(document);
        let view = Arc::new(GridView::new(cols, rows));
        view.relayout(document.as_ref());

        let (highlights, notices) = HighlightEngine::spawn(view.clone(), &config.highlight);
        let backend: Arc<dyn PatternMatcher> = Arc::new(GrepMatcher::new());
        let (matcher, worker) = WorkerMatcher::spawn(backend, WORKER_QUEUE);
        let controller = SearchController::builder(Arc::new(matcher.clone()))
            .config(config)
            .build();
        controller.attach(DocumentSession::new(
            document.clone(),
            view.clone(),
            highlights.clone(),
        ));

        Self {
            document,
            view,
            highlights,
            notices,
            controller,
            matcher,
            worker,
        }
    }

    pub fn controller(&self) -> &SearchController {
        &self.controller
    }

    pub fn document(&self) -> &InMemoryDocument {
        &self.document
    }

    pub fn view(&self) -> &GridView {
        &self.view
    }

    /// Search, optionally replace, and report.
    pub async fn run(&mut self, options: &RunOptions) -> Result<RunReport> {
        let count = self
            .controller
            .search(&options.term, options.case_sensitive, options.whole_words)
            .await;
        debug!("{} match(es) for {:?}", count, options.term);

        let matches = self
            .controller
            .matches()
            .iter()
            .enumerate()
            .map(|(index, range)| MatchLine {
                index,
                section: range.section.to_string(),
                from: range.position.from,
                to: range.position.to,
                text: self
                    .document
                    .text_between(range.position.from, range.position.to)
                    .unwrap_or_default(),
            })
            .collect();
        let visible = self.highlights.snapshot().decorations.len();

        let replaced = match &options.replace {
            None => None,
            Some(_) if count == 0 => None,
            Some(replacement) if options.first_only => {
                self.controller.set_active(Some(0));
                Some(ReplaceOutcome::First(
                    self.controller.replace_one(replacement, 0),
                ))
            }
            Some(replacement) => Some(ReplaceOutcome::All(
                self.controller.replace_all(replacement).await,
            )),
        };

        while let Ok(notice) = self.notices.try_recv() {
            warn!("highlights invalidated during run: {:?}", notice);
        }

        let text = match (&options.replace, &options.output) {
            (Some(_), Some(path)) => {
                tokio::fs::write(path, self.document.to_text()).await?;
                None
            }
            (Some(_), None) => Some(self.document.to_text()),
            (None, _) => None,
        };

        Ok(RunReport {
            matches,
            visible,
            replaced,
            text,
        })
    }

    /// Stop the matcher worker and tear the highlight engine down.
    ///
    /// Fails when the worker task panicked or was cancelled.
    pub async fn shutdown(self) -> Result<()> {
        self.controller.detach();
        self.highlights.teardown();
        if let Err(err) = self.matcher.shutdown().await {
            warn!("{}", err);
        }
        self.worker.await.map_err(|err| {
            RichfindError::other(format!("matcher worker ended abnormally: {}", err))
        })
    }
}
