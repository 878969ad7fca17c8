use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::time::{timeout, Duration};

use richfind::config::HighlightConfig;
use richfind::document::{Document, InMemoryDocument, Node, Span};
use richfind::error::{Result, RichfindError};
use richfind::highlight::HighlightEngine;
use richfind::search::{
    DocumentSession, GrepMatcher, MatchRequest, PatternMatcher, RawMatch, SearchController,
    SearchPhase,
};
use richfind::view::GridView;

const TIMEOUT_MS: u64 = 500;

struct Fixture {
    controller: SearchController,
    document: Arc<InMemoryDocument>,
    highlights: HighlightEngine,
}

fn attach(controller: SearchController, nodes: Vec<Node>) -> Fixture {
    let document = Arc::new(InMemoryDocument::new(Document::new(nodes)));
    let view = Arc::new(GridView::new(80, 20));
    view.relayout(document.as_ref());
    let (highlights, _notices) =
        HighlightEngine::detached(view.clone(), &HighlightConfig::default());
    controller.attach(DocumentSession::new(
        document.clone(),
        view,
        highlights.clone(),
    ));
    Fixture {
        controller,
        document,
        highlights,
    }
}

fn grep_fixture(nodes: Vec<Node>) -> Fixture {
    attach(SearchController::new(Arc::new(GrepMatcher::new())), nodes)
}

fn spans(controller: &SearchController) -> Vec<Span> {
    controller
        .matches()
        .iter()
        .map(|range| range.position)
        .collect()
}

/// Blocks requests for one term until released, answering everything else at once.
struct GatedMatcher {
    gated_term: String,
    gate: Notify,
    calls: AtomicUsize,
}

impl GatedMatcher {
    fn new(gated_term: &str) -> Self {
        Self {
            gated_term: gated_term.to_string(),
            gate: Notify::new(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PatternMatcher for GatedMatcher {
    async fn find_matches(&self, request: MatchRequest) -> Result<Vec<RawMatch>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if request.search_term == self.gated_term {
            self.gate.notified().await;
        }
        GrepMatcher::match_chunks(&request)
    }
}

struct FailingMatcher;

#[async_trait]
impl PatternMatcher for FailingMatcher {
    async fn find_matches(&self, _request: MatchRequest) -> Result<Vec<RawMatch>> {
        Err(RichfindError::matcher("backend offline"))
    }
}

/// Reports matches in reverse order, plus one past the end of its chunk.
struct SloppyMatcher;

#[async_trait]
impl PatternMatcher for SloppyMatcher {
    async fn find_matches(&self, request: MatchRequest) -> Result<Vec<RawMatch>> {
        let mut found = GrepMatcher::match_chunks(&request)?;
        found.reverse();
        found.push(RawMatch {
            chunk_id: 0,
            index: 1000,
            length: 3,
        });
        Ok(found)
    }
}

#[tokio::test]
async fn cat_bat_cat_end_to_end() {
    let fixture = grep_fixture(vec![Node::text("cat bat cat")]);
    let controller = &fixture.controller;

    assert_eq!(controller.search("CAT", false, true).await, 2);
    assert_eq!(spans(controller), vec![Span::new(0, 3), Span::new(8, 11)]);

    controller.set_active(Some(0));
    assert_eq!(controller.replace_one("dog", 0), Some(2));
    assert_eq!(fixture.document.to_text(), "dog bat cat");
    assert_eq!(spans(controller), vec![Span::new(0, 3), Span::new(8, 11)]);

    // Start over from the original text for the bulk replace
    fixture.document.undo().unwrap();
    assert_eq!(controller.search("cat", false, true).await, 2);
    let summary = controller.replace_all("dog").await;
    assert_eq!(summary.replaced, 2);
    assert_eq!(summary.skipped, 0);
    assert_eq!(fixture.document.to_text(), "dog bat dog");
    assert_eq!(controller.count(), 0);
    assert_eq!(controller.active_index(), None);
    assert!(!controller.is_in_replace_mode());
    assert_eq!(controller.phase(), SearchPhase::Disposed);
    assert!(fixture.highlights.snapshot().decorations.is_empty());
}

#[tokio::test]
async fn newer_search_supersedes_pending_one() {
    let matcher = Arc::new(GatedMatcher::new("cat"));
    let fixture = attach(
        SearchController::new(matcher.clone()),
        vec![Node::paragraph("cat bat cat")],
    );

    let slow = {
        let controller = fixture.controller.clone();
        tokio::spawn(async move { controller.search("cat", false, false).await })
    };
    // Wait until the slow search is parked in the matcher
    timeout(Duration::from_millis(TIMEOUT_MS), async {
        while matcher.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("slow search never reached the matcher");

    assert_eq!(fixture.controller.search("bat", false, false).await, 1);
    matcher.gate.notify_one();

    let superseded = timeout(Duration::from_millis(TIMEOUT_MS), slow)
        .await
        .expect("slow search timed out")
        .expect("slow search panicked");
    assert_eq!(superseded, 0);
    assert_eq!(spans(&fixture.controller), vec![Span::new(5, 8)]);
    assert_eq!(fixture.highlights.snapshot().total, 1);
}

#[tokio::test]
async fn cancel_discards_in_flight_results() {
    let matcher = Arc::new(GatedMatcher::new("cat"));
    let fixture = attach(
        SearchController::new(matcher.clone()),
        vec![Node::paragraph("cat")],
    );
    let pending = {
        let controller = fixture.controller.clone();
        tokio::spawn(async move { controller.search("cat", false, false).await })
    };
    timeout(Duration::from_millis(TIMEOUT_MS), async {
        while matcher.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("search never reached the matcher");
    assert_eq!(fixture.controller.phase(), SearchPhase::Searching);

    fixture.controller.cancel();
    matcher.gate.notify_one();
    let count = timeout(Duration::from_millis(TIMEOUT_MS), pending)
        .await
        .expect("search timed out")
        .expect("search panicked");
    assert_eq!(count, 0);
    assert_eq!(fixture.controller.count(), 0);
}

#[tokio::test]
async fn repeated_searches_are_idempotent() {
    let fixture = grep_fixture(vec![
        Node::heading("Cats"),
        Node::paragraph("cat catalogue cat"),
    ]);
    let first = fixture.controller.search("cat", false, false).await;
    let first_matches = fixture.controller.matches();
    let second = fixture.controller.search("cat", false, false).await;
    assert_eq!(first, second);
    assert_eq!(first_matches, fixture.controller.matches());
    assert_eq!(fixture.controller.generation(), 2);
}

#[tokio::test]
async fn matcher_failure_has_no_effect() {
    let fixture = attach(
        SearchController::new(Arc::new(FailingMatcher)),
        vec![Node::paragraph("cat")],
    );
    assert_eq!(fixture.controller.search("cat", false, false).await, 0);
    assert_eq!(fixture.controller.phase(), SearchPhase::Idle);
}

#[tokio::test]
async fn sloppy_matcher_output_is_sorted_and_filtered() {
    let fixture = attach(
        SearchController::new(Arc::new(SloppyMatcher)),
        vec![Node::paragraph("cat bat cat"), Node::paragraph("cat")],
    );
    assert_eq!(fixture.controller.search("cat", false, false).await, 3);
    assert_eq!(
        spans(&fixture.controller),
        vec![Span::new(1, 4), Span::new(9, 12), Span::new(14, 17)]
    );
}

#[tokio::test]
async fn empty_document_searches_nothing() {
    let fixture = grep_fixture(vec![Node::paragraph("")]);
    assert_eq!(fixture.controller.search("cat", false, false).await, 0);
    assert_eq!(fixture.controller.generation(), 0);
}

#[tokio::test]
async fn bulk_replace_runs_in_batches_and_skips_protected_blocks() {
    let mut nodes: Vec<Node> = (0..10).map(|_| Node::paragraph("x cat x")).collect();
    nodes.insert(4, Node::paragraph("cat").protected());
    let controller = SearchController::builder(Arc::new(GrepMatcher::new()))
        .batch_size(3)
        .build();
    let fixture = attach(controller, nodes);

    assert_eq!(fixture.controller.search("cat", false, false).await, 11);
    let summary = timeout(
        Duration::from_millis(TIMEOUT_MS),
        fixture.controller.replace_all("tiger"),
    )
    .await
    .expect("bulk replace timed out");

    assert_eq!(summary.replaced, 10);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.batches, 4);
    let text = fixture.document.to_text();
    assert_eq!(text.matches("tiger").count(), 10);
    assert_eq!(text.lines().nth(4), Some("cat"));
    // Bulk replace does not record undo history
    assert_eq!(fixture.document.history_len(), 0);
    assert_eq!(fixture.controller.phase(), SearchPhase::Disposed);
}

#[tokio::test]
async fn replace_all_refuses_without_matches() {
    let fixture = grep_fixture(vec![Node::paragraph("cat")]);
    let summary = fixture.controller.replace_all("dog").await;
    assert_eq!(summary.replaced, 0);
    assert_eq!(fixture.document.to_text(), "cat");
}

#[tokio::test]
async fn detached_controller_keeps_matches_but_stops_replacing() {
    let fixture = grep_fixture(vec![Node::paragraph("cat")]);
    fixture.controller.search("cat", false, false).await;
    fixture.controller.set_active(Some(0));
    assert!(fixture.controller.detach().is_some());
    assert_eq!(fixture.controller.count(), 1);
    assert_eq!(fixture.controller.replace_one("dog", 0), None);
    assert_eq!(fixture.document.to_text(), "cat");
}
