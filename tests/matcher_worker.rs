use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{timeout, Duration};

use richfind::document::{Document, InMemoryDocument, Node};
use richfind::search::{
    extract_chunks, matcher_worker_loop, GrepMatcher, MatchRequest, MatcherCommand,
    PatternMatcher, RawMatch, SearchCriteria, WorkerMatcher,
};

const TIMEOUT_MS: u64 = 500;

fn request(text: &str, criteria: SearchCriteria) -> MatchRequest {
    let document = InMemoryDocument::new(Document::new(vec![Node::paragraph(text)]));
    MatchRequest::new(&extract_chunks(&document), &criteria)
}

#[tokio::test]
async fn worker_answers_find_commands() {
    let (cmd_tx, cmd_rx) = mpsc::channel(4);
    let worker = tokio::spawn(matcher_worker_loop(cmd_rx, Arc::new(GrepMatcher::new())));

    let (reply, response) = oneshot::channel();
    cmd_tx
        .send(MatcherCommand::Find {
            request_id: 7,
            request: request("cat bat cat", SearchCriteria::new("cat")),
            reply,
        })
        .await
        .unwrap();

    let matches = timeout(Duration::from_millis(TIMEOUT_MS), response)
        .await
        .expect("worker response timed out")
        .expect("worker dropped the reply")
        .expect("matching failed");
    assert_eq!(
        matches,
        vec![
            RawMatch {
                chunk_id: 0,
                index: 0,
                length: 3
            },
            RawMatch {
                chunk_id: 0,
                index: 8,
                length: 3
            },
        ]
    );

    cmd_tx.send(MatcherCommand::Shutdown).await.unwrap();
    worker.await.unwrap();
}

#[tokio::test]
async fn worker_survives_abandoned_requests() {
    let (cmd_tx, cmd_rx) = mpsc::channel(4);
    let worker = tokio::spawn(matcher_worker_loop(cmd_rx, Arc::new(GrepMatcher::new())));

    let (reply, response) = oneshot::channel();
    drop(response);
    cmd_tx
        .send(MatcherCommand::Find {
            request_id: 1,
            request: request("abc", SearchCriteria::new("b")),
            reply,
        })
        .await
        .unwrap();

    let client = WorkerMatcher::from_sender(cmd_tx.clone());
    let matches = timeout(
        Duration::from_millis(TIMEOUT_MS),
        client.find_matches(request("abc", SearchCriteria::new("c"))),
    )
    .await
    .expect("worker response timed out")
    .expect("matching failed");
    assert_eq!(matches.len(), 1);

    client.shutdown().await.unwrap();
    timeout(Duration::from_millis(TIMEOUT_MS), worker)
        .await
        .expect("worker did not stop")
        .unwrap();
}

#[tokio::test]
async fn worker_stops_when_all_senders_drop() {
    let (matcher, worker) = WorkerMatcher::spawn(Arc::new(GrepMatcher::new()), 2);
    drop(matcher);
    timeout(Duration::from_millis(TIMEOUT_MS), worker)
        .await
        .expect("worker did not stop")
        .unwrap();
}

#[tokio::test]
async fn client_reports_stopped_worker() {
    let (matcher, worker) = WorkerMatcher::spawn(Arc::new(GrepMatcher::new()), 2);
    matcher.shutdown().await.unwrap();
    worker.await.unwrap();

    let err = matcher
        .find_matches(request("cat", SearchCriteria::new("cat")))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("matcher worker"));
}
