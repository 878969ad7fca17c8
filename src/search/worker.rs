use crate::error::{Result, RichfindError};
use crate::search::matcher::PatternMatcher;
use crate::search::types::{MatchRequest, RawMatch};
use async_trait::async_trait;
use log::{debug, trace};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub type RequestId = u64;

/// Commands accepted by [`matcher_worker_loop`].
#[derive(Debug)]
pub enum MatcherCommand {
    Find {
        request_id: RequestId,
        request: MatchRequest,
        reply: oneshot::Sender<Result<Vec<RawMatch>>>,
    },
    Shutdown,
}

/// Run the background matcher processing commands until shutdown or until every
/// sender is gone.
pub async fn matcher_worker_loop(mut rx: Receiver<MatcherCommand>, matcher: Arc<dyn PatternMatcher>) {
    debug!("matcher worker started");
    while let Some(cmd) = rx.recv().await {
        let outcome = handle_command(matcher.as_ref(), cmd).await;
        if outcome.done {
            break;
        }
    }
    debug!("matcher worker stopped");
}

async fn handle_command(matcher: &dyn PatternMatcher, cmd: MatcherCommand) -> HandlerOutcome {
    match cmd {
        MatcherCommand::Find {
            request_id,
            request,
            reply,
        } => {
            trace!(
                "matcher request {} for {:?} over {} chunk(s)",
                request_id,
                request.search_term,
                request.chunks.len()
            );
            let result = matcher.find_matches(request).await;
            if reply.send(result).is_err() {
                trace!("matcher request {} abandoned by caller", request_id);
            }
            HandlerOutcome::proceed()
        }
        MatcherCommand::Shutdown => HandlerOutcome::exit(),
    }
}

struct HandlerOutcome {
    done: bool,
}

impl HandlerOutcome {
    fn proceed() -> Self {
        Self { done: false }
    }

    fn exit() -> Self {
        Self { done: true }
    }
}

/// [`PatternMatcher`] client for a background [`matcher_worker_loop`].
#[derive(Debug, Clone)]
pub struct WorkerMatcher {
    tx: Sender<MatcherCommand>,
    next_request: Arc<AtomicU64>,
}

impl WorkerMatcher {
    /// Spawn a worker around `matcher` with a command queue of `capacity` entries.
    pub fn spawn(matcher: Arc<dyn PatternMatcher>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(matcher_worker_loop(rx, matcher));
        (
            Self {
                tx,
                next_request: Arc::new(AtomicU64::new(1)),
            },
            worker,
        )
    }

    /// Client for an already running worker.
    pub fn from_sender(tx: Sender<MatcherCommand>) -> Self {
        Self {
            tx,
            next_request: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Ask the worker to stop after the requests queued before this one.
    pub async fn shutdown(&self) -> Result<()> {
        self.tx
            .send(MatcherCommand::Shutdown)
            .await
            .map_err(|_| RichfindError::matcher("matcher worker already stopped"))
    }
}

#[async_trait]
impl PatternMatcher for WorkerMatcher {
    async fn find_matches(&self, request: MatchRequest) -> Result<Vec<RawMatch>> {
        let request_id = self.next_request.fetch_add(1, Ordering::Relaxed);
        let (reply, response) = oneshot::channel();
        self.tx
            .send(MatcherCommand::Find {
                request_id,
                request,
                reply,
            })
            .await
            .map_err(|_| RichfindError::matcher("matcher worker unavailable"))?;
        response
            .await
            .map_err(|_| RichfindError::matcher("matcher worker dropped the request"))?
    }
}
