//! In-memory document host with undo history.
//!
//! This is the reference [`DocumentHost`]: a [`Document`] behind a `parking_lot`
//! lock, plus an undo stack fed by every transaction that records history.
//! Subscribers receive a [`DocumentUpdate`] for every dispatch and undo.

use crate::document::transaction::{Mapping, Transaction};
use crate::document::tree::Document;
use crate::document::{BlockInfo, DocumentHost, DocumentUpdate};
use crate::error::{Result, RichfindError};
use crate::view::ListenerGuard;
use log::{debug, trace};
use parking_lot::{Mutex, RwLock};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

type SubscriberList = Arc<Mutex<Vec<(u64, UnboundedSender<DocumentUpdate>)>>>;

/// Shared, lock-protected document with an undo stack.
#[derive(Debug, Default)]
pub struct InMemoryDocument {
    inner: RwLock<DocumentState>,
    subscribers: SubscriberList,
    next_subscriber: AtomicU64,
}

#[derive(Debug, Default)]
struct DocumentState {
    document: Document,
    undo: Vec<Transaction>,
    version: u64,
}

impl InMemoryDocument {
    pub fn new(document: Document) -> Self {
        Self {
            inner: RwLock::new(DocumentState {
                document,
                undo: Vec::new(),
                version: 0,
            }),
            subscribers: Arc::new(Mutex::new(Vec::new())),
            next_subscriber: AtomicU64::new(0),
        }
    }

    pub fn from_text(text: &str) -> Self {
        Self::new(Document::from_text(text))
    }

    /// Load a text file as a document (see [`Document::from_text`]).
    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path).await.map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                RichfindError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                RichfindError::file_error(format!("Failed to read {}", path.display()), err)
            }
        })?;
        Ok(Self::from_text(&text))
    }

    /// Copy of the current document
    pub fn snapshot(&self) -> Document {
        self.inner.read().document.clone()
    }

    pub fn to_text(&self) -> String {
        self.inner.read().document.to_text()
    }

    /// Number of dispatched transactions (including undos)
    pub fn version(&self) -> u64 {
        self.inner.read().version
    }

    /// Number of undoable transactions
    pub fn history_len(&self) -> usize {
        self.inner.read().undo.len()
    }

    /// Revert the most recent history-recording transaction.
    ///
    /// Returns the mapping of the revert, or `None` when there is nothing to undo.
    pub fn undo(&self) -> Result<Option<Mapping>> {
        let mut state = self.inner.write();
        let Some(inverse) = state.undo.pop() else {
            return Ok(None);
        };
        let applied = match state.document.apply(&inverse) {
            Ok(applied) => applied,
            Err(err) => {
                state.undo.push(inverse);
                return Err(err);
            }
        };
        state.document = applied.document;
        state.version += 1;
        self.publish(&applied.mapping, None, state.version);
        Ok(Some(applied.mapping))
    }

    /// Number of registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    // Called with the document write lock held so updates arrive in order
    fn publish(&self, mapping: &Mapping, origin: Option<&'static str>, version: u64) {
        let update = DocumentUpdate {
            mapping: mapping.clone(),
            origin,
            version,
        };
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|(_, sink)| sink.send(update.clone()).is_ok());
        trace!(
            "published version {} to {} subscriber(s)",
            version,
            subscribers.len()
        );
    }
}

impl DocumentHost for InMemoryDocument {
    fn size(&self) -> usize {
        self.inner.read().document.size()
    }

    fn walk_text(&self, visit: &mut dyn FnMut(usize, &str)) {
        self.inner.read().document.walk_text(visit);
    }

    fn walk_blocks(&self, visit: &mut dyn FnMut(&BlockInfo<'_>)) {
        self.inner.read().document.walk_blocks(visit);
    }

    fn text_between(&self, from: usize, to: usize) -> Option<String> {
        self.inner.read().document.text_between(from, to)
    }

    fn dispatch(&self, transaction: Transaction) -> Result<Mapping> {
        let mut state = self.inner.write();
        let applied = state.document.apply(&transaction)?;
        state.document = applied.document;
        state.version += 1;
        if transaction.records_history() && !applied.inverse.is_empty() {
            state.undo.push(applied.inverse);
        }
        self.publish(&applied.mapping, transaction.origin(), state.version);
        debug!(
            "dispatched {} step(s), version {}, history {}",
            transaction.len(),
            state.version,
            transaction.records_history()
        );
        Ok(applied.mapping)
    }

    fn subscribe(&self, sink: UnboundedSender<DocumentUpdate>) -> ListenerGuard {
        let id = self.next_subscriber.fetch_add(1, Ordering::Relaxed);
        self.subscribers.lock().push((id, sink));
        let subscribers = Arc::downgrade(&self.subscribers);
        ListenerGuard::new(move || {
            if let Some(subscribers) = subscribers.upgrade() {
                subscribers.lock().retain(|(subscriber, _)| *subscriber != id);
            }
        })
    }
}
