//! Runtime half of the highlight engine: view events, document updates, frame
//! scheduling, teardown.
//!
//! Updates from a tracked document are queued by the host while it applies them and
//! drained before every command, frame and snapshot. Decorations therefore follow
//! edits made outside the search controller, and a later command never sees an
//! earlier update applied after it. Updates tagged with [`REPLACE_ORIGIN`] are
//! skipped: the controller republishes its own ranges after every replace.

use crate::config::HighlightConfig;
use crate::document::{DocumentHost, DocumentUpdate, Mapping};
use crate::highlight::scheduler::FrameScheduler;
use crate::highlight::state::{reduce, Decoration, HighlightCommand, HighlightState};
use crate::highlight::window::ViewportWindow;
use crate::search::{MatchRange, REPLACE_ORIGIN};
use crate::view::{InteractionKind, ListenerGuard, ViewAdapter, ViewEvent};
use log::{debug, trace};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Instant;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

/// Notifications the engine sends to its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightNotice {
    /// A user interaction mutated the document; the match list was dropped and the
    /// owner should search again.
    Invalidated { cause: InteractionKind },
}

/// Result of running a pending frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// No frame was due
    Idle,
    /// The window moved less than the stability tolerance
    Skipped,
    Recomputed,
}

/// What a renderer needs to draw the overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightSnapshot {
    pub decorations: Vec<Decoration>,
    pub active: Option<usize>,
    pub window: Option<ViewportWindow>,
    pub total: usize,
}

/// Handle to a highlight engine. Clones share one engine; dropping the last handle
/// tears it down.
#[derive(Clone)]
pub struct HighlightEngine {
    shared: Arc<EngineShared>,
}

struct EngineShared {
    core: Mutex<EngineCore>,
    lifecycle: Mutex<Lifecycle>,
    view: Arc<dyn ViewAdapter>,
    notices: UnboundedSender<HighlightNotice>,
    buffer_px: f64,
    stability_tolerance: usize,
}

struct EngineCore {
    state: HighlightState,
    frames: FrameScheduler,
    updates: Option<UnboundedReceiver<DocumentUpdate>>,
    torn_down: bool,
}

impl EngineCore {
    fn drain_updates(&mut self) {
        let Some(updates) = self.updates.as_mut() else {
            return;
        };
        while let Ok(update) = updates.try_recv() {
            if update.origin == Some(REPLACE_ORIGIN) {
                continue;
            }
            trace!("remapping decorations to document version {}", update.version);
            let state = std::mem::take(&mut self.state);
            self.state = reduce(state, HighlightCommand::Remap(update.mapping));
        }
    }
}

#[derive(Default)]
struct Lifecycle {
    task: Option<JoinHandle<()>>,
    listener: Option<ListenerGuard>,
    document: Option<ListenerGuard>,
}

impl HighlightEngine {
    /// Create an engine that listens to `view` on a background task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        view: Arc<dyn ViewAdapter>,
        config: &HighlightConfig,
    ) -> (Self, UnboundedReceiver<HighlightNotice>) {
        let (engine, notices) = Self::detached(view, config);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let listener = engine.shared.view.listen(events_tx);
        let task = tokio::spawn(run_event_loop(Arc::downgrade(&engine.shared), events_rx));
        {
            let mut lifecycle = engine.shared.lifecycle.lock();
            lifecycle.listener = Some(listener);
            lifecycle.task = Some(task);
        }
        debug!("highlight engine started");
        (engine, notices)
    }

    /// Create an engine without a listener or background task. The owner forwards
    /// view events through [`HighlightEngine::handle_event`] and drives frames with
    /// [`HighlightEngine::run_pending_frame`].
    pub fn detached(
        view: Arc<dyn ViewAdapter>,
        config: &HighlightConfig,
    ) -> (Self, UnboundedReceiver<HighlightNotice>) {
        let (notices, notices_rx) = mpsc::unbounded_channel();
        let shared = EngineShared {
            core: Mutex::new(EngineCore {
                state: HighlightState::new(config.max_decorations),
                frames: FrameScheduler::new(config.frame_interval()),
                updates: None,
                torn_down: false,
            }),
            lifecycle: Mutex::new(Lifecycle::default()),
            view,
            notices,
            buffer_px: config.buffer_px,
            stability_tolerance: config.stability_tolerance,
        };
        (
            Self {
                shared: Arc::new(shared),
            },
            notices_rx,
        )
    }

    /// Replace the match list and decorate the current window immediately.
    pub fn set_all(&self, ranges: Vec<MatchRange>, active: Option<usize>) {
        let window = self.shared.measure();
        self.shared.apply(HighlightCommand::SetAll {
            ranges,
            active,
            window: Some(window),
        });
    }

    pub fn set_active(&self, active: Option<usize>) {
        self.shared.apply(HighlightCommand::SetActive(active));
    }

    pub fn clear(&self) {
        self.shared.apply(HighlightCommand::Clear);
    }

    /// Follow updates of `document`, replacing any previously tracked document.
    pub fn track(&self, document: &dyn DocumentHost) {
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        let guard = document.subscribe(updates_tx);
        {
            let mut core = self.shared.core.lock();
            if core.torn_down {
                return;
            }
            core.drain_updates();
            core.updates = Some(updates_rx);
        }
        let previous = self.shared.lifecycle.lock().document.replace(guard);
        drop(previous);
        debug!("highlight engine tracking document updates");
    }

    /// Stop following the tracked document.
    pub fn untrack(&self) {
        let guard = self.shared.lifecycle.lock().document.take();
        drop(guard);
        let mut core = self.shared.core.lock();
        core.drain_updates();
        core.updates = None;
    }

    pub fn is_tracking(&self) -> bool {
        self.shared.lifecycle.lock().document.is_some()
    }

    /// Carry existing decorations through a document change.
    pub fn remap(&self, mapping: &Mapping) {
        self.shared.apply(HighlightCommand::Remap(mapping.clone()));
    }

    /// Measure the window and recompute decorations now, ignoring the tolerance.
    pub fn refresh(&self) {
        let window = self.shared.measure();
        self.shared.apply(HighlightCommand::Viewport(window));
    }

    pub fn handle_event(&self, event: ViewEvent) {
        self.shared.handle_event(event);
    }

    /// Run the pending frame if its deadline has passed.
    pub fn run_pending_frame(&self) -> FrameOutcome {
        self.shared.run_frame(Instant::now())
    }

    pub fn frame_pending(&self) -> bool {
        self.shared.core.lock().frames.is_pending()
    }

    pub fn snapshot(&self) -> HighlightSnapshot {
        let mut core = self.shared.core.lock();
        core.drain_updates();
        HighlightSnapshot {
            decorations: core.state.overlay().as_slice().to_vec(),
            active: core.state.active(),
            window: core.state.rendered_window(),
            total: core.state.matches().len(),
        }
    }

    /// Cancel the pending frame, stop the event task and detach from the view.
    pub fn teardown(&self) {
        self.shared.teardown();
    }

    pub fn is_torn_down(&self) -> bool {
        self.shared.core.lock().torn_down
    }
}

impl std::fmt::Debug for HighlightEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let core = self.shared.core.lock();
        f.debug_struct("HighlightEngine")
            .field("matches", &core.state.matches().len())
            .field("decorations", &core.state.overlay().len())
            .field("torn_down", &core.torn_down)
            .finish()
    }
}

impl EngineShared {
    fn measure(&self) -> ViewportWindow {
        ViewportWindow::measure(self.view.as_ref(), self.buffer_px, usize::MAX)
    }

    fn apply(&self, command: HighlightCommand) {
        let mut core = self.core.lock();
        if core.torn_down {
            trace!("ignoring highlight command after teardown");
            return;
        }
        core.drain_updates();
        let state = std::mem::take(&mut core.state);
        core.state = reduce(state, command);
    }

    fn handle_event(&self, event: ViewEvent) {
        match event {
            ViewEvent::Scroll | ViewEvent::Resize => {
                let mut core = self.core.lock();
                if !core.torn_down && core.frames.request(Instant::now()) {
                    trace!("frame requested by {:?}", event);
                }
            }
            ViewEvent::Interaction(cause) => self.invalidate(cause),
        }
    }

    fn invalidate(&self, cause: InteractionKind) {
        {
            let mut core = self.core.lock();
            if core.torn_down {
                return;
            }
            let state = std::mem::take(&mut core.state);
            core.state = reduce(state, HighlightCommand::Clear);
            core.frames.cancel();
        }
        debug!("highlights invalidated by {:?}", cause);
        if self
            .notices
            .send(HighlightNotice::Invalidated { cause })
            .is_err()
        {
            trace!("no receiver for invalidation notice");
        }
    }

    fn run_frame(&self, now: Instant) -> FrameOutcome {
        if !self.core.lock().frames.take_due(now) {
            return FrameOutcome::Idle;
        }
        let window = self.measure();
        let mut core = self.core.lock();
        if core.torn_down {
            return FrameOutcome::Idle;
        }
        core.drain_updates();
        if let Some(rendered) = core.state.rendered_window() {
            if rendered.is_near(&window, self.stability_tolerance) {
                trace!("skipping stable frame {:?}", window);
                return FrameOutcome::Skipped;
            }
        }
        let state = std::mem::take(&mut core.state);
        core.state = reduce(state, HighlightCommand::Viewport(window));
        trace!(
            "frame recomputed {:?}: {} decoration(s)",
            window,
            core.state.overlay().len()
        );
        FrameOutcome::Recomputed
    }

    fn teardown(&self) {
        let (task, listener, document) = {
            let mut lifecycle = self.lifecycle.lock();
            (
                lifecycle.task.take(),
                lifecycle.listener.take(),
                lifecycle.document.take(),
            )
        };
        drop(listener);
        drop(document);
        if let Some(task) = task {
            task.abort();
        }
        let mut core = self.core.lock();
        if !core.torn_down {
            core.frames.cancel();
            core.updates = None;
            let max = core.state.max_decorations();
            core.state = HighlightState::new(max);
            core.torn_down = true;
            debug!("highlight engine torn down");
        }
    }
}

impl Drop for EngineShared {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn run_event_loop(shared: Weak<EngineShared>, mut events: UnboundedReceiver<ViewEvent>) {
    loop {
        let deadline = match shared.upgrade() {
            Some(engine) => engine.core.lock().frames.deadline(),
            None => break,
        };
        let wake = deadline
            .map(tokio::time::Instant::from_std)
            .unwrap_or_else(tokio::time::Instant::now);

        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                let Some(engine) = shared.upgrade() else { break };
                engine.handle_event(event);
            }
            _ = tokio::time::sleep_until(wake), if deadline.is_some() => {
                let Some(engine) = shared.upgrade() else { break };
                engine.run_frame(Instant::now());
            }
        }
    }
    trace!("highlight event loop finished");
}
