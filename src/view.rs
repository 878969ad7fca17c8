//! View adapter seam.
//!
//! Whatever the highlight engine and the search controller need from a rendered view
//! goes through [`ViewAdapter`]: the visible rectangle, screen-to-position resolution,
//! scrolling and view events.

pub mod grid;

pub use grid::GridView;

use tokio::sync::mpsc::UnboundedSender;

/// A point in screen coordinates (pixels).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in screen coordinates (pixels).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// User input that mutates the document outside the search core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    KeyPress,
    Paste,
    Drop,
}

/// Events a view reports to its listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEvent {
    Scroll,
    Resize,
    Interaction(InteractionKind),
}

/// Detaches a view listener when dropped.
pub struct ListenerGuard {
    detach: Option<Box<dyn FnOnce() + Send>>,
}

impl ListenerGuard {
    pub fn new(detach: impl FnOnce() + Send + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// Guard for views that never emit events.
    pub fn noop() -> Self {
        Self { detach: None }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl std::fmt::Debug for ListenerGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerGuard")
            .field("attached", &self.detach.is_some())
            .finish()
    }
}

/// Rendered view of a document.
pub trait ViewAdapter: Send + Sync {
    /// Currently visible rectangle of the view, in screen coordinates
    fn visible_rect(&self) -> Rect;

    /// Document position rendered at `point`, or `None` outside the content
    fn position_at(&self, point: Point) -> Option<usize>;

    /// Scroll so that `pos` is visible
    fn scroll_into_view(&self, pos: usize);

    /// Register `sink` for scroll, resize and interaction events until the returned
    /// guard is dropped.
    fn listen(&self, sink: UnboundedSender<ViewEvent>) -> ListenerGuard;
}
