//! Monospace grid view: the reference [`ViewAdapter`].
//!
//! Lays every text leaf out as one or more fixed-width rows, keeps a vertical scroll
//! offset, and forwards scroll/resize/interaction events to registered listeners.
//! Hosts embed it headless (tests, the CLI) or drive a real renderer from it.

use crate::document::DocumentHost;
use crate::view::{InteractionKind, ListenerGuard, Point, Rect, ViewAdapter, ViewEvent};
use log::trace;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Height of one row in pixels.
pub const LINE_HEIGHT: f64 = 20.0;
/// Width of one column in pixels.
pub const CHAR_WIDTH: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Row {
    start: usize,
    len: usize,
}

#[derive(Debug)]
struct GridLayout {
    rows: Vec<Row>,
    columns: usize,
    width: f64,
    height: f64,
    scroll_top: f64,
}

impl GridLayout {
    fn content_height(&self) -> f64 {
        self.rows.len() as f64 * LINE_HEIGHT
    }

    fn max_scroll(&self) -> f64 {
        (self.content_height() - self.height).max(0.0)
    }

    fn clamp_scroll(&self, y: f64) -> f64 {
        y.clamp(0.0, self.max_scroll())
    }

    fn row_of(&self, pos: usize) -> Option<usize> {
        if self.rows.is_empty() {
            return None;
        }
        Some(self.rows.partition_point(|row| row.start <= pos).saturating_sub(1))
    }
}

type ListenerList = Arc<Mutex<Vec<(u64, UnboundedSender<ViewEvent>)>>>;

/// Headless row-based view over a document.
#[derive(Debug)]
pub struct GridView {
    layout: RwLock<GridLayout>,
    listeners: ListenerList,
    next_listener: AtomicU64,
}

impl GridView {
    /// Create a view showing `visible_rows` rows of `columns` characters.
    pub fn new(columns: usize, visible_rows: usize) -> Self {
        let columns = columns.max(1);
        Self {
            layout: RwLock::new(GridLayout {
                rows: Vec::new(),
                columns,
                width: columns as f64 * CHAR_WIDTH,
                height: visible_rows as f64 * LINE_HEIGHT,
                scroll_top: 0.0,
            }),
            listeners: Arc::new(Mutex::new(Vec::new())),
            next_listener: AtomicU64::new(0),
        }
    }

    /// Rebuild rows from the document's text leaves, wrapping at the column count.
    pub fn relayout(&self, document: &dyn DocumentHost) {
        let mut layout = self.layout.write();
        let columns = layout.columns;
        let mut rows = Vec::new();
        document.walk_text(&mut |start, text| {
            let len = text.chars().count();
            let mut offset = 0;
            while offset < len {
                rows.push(Row {
                    start: start + offset,
                    len: columns.min(len - offset),
                });
                offset += columns;
            }
        });
        layout.rows = rows;
        layout.scroll_top = layout.clamp_scroll(layout.scroll_top);
        trace!("grid relayout: {} rows", layout.rows.len());
    }

    pub fn row_count(&self) -> usize {
        self.layout.read().rows.len()
    }

    pub fn scroll_top(&self) -> f64 {
        self.layout.read().scroll_top
    }

    /// Scroll to an absolute content offset; emits [`ViewEvent::Scroll`] on change.
    pub fn scroll_to(&self, y: f64) {
        let changed = {
            let mut layout = self.layout.write();
            let next = layout.clamp_scroll(y);
            let changed = next != layout.scroll_top;
            layout.scroll_top = next;
            changed
        };
        if changed {
            self.emit(ViewEvent::Scroll);
        }
    }

    /// Scroll by a number of rows (negative scrolls up).
    pub fn scroll_rows(&self, rows: i64) {
        let current = self.scroll_top();
        self.scroll_to(current + rows as f64 * LINE_HEIGHT);
    }

    /// Change the visible size in pixels; emits [`ViewEvent::Resize`].
    pub fn resize(&self, width: f64, height: f64) {
        {
            let mut layout = self.layout.write();
            layout.width = width.max(0.0);
            layout.height = height.max(0.0);
            layout.scroll_top = layout.clamp_scroll(layout.scroll_top);
        }
        self.emit(ViewEvent::Resize);
    }

    /// Report a document-mutating user interaction to listeners.
    pub fn interact(&self, kind: InteractionKind) {
        self.emit(ViewEvent::Interaction(kind));
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    fn emit(&self, event: ViewEvent) {
        self.listeners
            .lock()
            .retain(|(_, sink)| sink.send(event).is_ok());
    }
}

impl ViewAdapter for GridView {
    fn visible_rect(&self) -> Rect {
        let layout = self.layout.read();
        Rect::new(0.0, 0.0, layout.width, layout.height)
    }

    fn position_at(&self, point: Point) -> Option<usize> {
        let layout = self.layout.read();
        let content_y = point.y + layout.scroll_top;
        if content_y < 0.0 {
            return None;
        }
        let row = layout.rows.get((content_y / LINE_HEIGHT) as usize)?;
        let column = (point.x.max(0.0) / CHAR_WIDTH) as usize;
        Some(row.start + column.min(row.len))
    }

    fn scroll_into_view(&self, pos: usize) {
        let target = {
            let layout = self.layout.read();
            let Some(row) = layout.row_of(pos) else {
                return;
            };
            let row_top = row as f64 * LINE_HEIGHT;
            let visible = row_top >= layout.scroll_top
                && row_top + LINE_HEIGHT <= layout.scroll_top + layout.height;
            if visible {
                return;
            }
            // Center the row
            row_top - (layout.height - LINE_HEIGHT) / 2.0
        };
        self.scroll_to(target);
    }

    fn listen(&self, sink: UnboundedSender<ViewEvent>) -> ListenerGuard {
        let id = self.next_listener.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().push((id, sink));
        let listeners = Arc::downgrade(&self.listeners);
        ListenerGuard::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners.lock().retain(|(listener, _)| *listener != id);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::InMemoryDocument;
    use tokio::sync::mpsc;

    fn numbered_doc(lines: usize) -> InMemoryDocument {
        let text: Vec<String> = (0..lines).map(|i| format!("line {:03}", i)).collect();
        InMemoryDocument::from_text(&text.join("\n"))
    }

    #[test]
    fn rows_wrap_at_column_count() {
        let doc = InMemoryDocument::from_text("abcdefghij\nxy");
        let view = GridView::new(4, 10);
        view.relayout(&doc);
        assert_eq!(view.row_count(), 4);
        // "abcdefghij" starts at 1: rows at 1, 5, 9; "xy" starts at 13
        assert_eq!(view.position_at(Point::new(0.0, 0.0)), Some(1));
        assert_eq!(view.position_at(Point::new(8.0, 20.0)), Some(6));
        assert_eq!(view.position_at(Point::new(100.0, 40.0)), Some(11));
        assert_eq!(view.position_at(Point::new(0.0, 60.0)), Some(13));
        assert_eq!(view.position_at(Point::new(0.0, 80.0)), None);
        assert_eq!(view.position_at(Point::new(0.0, -1.0)), None);
    }

    #[test]
    fn scrolling_shifts_resolved_positions() {
        let doc = numbered_doc(100);
        let view = GridView::new(80, 10);
        view.relayout(&doc);
        view.scroll_rows(5);
        assert_eq!(view.scroll_top(), 100.0);
        // Each line "line NNN" occupies 10 positions, text starting at 1
        assert_eq!(view.position_at(Point::new(0.0, 0.0)), Some(51));
    }

    #[test]
    fn scroll_is_clamped_to_content() {
        let doc = numbered_doc(20);
        let view = GridView::new(80, 10);
        view.relayout(&doc);
        view.scroll_to(10_000.0);
        assert_eq!(view.scroll_top(), 200.0);
        view.scroll_to(-50.0);
        assert_eq!(view.scroll_top(), 0.0);
    }

    #[test]
    fn scroll_into_view_centers_offscreen_rows() {
        let doc = numbered_doc(100);
        let view = GridView::new(80, 10);
        view.relayout(&doc);
        view.scroll_into_view(501);
        // Row 50 centred in a 200px viewport
        assert_eq!(view.scroll_top(), 1000.0 - 90.0);

        let before = view.scroll_top();
        view.scroll_into_view(511);
        assert_eq!(view.scroll_top(), before);
    }

    #[test]
    fn listeners_receive_events_until_guard_drops() {
        let doc = numbered_doc(50);
        let view = GridView::new(80, 10);
        view.relayout(&doc);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let guard = view.listen(tx);
        assert_eq!(view.listener_count(), 1);

        view.scroll_rows(1);
        view.resize(640.0, 100.0);
        view.interact(InteractionKind::Paste);
        assert_eq!(rx.try_recv().unwrap(), ViewEvent::Scroll);
        assert_eq!(rx.try_recv().unwrap(), ViewEvent::Resize);
        assert_eq!(
            rx.try_recv().unwrap(),
            ViewEvent::Interaction(InteractionKind::Paste)
        );

        drop(guard);
        assert_eq!(view.listener_count(), 0);
        view.scroll_rows(1);
        assert!(rx.try_recv().is_err());
    }
}
