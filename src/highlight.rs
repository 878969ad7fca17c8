//! Virtualized highlight engine.
//!
//! Only matches inside the visible window (plus a pixel buffer) get decorations, so
//! the cost of rendering a search does not grow with the number of matches. The
//! state transitions live in a pure reducer ([`reduce`]); [`HighlightEngine`] wires
//! it to a [`ViewAdapter`](crate::view::ViewAdapter), coalescing scroll and resize
//! bursts into one recompute per frame.

pub mod engine;
pub mod scheduler;
pub mod state;
pub mod window;

pub use engine::{FrameOutcome, HighlightEngine, HighlightNotice, HighlightSnapshot};
pub use scheduler::FrameScheduler;
pub use state::{
    reduce, Decoration, DecorationClass, DecorationSet, HighlightCommand, HighlightState,
    DEFAULT_MAX_DECORATIONS,
};
pub use window::{visible_span, ViewportWindow};
