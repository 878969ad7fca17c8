//! Highlight state and its reducer.
//!
//! The reducer is pure: it never touches a view. The runtime engine measures the
//! viewport and feeds the result in as [`HighlightCommand::Viewport`].

use crate::document::{Assoc, Mapping, Span};
use crate::highlight::window::{visible_span, ViewportWindow};
use crate::search::MatchRange;

/// Default cap on decorations built for one window.
pub const DEFAULT_MAX_DECORATIONS: usize = 2000;

/// Visual class of a decoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecorationClass {
    Match,
    ActiveMatch,
}

impl DecorationClass {
    /// Class name renderers attach to the decorated text.
    pub fn as_str(&self) -> &'static str {
        match self {
            DecorationClass::Match => "search-match",
            DecorationClass::ActiveMatch => "search-match-active",
        }
    }
}

/// Inline highlight over a document span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoration {
    pub span: Span,
    pub class: DecorationClass,
    /// Index of the decorated match in the full list
    pub index: usize,
}

/// Decorations currently rendered, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecorationSet {
    decorations: Vec<Decoration>,
}

impl DecorationSet {
    pub fn new(decorations: Vec<Decoration>) -> Self {
        Self { decorations }
    }

    pub fn len(&self) -> usize {
        self.decorations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decorations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Decoration> {
        self.decorations.iter()
    }

    pub fn as_slice(&self) -> &[Decoration] {
        &self.decorations
    }

    /// Map every decoration through `mapping`. Decorations whose text was deleted
    /// collapse and are dropped.
    pub fn map(&self, mapping: &Mapping) -> Self {
        let decorations = self
            .decorations
            .iter()
            .filter_map(|decoration| {
                let from = mapping.map(decoration.span.from, Assoc::After);
                let to = mapping.map(decoration.span.to, Assoc::Before);
                (from < to).then(|| Decoration {
                    span: Span::new(from, to),
                    ..*decoration
                })
            })
            .collect();
        Self { decorations }
    }
}

/// Commands accepted by [`reduce`].
#[derive(Debug, Clone, PartialEq)]
pub enum HighlightCommand {
    /// Replace the match list. `window` overrides the last rendered window.
    SetAll {
        ranges: Vec<MatchRange>,
        active: Option<usize>,
        window: Option<ViewportWindow>,
    },
    SetActive(Option<usize>),
    Clear,
    /// Move existing decorations through a document change without recomputing.
    Remap(Mapping),
    Viewport(ViewportWindow),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HighlightState {
    all: Vec<MatchRange>,
    active: Option<usize>,
    rendered_window: Option<ViewportWindow>,
    overlay: DecorationSet,
    max_decorations: usize,
}

impl Default for HighlightState {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DECORATIONS)
    }
}

impl HighlightState {
    pub fn new(max_decorations: usize) -> Self {
        Self {
            all: Vec::new(),
            active: None,
            rendered_window: None,
            overlay: DecorationSet::default(),
            max_decorations: max_decorations.max(1),
        }
    }

    pub fn matches(&self) -> &[MatchRange] {
        &self.all
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn rendered_window(&self) -> Option<ViewportWindow> {
        self.rendered_window
    }

    pub fn overlay(&self) -> &DecorationSet {
        &self.overlay
    }

    pub fn max_decorations(&self) -> usize {
        self.max_decorations
    }

    fn rebuild(&mut self) {
        self.overlay = build_overlay(
            &self.all,
            self.active,
            self.rendered_window,
            self.max_decorations,
        );
    }
}

/// Apply one command to `state`.
pub fn reduce(mut state: HighlightState, command: HighlightCommand) -> HighlightState {
    match command {
        HighlightCommand::SetAll {
            ranges,
            active,
            window,
        } => {
            state.active = active.filter(|index| *index < ranges.len());
            state.all = ranges;
            if window.is_some() {
                state.rendered_window = window;
            }
            state.rebuild();
        }
        HighlightCommand::SetActive(active) => {
            state.active = active.filter(|index| *index < state.all.len());
            state.rebuild();
        }
        HighlightCommand::Clear => {
            state = HighlightState::new(state.max_decorations);
        }
        HighlightCommand::Remap(mapping) => {
            state.overlay = state.overlay.map(&mapping);
        }
        HighlightCommand::Viewport(window) => {
            state.rendered_window = Some(window);
            state.rebuild();
        }
    }
    state
}

fn build_overlay(
    all: &[MatchRange],
    active: Option<usize>,
    window: Option<ViewportWindow>,
    cap: usize,
) -> DecorationSet {
    let Some(window) = window else {
        return DecorationSet::default();
    };
    let visible = visible_span(all, window);
    let decorations = all[visible.clone()]
        .iter()
        .zip(visible)
        .take(cap)
        .map(|(range, index)| Decoration {
            span: range.position,
            class: if Some(index) == active {
                DecorationClass::ActiveMatch
            } else {
                DecorationClass::Match
            },
            index,
        })
        .collect();
    DecorationSet::new(decorations)
}
