//! # richfind - Incremental Search and Virtualized Highlighting for Rich Text
//!
//! Search, navigate and replace literal text inside a structured document, and keep
//! match highlighting cheap no matter how many matches there are.
//!
//! ## Features
//!
//! - **Superseding searches**: a newer search silently discards an older in-flight one
//! - **Section tagging**: every match knows the logical section it starts in
//! - **Safe replacement**: single undoable replaces and batched bulk replace that
//!   skips protected blocks
//! - **Virtualized highlighting**: only matches near the viewport are decorated, with
//!   scroll bursts coalesced into one recompute per frame
//!
//! ## Architecture
//!
//! - [`error`] - Centralized error types and handling
//! - [`config`] - Engine tuning, optionally loaded from TOML
//! - [`document`] - Document collaborator trait, positions, transactions
//! - [`view`] - View adapter trait and a headless grid view
//! - [`search`] - Extraction, matching, mapping and the search controller
//! - [`highlight`] - Viewport windowing reducer and runtime engine
//! - [`app`] - Command-line orchestration

// Core modules
pub mod config;
pub mod error;

// Collaborators
pub mod document;
pub mod view;

// Core components
pub mod app;
pub mod highlight;
pub mod search;

// Re-export commonly used types for convenience
pub use error::{Result, RichfindError};

// Public API surface for external usage
pub use config::EngineConfig;
pub use document::{DocumentHost, InMemoryDocument};
pub use highlight::{HighlightEngine, HighlightNotice};
pub use search::{DocumentSession, GrepMatcher, PatternMatcher, SearchController};
pub use view::{GridView, ViewAdapter};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
