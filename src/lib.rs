// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. toolbar::ToolbarState)
    clippy::module_name_repetitions
)]

//! # editbar
//!
//! An accessible formatting toolbar for rich-text editors.
//!
//! The toolbar sits on top of a host document engine and provides:
//! - Bold, italic, underline and strikethrough toggles
//! - Heading (h1-h6) and paragraph blocks, with a list fallback
//! - Bullet and numbered lists
//! - A two-field link dialog
//! - Platform-aware keyboard shortcuts and a shortcut reference panel
//! - Cleaned markup delivered to content-change consumers
//!
//! ## Architecture
//!
//! The toolbar follows The Elm Architecture (TEA) pattern:
//! - **Message**: button presses, key chords and dialog input
//! - **Update**: [`toolbar::Toolbar::handle`] dispatches engine commands
//! - **Effect**: focus changes the host carries out
//!
//! ## Modules
//!
//! - [`toolbar`]: state resolution, command dispatch, shortcuts, link dialog
//! - [`document`]: engine seam traits and the in-memory reference engine
//! - [`markup`]: presentation attribute stripping
//! - [`config`]: platform and variant settings, `.editbarrc` flags
//! - [`app`]: terminal demo host
//! - [`ui`]: terminal rendering for the demo host
//! - [`perf`]: startup timing and debug event log

pub mod app;
pub mod config;
pub mod document;
pub mod markup;
pub mod perf;
pub mod toolbar;
pub mod ui;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Platform, ToolbarConfig, ToolbarVariant};
    pub use crate::document::{
        BlockType, DocumentEngine, DocumentReader, EditingPrimitives, HeadingLevel, InlineFormat,
        ListKind, MemoryDocument,
    };
    pub use crate::markup::clean_markup;
    pub use crate::toolbar::{Effect, KeyboardHub, Message, Toolbar, ToolbarState};
}
