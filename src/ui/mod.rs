//! Terminal UI for the demo host.
//!
//! - [`render`]: toolbar row, document or preview pane, docs panel, status line
//! - link dialog overlay drawn on top when open

mod document;
mod overlays;
mod render;
mod toolbar_row;

pub use document::{DocumentView, document_view};
pub use overlays::link_dialog_rect;
pub use render::{render, split_main_columns, split_screen};
pub use toolbar_row::{button_at, button_slots};

pub const DOCS_WIDTH_PERCENT: u16 = 40;
