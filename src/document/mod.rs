//! Document engine seam.
//!
//! The toolbar never owns nodes. It reads the tree through
//! [`DocumentReader`] and requests mutations through [`EditingPrimitives`]
//! inside an atomic [`DocumentEngine::update`] transaction.
//!
//! [`memory`] provides an in-memory reference engine used by the terminal
//! host and the test suite.

pub mod memory;
mod types;

pub use memory::{MemoryDocument, Theme};
pub use types::{
    BlockType, EngineEvent, HeadingLevel, InlineFormat, LinkAttributes, ListKind, NodeId,
    NodeKind, Point, RangeSelection, Selection, TextFormat,
};

/// Errors reported by a document engine or its adapter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    #[error("node {0} does not exist")]
    MissingNode(NodeId),
    #[error("node {0} is detached from the document")]
    DetachedNode(NodeId),
    #[error("node {0} is not a text node")]
    NotText(NodeId),
    #[error("offset {offset} is out of bounds for node {node}")]
    OffsetOutOfBounds { node: NodeId, offset: usize },
    #[error("no range selection")]
    NoSelection,
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
}

/// Read access to the document tree and selection.
pub trait DocumentReader {
    /// The current selection, if any.
    fn selection(&self) -> Option<Selection>;

    fn root(&self) -> NodeId;

    /// The node's kind.
    ///
    /// # Errors
    /// Returns an error if the node does not exist.
    fn kind(&self, node: NodeId) -> Result<NodeKind, DocumentError>;

    /// The node's parent, `None` for the root.
    ///
    /// # Errors
    /// Returns an error if the node does not exist or has been detached.
    fn parent(&self, node: NodeId) -> Result<Option<NodeId>, DocumentError>;

    /// The node's children in document order.
    ///
    /// # Errors
    /// Returns an error if the node does not exist.
    fn children(&self, node: NodeId) -> Result<Vec<NodeId>, DocumentError>;

    /// Plain text covered by `range`.
    ///
    /// # Errors
    /// Returns an error if either endpoint is invalid.
    fn text_content(&self, range: &RangeSelection) -> Result<String, DocumentError>;

    /// Whether every character covered by `range` carries `format`.
    ///
    /// # Errors
    /// Returns an error if either endpoint is invalid.
    fn has_format(&self, range: &RangeSelection, format: TextFormat) -> Result<bool, DocumentError>;

    /// Serialized markup for the whole document, presentation attributes
    /// included.
    ///
    /// # Errors
    /// Returns an error if the tree cannot be walked.
    fn generate_markup(&self) -> Result<String, DocumentError>;
}

/// Named editing primitives. Only callable inside a transaction.
pub trait EditingPrimitives: DocumentReader {
    /// Toggle `format` over the selection (or the caret's pending format).
    ///
    /// # Errors
    /// Returns an error if there is no range selection.
    fn format_text(&mut self, format: TextFormat) -> Result<(), DocumentError>;

    /// Replace every block touched by the selection with `block`.
    ///
    /// # Errors
    /// Returns an error if a touched block cannot be retyped.
    fn set_blocks_type(&mut self, block: BlockType) -> Result<(), DocumentError>;

    /// Insert a fresh `block` at the selection, leaving the anchor where it was.
    ///
    /// # Errors
    /// Returns an error if there is no selection to insert at.
    fn insert_block(&mut self, block: BlockType) -> Result<(), DocumentError>;

    /// Turn the selected blocks into a list of `kind`.
    ///
    /// # Errors
    /// Returns an error if there is no range selection.
    fn insert_list(&mut self, kind: ListKind) -> Result<(), DocumentError>;

    /// Unwrap the lists touched by the selection back into paragraphs.
    ///
    /// # Errors
    /// Returns an error if there is no range selection.
    fn remove_list(&mut self) -> Result<(), DocumentError>;

    /// Insert `text` at the selection, replacing a non-collapsed range.
    ///
    /// # Errors
    /// Returns an error if there is no range selection.
    fn insert_text(&mut self, text: &str) -> Result<(), DocumentError>;

    /// Move the focus `chars` characters backward, keeping the anchor.
    ///
    /// # Errors
    /// Returns an error if there is no range selection.
    fn extend_selection_backward(&mut self, chars: usize) -> Result<(), DocumentError>;

    /// Decorate the selection as a link, or strip links when `link` is `None`.
    ///
    /// # Errors
    /// Returns an error if there is no range selection.
    fn toggle_link(&mut self, link: Option<&LinkAttributes>) -> Result<(), DocumentError>;
}

/// A shared document engine instance.
pub trait DocumentEngine: DocumentReader {
    /// Run `f` as one atomic transaction.
    ///
    /// Either every mutation made by `f` is committed (and a
    /// [`EngineEvent::DocumentUpdated`] is queued), or none is.
    ///
    /// # Errors
    /// Returns whatever `f` returns; the document is left untouched then.
    fn update<T, F>(&mut self, f: F) -> Result<T, DocumentError>
    where
        F: FnOnce(&mut dyn EditingPrimitives) -> Result<T, DocumentError>;

    /// Notifications queued since the last drain, oldest first.
    fn drain_events(&mut self) -> Vec<EngineEvent>;
}
