//! Selection state resolution.
//!
//! [`resolve`] derives a fresh [`ToolbarState`] from the engine's current
//! selection. It never mutates anything, so calling it once per
//! notification (document updates and selection changes both trigger it)
//! is harmless even when both fire for the same change.

use crate::document::{
    DocumentError, DocumentReader, HeadingLevel, ListKind, NodeId, NodeKind, Selection,
    TextFormat,
};

use super::ToolbarState;

/// Nodes examined (the anchor counts as the first) when looking for an
/// enclosing list.
pub const MAX_ANCESTOR_STEPS: usize = 10;

/// Resolve the toolbar state for `doc`'s current selection.
///
/// Any traversal failure yields the default state, never a partial one.
pub fn resolve<D: DocumentReader + ?Sized>(doc: &D) -> ToolbarState {
    match try_resolve(doc) {
        Ok(state) => state,
        Err(err) => {
            tracing::trace!(%err, "selection resolution failed; toolbar state reset");
            ToolbarState::default()
        }
    }
}

fn try_resolve<D: DocumentReader + ?Sized>(doc: &D) -> Result<ToolbarState, DocumentError> {
    let Some(Selection::Range(range)) = doc.selection() else {
        return Ok(ToolbarState::default());
    };

    let mut state = ToolbarState::default();
    // Inline flags only reflect real selected text, never the caret.
    if !range.is_collapsed() && !doc.text_content(&range)?.is_empty() {
        state.bold = doc.has_format(&range, TextFormat::BOLD)?;
        state.italic = doc.has_format(&range, TextFormat::ITALIC)?;
        state.underline = doc.has_format(&range, TextFormat::UNDERLINE)?;
        state.strikethrough = doc.has_format(&range, TextFormat::STRIKETHROUGH)?;
    }

    let anchor = range.anchor.node;
    state.heading = heading_at(doc, anchor)?;
    state.list = enclosing_list(doc, anchor)?;
    Ok(state)
}

/// Heading level of `node` itself or its immediate parent.
///
/// # Errors
/// Returns an error if the node or its parent cannot be read.
pub fn heading_at<D: DocumentReader + ?Sized>(
    doc: &D,
    node: NodeId,
) -> Result<Option<HeadingLevel>, DocumentError> {
    for ancestor in Ancestors::new(doc, node).take(2) {
        if let NodeKind::Heading(level) = doc.kind(ancestor?)? {
            return Ok(Some(level));
        }
    }
    Ok(None)
}

/// Kind of the list enclosing `node`, found through a list item within
/// [`MAX_ANCESTOR_STEPS`].
///
/// # Errors
/// Returns an error if a node on the walk cannot be read.
pub fn enclosing_list<D: DocumentReader + ?Sized>(
    doc: &D,
    node: NodeId,
) -> Result<Option<ListKind>, DocumentError> {
    let mut in_item = false;
    for ancestor in Ancestors::new(doc, node).take(MAX_ANCESTOR_STEPS) {
        match doc.kind(ancestor?)? {
            NodeKind::ListItem => in_item = true,
            NodeKind::List(kind) if in_item => return Ok(Some(kind)),
            _ => {}
        }
    }
    Ok(None)
}

/// `node` followed by its ancestors, fetched lazily so a bounded walk never
/// touches nodes beyond its bound.
struct Ancestors<'a, D: ?Sized> {
    doc: &'a D,
    current: Option<NodeId>,
    started: bool,
}

impl<'a, D: DocumentReader + ?Sized> Ancestors<'a, D> {
    const fn new(doc: &'a D, node: NodeId) -> Self {
        Self {
            doc,
            current: Some(node),
            started: false,
        }
    }
}

impl<D: DocumentReader + ?Sized> Iterator for Ancestors<'_, D> {
    type Item = Result<NodeId, DocumentError>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;
        if !self.started {
            self.started = true;
            return Some(Ok(current));
        }
        match self.doc.parent(current) {
            Ok(parent) => {
                self.current = parent;
                parent.map(Ok)
            }
            Err(err) => {
                self.current = None;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{BlockType, DocumentEngine, MemoryDocument, Point};

    #[test]
    fn test_no_selection_yields_default() {
        let mut doc = MemoryDocument::empty();
        doc.push_block(BlockType::Heading(HeadingLevel::H1), "Title");
        assert_eq!(resolve(&doc), ToolbarState::default());
    }

    #[test]
    fn test_node_selection_yields_default() {
        let mut doc = MemoryDocument::empty();
        let text = doc.push_block(BlockType::Heading(HeadingLevel::H1), "Title");
        doc.set_selection(Some(Selection::Node(text)));
        assert_eq!(resolve(&doc), ToolbarState::default());
    }

    #[test]
    fn test_collapsed_caret_ignores_inline_format() {
        let mut doc = MemoryDocument::empty();
        let text = doc.push_block(BlockType::Paragraph, "bold");
        doc.select_text(text);
        doc.update(|tx| tx.format_text(TextFormat::BOLD)).unwrap();
        doc.set_caret(Point::new(text, 2));

        let state = resolve(&doc);
        assert!(!state.bold);
    }

    #[test]
    fn test_range_reports_inline_formats() {
        let mut doc = MemoryDocument::empty();
        let text = doc.push_block(BlockType::Paragraph, "styled");
        doc.select_text(text);
        doc.update(|tx| {
            tx.format_text(TextFormat::ITALIC)?;
            tx.format_text(TextFormat::STRIKETHROUGH)
        })
        .unwrap();

        let state = resolve(&doc);
        assert!(state.italic);
        assert!(state.strikethrough);
        assert!(!state.bold);
        assert!(!state.underline);
    }

    #[test]
    fn test_heading_from_parent_block() {
        let mut doc = MemoryDocument::empty();
        let text = doc.push_block(BlockType::Heading(HeadingLevel::H3), "Title");
        doc.set_caret(Point::new(text, 1));
        assert_eq!(resolve(&doc).heading, Some(HeadingLevel::H3));
    }

    #[test]
    fn test_heading_lookup_stops_after_one_level() {
        let mut doc = MemoryDocument::empty();
        let root = doc.root();
        let heading = doc.append_node(root, NodeKind::Heading(HeadingLevel::H2));
        let link = doc.append_node(heading, NodeKind::Link);
        let text = doc.append_text(link, "nested", TextFormat::empty());
        doc.set_caret(Point::new(text, 0));
        assert_eq!(resolve(&doc).heading, None);
    }

    #[test]
    fn test_list_kind_through_list_item() {
        let mut doc = MemoryDocument::empty();
        let items = doc.push_list(ListKind::Ordered, &["one", "two"]);
        doc.set_caret(Point::new(items[1], 0));
        let state = resolve(&doc);
        assert_eq!(state.list, Some(ListKind::Ordered));
        assert_eq!(state.heading, None);
    }

    #[test]
    fn test_deep_chain_without_list_item_terminates() {
        let mut doc = MemoryDocument::empty();
        let mut parent = doc.root();
        for _ in 0..40 {
            parent = doc.append_node(parent, NodeKind::Link);
        }
        let text = doc.append_text(parent, "deep", TextFormat::empty());
        doc.set_caret(Point::new(text, 0));
        assert_eq!(resolve(&doc).list, None);
    }

    #[test]
    fn test_detached_anchor_resets_everything() {
        let mut doc = MemoryDocument::empty();
        let text = doc.push_block(BlockType::Heading(HeadingLevel::H1), "gone");
        doc.select_text(text);
        doc.update(|tx| tx.format_text(TextFormat::BOLD)).unwrap();
        assert!(resolve(&doc).bold);

        let block = doc.parent(text).unwrap().unwrap();
        doc.detach(block).unwrap();
        assert_eq!(resolve(&doc), ToolbarState::default());
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut doc = MemoryDocument::empty();
        let items = doc.push_list(ListKind::Bullet, &["item"]);
        doc.select_text(items[0]);
        doc.update(|tx| tx.format_text(TextFormat::UNDERLINE)).unwrap();
        assert_eq!(resolve(&doc), resolve(&doc));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn list_found_only_within_bound(depth in 0..24usize) {
                let mut doc = MemoryDocument::empty();
                let root = doc.root();
                let list = doc.append_node(root, NodeKind::List(ListKind::Bullet));
                let mut parent = doc.append_node(list, NodeKind::ListItem);
                for _ in 0..depth {
                    parent = doc.append_node(parent, NodeKind::Link);
                }
                let text = doc.append_text(parent, "x", TextFormat::empty());
                doc.set_caret(Point::new(text, 0));

                // text, `depth` links, the item, then the list itself
                let list_step = depth + 2;
                let expected = (list_step < MAX_ANCESTOR_STEPS).then_some(ListKind::Bullet);
                prop_assert_eq!(resolve(&doc).list, expected);
            }

            #[test]
            fn resolution_is_stable(start in 0..5usize, len in 0..5usize) {
                let mut doc = MemoryDocument::empty();
                let text = doc.push_block(BlockType::Heading(HeadingLevel::H4), "abcdefghij");
                doc.select(Point::new(text, start), Point::new(text, start + len));
                let first = resolve(&doc);
                prop_assert_eq!(first, resolve(&doc));
                prop_assert_eq!(first.heading, Some(HeadingLevel::H4));
            }
        }
    }
}
