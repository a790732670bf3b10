//! In-memory reference engine.
//!
//! An arena-backed tree that implements the full engine seam. Transactions
//! snapshot the tree and restore it when the closure fails, so a failed
//! update is never observable.

use std::fmt::Write as _;
use std::rc::Rc;

use super::{
    BlockType, DocumentEngine, DocumentError, DocumentReader, EditingPrimitives, EngineEvent,
    LinkAttributes, ListKind, NodeId, NodeKind, Point, RangeSelection, Selection, TextFormat,
};

/// Class names written into generated markup.
///
/// These are presentation details; hosts strip them before emitting content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub paragraph: String,
    pub bold: String,
    pub italic: String,
    pub underline: String,
    pub strikethrough: String,
    pub underline_strikethrough: String,
    pub headings: [String; 6],
    pub list_bullet: String,
    pub list_ordered: String,
    pub list_item: String,
    pub link: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            paragraph: String::new(),
            bold: "font-bold".into(),
            italic: "italic".into(),
            underline: "underline".into(),
            strikethrough: "line-through".into(),
            underline_strikethrough: "underline line-through".into(),
            headings: [
                "text-3xl font-bold mt-6 mb-4".into(),
                "text-2xl font-bold mt-5 mb-3".into(),
                "text-xl font-bold mt-4 mb-2".into(),
                "text-lg font-bold mt-3 mb-2".into(),
                "text-base font-bold mt-2 mb-1".into(),
                "text-sm font-bold mt-2 mb-1".into(),
            ],
            list_bullet: "list-disc ml-5 my-2".into(),
            list_ordered: "list-decimal ml-5 my-2".into(),
            list_item: "my-1".into(),
            link: "text-blue-600 underline".into(),
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    text: String,
    format: TextFormat,
    link: Option<LinkAttributes>,
}

impl Node {
    const fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            text: String::new(),
            format: TextFormat::empty(),
            link: None,
        }
    }

    fn text(text: &str, format: TextFormat) -> Self {
        Self {
            text: text.to_string(),
            format,
            ..Self::new(NodeKind::Text)
        }
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Text nodes in document order plus the ordered endpoints of a range,
/// each as `(index into order, offset)`.
struct Span {
    order: Vec<NodeId>,
    start: (usize, usize),
    end: (usize, usize),
    backward: bool,
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Option<Node>>,
    root: NodeId,
    selection: Option<Selection>,
    /// Format applied to text typed at a collapsed caret.
    pending_format: TextFormat,
    theme: Rc<Theme>,
}

impl Tree {
    fn new() -> Self {
        Self {
            nodes: vec![Some(Node::new(NodeKind::Root))],
            root: NodeId(0),
            selection: None,
            pending_format: TextFormat::empty(),
            theme: Rc::new(Theme::default()),
        }
    }

    fn node(&self, id: NodeId) -> Result<&Node, DocumentError> {
        self.nodes
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(DocumentError::MissingNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, DocumentError> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(DocumentError::MissingNode(id))
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        self.nodes.push(Some(node));
        NodeId(self.nodes.len() - 1)
    }

    fn free(&mut self, id: NodeId) {
        if let Some(slot) = self.nodes.get_mut(id.0) {
            *slot = None;
        }
    }

    fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), DocumentError> {
        self.node_mut(child)?.parent = Some(parent);
        let children = &mut self.node_mut(parent)?.children;
        let index = index.min(children.len());
        children.insert(index, child);
        Ok(())
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DocumentError> {
        let len = self.node(parent)?.children.len();
        self.insert_child(parent, len, child)
    }

    /// Parent and position of `id` among its siblings.
    fn index_in_parent(&self, id: NodeId) -> Result<(NodeId, usize), DocumentError> {
        let parent = self
            .node(id)?
            .parent
            .ok_or(DocumentError::DetachedNode(id))?;
        let index = self
            .node(parent)?
            .children
            .iter()
            .position(|c| *c == id)
            .ok_or(DocumentError::DetachedNode(id))?;
        Ok((parent, index))
    }

    fn detach(&mut self, id: NodeId) -> Result<(), DocumentError> {
        let (parent, index) = self.index_in_parent(id)?;
        self.node_mut(parent)?.children.remove(index);
        self.node_mut(id)?.parent = None;
        Ok(())
    }

    /// Attached text nodes in document order.
    fn text_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let Ok(node) = self.node(id) else { continue };
            if node.kind == NodeKind::Text {
                out.push(id);
            }
            stack.extend(node.children.iter().rev());
        }
        out
    }

    fn text_len(&self, id: NodeId) -> Result<usize, DocumentError> {
        let node = self.node(id)?;
        if node.kind != NodeKind::Text {
            return Err(DocumentError::NotText(id));
        }
        Ok(node.char_len())
    }

    fn ancestor_where(
        &self,
        id: NodeId,
        pred: impl Fn(&Node) -> bool,
    ) -> Result<NodeId, DocumentError> {
        let mut current = id;
        for _ in 0..self.nodes.len() {
            let node = self.node(current)?;
            if pred(node) {
                return Ok(current);
            }
            current = node.parent.ok_or(DocumentError::DetachedNode(current))?;
        }
        Err(DocumentError::DetachedNode(id))
    }

    fn block_of(&self, id: NodeId) -> Result<NodeId, DocumentError> {
        self.ancestor_where(id, |node| node.kind.is_block())
    }

    fn top_level_of(&self, id: NodeId) -> Result<NodeId, DocumentError> {
        let root = self.root;
        self.ancestor_where(id, |node| node.parent == Some(root))
    }

    fn range(&self) -> Result<RangeSelection, DocumentError> {
        match &self.selection {
            Some(Selection::Range(range)) => Ok(*range),
            _ => Err(DocumentError::NoSelection),
        }
    }

    fn span(&self, range: &RangeSelection) -> Result<Span, DocumentError> {
        let order = self.text_nodes();
        let locate = |point: Point| -> Result<(usize, usize), DocumentError> {
            let len = self.text_len(point.node)?;
            if point.offset > len {
                return Err(DocumentError::OffsetOutOfBounds {
                    node: point.node,
                    offset: point.offset,
                });
            }
            let index = order
                .iter()
                .position(|id| *id == point.node)
                .ok_or(DocumentError::DetachedNode(point.node))?;
            Ok((index, point.offset))
        };
        let anchor = locate(range.anchor)?;
        let focus = locate(range.focus)?;
        let backward = focus < anchor;
        let (start, end) = if backward {
            (focus, anchor)
        } else {
            (anchor, focus)
        };
        Ok(Span {
            order,
            start,
            end,
            backward,
        })
    }

    /// `(node, from, to)` character windows covered by a span.
    fn covered(&self, span: &Span) -> Result<Vec<(NodeId, usize, usize)>, DocumentError> {
        let mut out = Vec::new();
        for index in span.start.0..=span.end.0 {
            let id = span.order[index];
            let from = if index == span.start.0 { span.start.1 } else { 0 };
            let to = if index == span.end.0 {
                span.end.1
            } else {
                self.text_len(id)?
            };
            out.push((id, from, to));
        }
        Ok(out)
    }

    fn touched_blocks(&self, range: &RangeSelection) -> Result<Vec<NodeId>, DocumentError> {
        let span = self.span(range)?;
        let mut blocks: Vec<NodeId> = Vec::new();
        for index in span.start.0..=span.end.0 {
            let block = self.block_of(span.order[index])?;
            if !blocks.contains(&block) {
                blocks.push(block);
            }
        }
        Ok(blocks)
    }

    /// Split a text node at `at`; the node keeps the left part and the
    /// returned sibling holds the rest.
    fn split_text(&mut self, id: NodeId, at: usize) -> Result<NodeId, DocumentError> {
        let (parent, index) = self.index_in_parent(id)?;
        let node = self.node_mut(id)?;
        let byte = byte_index(&node.text, at);
        let right = node.text.split_off(byte);
        let format = node.format;
        let sibling = self.alloc(Node::text(&right, format));
        self.insert_child(parent, index + 1, sibling)?;
        Ok(sibling)
    }

    /// Split text at the range boundaries and return the nodes now wholly
    /// inside the range, in document order.
    fn isolate(&mut self, range: &RangeSelection) -> Result<Vec<NodeId>, DocumentError> {
        let span = self.span(range)?;
        if span.start == span.end {
            return Ok(Vec::new());
        }
        let start_node = span.order[span.start.0];
        let end_node = span.order[span.end.0];
        let (start_offset, end_offset) = (span.start.1, span.end.1);

        // End first so the start offset stays valid.
        let end_len = self.text_len(end_node)?;
        if end_offset > 0 && end_offset < end_len {
            self.split_text(end_node, end_offset)?;
        }
        let start_len = self.text_len(start_node)?;
        let first = if start_offset == 0 {
            Some(start_node)
        } else if start_offset < start_len {
            Some(self.split_text(start_node, start_offset)?)
        } else {
            span.order.get(span.start.0 + 1).copied()
        };
        let Some(first) = first else {
            return Ok(Vec::new());
        };

        let order = self.text_nodes();
        let position = |id: NodeId| {
            order
                .iter()
                .position(|n| *n == id)
                .ok_or(DocumentError::DetachedNode(id))
        };
        let a = position(first)?;
        let b = position(end_node)?;
        let last = if end_offset == 0 {
            match b.checked_sub(1) {
                Some(last) => last,
                None => return Ok(Vec::new()),
            }
        } else {
            b
        };
        if a > last {
            return Ok(Vec::new());
        }
        let nodes = order[a..=last].to_vec();
        self.select_nodes(&nodes, span.backward)?;
        Ok(nodes)
    }

    /// Select exactly the given text nodes, keeping selection direction.
    fn select_nodes(&mut self, nodes: &[NodeId], backward: bool) -> Result<(), DocumentError> {
        let (Some(first), Some(last)) = (nodes.first(), nodes.last()) else {
            return Ok(());
        };
        let start = Point::new(*first, 0);
        let end = Point::new(*last, self.text_len(*last)?);
        let range = if backward {
            RangeSelection::new(end, start)
        } else {
            RangeSelection::new(start, end)
        };
        self.selection = Some(Selection::Range(range));
        Ok(())
    }

    /// Clear the text inside `range` and return the collapsed caret.
    fn delete_range(&mut self, range: &RangeSelection) -> Result<Point, DocumentError> {
        let span = self.span(range)?;
        let start = Point::new(span.order[span.start.0], span.start.1);
        let nodes = self.isolate(range)?;
        for id in &nodes {
            self.node_mut(*id)?.text.clear();
        }
        Ok(nodes.first().map_or(start, |first| Point::new(*first, 0)))
    }

    fn new_block(&mut self, kind: NodeKind, text: &str) -> Result<(NodeId, NodeId), DocumentError> {
        let block = self.alloc(Node::new(kind));
        let text = self.alloc(Node::text(text, TextFormat::empty()));
        self.append_child(block, text)?;
        Ok((block, text))
    }

    /// Move `children` (consecutive siblings under one parent) into a new
    /// container placed where the first one was.
    fn wrap(&mut self, children: &[NodeId], container: Node) -> Result<NodeId, DocumentError> {
        let Some(first) = children.first() else {
            return Err(DocumentError::NoSelection);
        };
        let (parent, index) = self.index_in_parent(*first)?;
        let wrapper = self.alloc(container);
        for child in children {
            self.detach(*child)?;
            self.append_child(wrapper, *child)?;
        }
        self.insert_child(parent, index, wrapper)?;
        Ok(wrapper)
    }

    /// Replace `container` with its children.
    fn unwrap(&mut self, container: NodeId) -> Result<Vec<NodeId>, DocumentError> {
        let (parent, index) = self.index_in_parent(container)?;
        let children = std::mem::take(&mut self.node_mut(container)?.children);
        self.detach(container)?;
        for (offset, child) in children.iter().enumerate() {
            self.insert_child(parent, index + offset, *child)?;
        }
        self.free(container);
        Ok(children)
    }

    /// Group nodes into runs of adjacent siblings under the same parent.
    fn sibling_runs(&self, nodes: &[NodeId]) -> Result<Vec<Vec<NodeId>>, DocumentError> {
        let mut runs: Vec<Vec<NodeId>> = Vec::new();
        let mut last: Option<(NodeId, usize)> = None;
        for id in nodes {
            let (parent, index) = self.index_in_parent(*id)?;
            match (runs.last_mut(), last) {
                (Some(run), Some((p, i))) if p == parent && i + 1 == index => run.push(*id),
                _ => runs.push(vec![*id]),
            }
            last = Some((parent, index));
        }
        Ok(runs)
    }

    /// Point one character away from `point`, crossing text nodes.
    fn step(&self, point: Point, backward: bool) -> Result<Point, DocumentError> {
        let order = self.text_nodes();
        let index = order
            .iter()
            .position(|id| *id == point.node)
            .ok_or(DocumentError::DetachedNode(point.node))?;
        let len = self.text_len(point.node)?;
        if backward {
            if point.offset > 0 {
                return Ok(Point::new(point.node, point.offset - 1));
            }
            match index.checked_sub(1) {
                Some(prev) => Ok(Point::new(order[prev], self.text_len(order[prev])?)),
                None => Ok(point),
            }
        } else if point.offset < len {
            Ok(Point::new(point.node, point.offset + 1))
        } else {
            Ok(order
                .get(index + 1)
                .map_or(point, |next| Point::new(*next, 0)))
        }
    }

    fn set_selection(&mut self, selection: Option<Selection>) {
        self.pending_format = match &selection {
            Some(Selection::Range(range)) => self
                .node(range.anchor.node)
                .map(|n| n.format)
                .unwrap_or_default(),
            _ => TextFormat::empty(),
        };
        self.selection = selection;
    }

    fn write_node(&self, id: NodeId, out: &mut String) -> Result<(), DocumentError> {
        let node = self.node(id)?;
        let theme = &self.theme;
        let (tag, class, extra) = match node.kind {
            NodeKind::Root => {
                for child in &node.children {
                    self.write_node(*child, out)?;
                }
                return Ok(());
            }
            NodeKind::Text => {
                write_text(node, theme, out);
                return Ok(());
            }
            NodeKind::Paragraph => ("p", theme.paragraph.as_str(), " dir=\"ltr\"".to_string()),
            NodeKind::Heading(level) => (
                level.tag(),
                theme.headings[usize::from(level.number() - 1)].as_str(),
                " dir=\"ltr\"".to_string(),
            ),
            NodeKind::List(kind) => (
                kind.tag(),
                match kind {
                    ListKind::Bullet => theme.list_bullet.as_str(),
                    ListKind::Ordered => theme.list_ordered.as_str(),
                },
                String::new(),
            ),
            NodeKind::ListItem => {
                let (_, index) = self.index_in_parent(id)?;
                (
                    "li",
                    theme.list_item.as_str(),
                    format!(" value=\"{}\" dir=\"ltr\"", index + 1),
                )
            }
            NodeKind::Link => {
                let mut extra = String::new();
                if let Some(link) = &node.link {
                    let _ = write!(extra, " href=\"{}\"", escape(&link.url));
                    if let Some(target) = &link.target {
                        let _ = write!(extra, " target=\"{}\" rel=\"noreferrer\"", escape(target));
                    }
                }
                ("a", theme.link.as_str(), extra)
            }
        };
        let _ = write!(out, "<{tag}{extra}{}>", class_attr(class));
        for child in &node.children {
            self.write_node(*child, out)?;
        }
        let _ = write!(out, "</{tag}>");
        Ok(())
    }
}

impl DocumentReader for Tree {
    fn selection(&self) -> Option<Selection> {
        self.selection.clone()
    }

    fn root(&self) -> NodeId {
        self.root
    }

    fn kind(&self, node: NodeId) -> Result<NodeKind, DocumentError> {
        Ok(self.node(node)?.kind)
    }

    fn parent(&self, node: NodeId) -> Result<Option<NodeId>, DocumentError> {
        let n = self.node(node)?;
        if node == self.root {
            return Ok(None);
        }
        n.parent.map(Some).ok_or(DocumentError::DetachedNode(node))
    }

    fn children(&self, node: NodeId) -> Result<Vec<NodeId>, DocumentError> {
        Ok(self.node(node)?.children.clone())
    }

    fn text_content(&self, range: &RangeSelection) -> Result<String, DocumentError> {
        let span = self.span(range)?;
        let mut out = String::new();
        let mut last_block = None;
        for (id, from, to) in self.covered(&span)? {
            let block = self.block_of(id).ok();
            if last_block.is_some() && block != last_block {
                out.push('\n');
            }
            last_block = block;
            let node = self.node(id)?;
            out.extend(node.text.chars().skip(from).take(to.saturating_sub(from)));
        }
        Ok(out)
    }

    fn has_format(&self, range: &RangeSelection, format: TextFormat) -> Result<bool, DocumentError> {
        if range.is_collapsed() {
            self.span(range)?;
            return Ok(self.pending_format.contains(format));
        }
        let span = self.span(range)?;
        let mut any = false;
        for (id, from, to) in self.covered(&span)? {
            if to <= from {
                continue;
            }
            any = true;
            if !self.node(id)?.format.contains(format) {
                return Ok(false);
            }
        }
        Ok(any)
    }

    fn generate_markup(&self) -> Result<String, DocumentError> {
        let mut out = String::new();
        self.write_node(self.root, &mut out)?;
        Ok(out)
    }
}

impl EditingPrimitives for Tree {
    fn format_text(&mut self, format: TextFormat) -> Result<(), DocumentError> {
        let range = self.range()?;
        if range.is_collapsed() {
            self.pending_format.toggle(format);
            return Ok(());
        }
        let nodes = self.isolate(&range)?;
        let mut all = !nodes.is_empty();
        for id in &nodes {
            all &= self.node(*id)?.format.contains(format);
        }
        for id in &nodes {
            self.node_mut(*id)?.format.set(format, !all);
        }
        Ok(())
    }

    fn set_blocks_type(&mut self, block: BlockType) -> Result<(), DocumentError> {
        let range = self.range()?;
        let blocks = self.touched_blocks(&range)?;
        for id in &blocks {
            if self.node(*id)?.kind == NodeKind::ListItem {
                return Err(DocumentError::Unsupported("list items cannot change block type"));
            }
        }
        for id in blocks {
            self.node_mut(id)?.kind = block.node_kind();
        }
        Ok(())
    }

    fn insert_block(&mut self, block: BlockType) -> Result<(), DocumentError> {
        let range = self.range()?;
        let top = self.top_level_of(range.anchor.node)?;
        let (parent, index) = self.index_in_parent(top)?;
        let (new_block, _) = self.new_block(block.node_kind(), "")?;
        self.insert_child(parent, index + 1, new_block)
    }

    fn insert_list(&mut self, kind: ListKind) -> Result<(), DocumentError> {
        let range = self.range()?;
        let mut loose = Vec::new();
        for block in self.touched_blocks(&range)? {
            let node = self.node(block)?;
            if node.kind == NodeKind::ListItem {
                if let Some(list) = node.parent
                    && matches!(self.node(list)?.kind, NodeKind::List(_))
                {
                    self.node_mut(list)?.kind = NodeKind::List(kind);
                }
            } else {
                loose.push(block);
            }
        }
        for run in self.sibling_runs(&loose)? {
            for block in &run {
                self.node_mut(*block)?.kind = NodeKind::ListItem;
            }
            self.wrap(&run, Node::new(NodeKind::List(kind)))?;
        }
        Ok(())
    }

    fn remove_list(&mut self) -> Result<(), DocumentError> {
        let range = self.range()?;
        let mut lists = Vec::new();
        for block in self.touched_blocks(&range)? {
            let Some(parent) = self.node(block)?.parent else {
                continue;
            };
            if matches!(self.node(parent)?.kind, NodeKind::List(_)) && !lists.contains(&parent) {
                lists.push(parent);
            }
        }
        for list in lists {
            for item in self.unwrap(list)? {
                let node = self.node_mut(item)?;
                if node.kind == NodeKind::ListItem {
                    node.kind = NodeKind::Paragraph;
                }
            }
        }
        Ok(())
    }

    fn insert_text(&mut self, text: &str) -> Result<(), DocumentError> {
        let range = self.range()?;
        let caret = if range.is_collapsed() {
            self.span(&range)?;
            range.anchor
        } else {
            let pending = self.pending_format;
            let caret = self.delete_range(&range)?;
            self.pending_format = pending;
            caret
        };
        if text.is_empty() {
            self.selection = Some(Selection::Range(RangeSelection::caret(caret)));
            return Ok(());
        }

        let pending = self.pending_format;
        let added = text.chars().count();
        let node = self.node_mut(caret.node)?;
        let new_caret = if node.text.is_empty() || node.format == pending {
            if node.text.is_empty() {
                node.format = pending;
            }
            let byte = byte_index(&node.text, caret.offset);
            node.text.insert_str(byte, text);
            Point::new(caret.node, caret.offset + added)
        } else {
            let len = node.char_len();
            let (parent, index) = self.index_in_parent(caret.node)?;
            let at = if caret.offset == 0 {
                index
            } else {
                if caret.offset < len {
                    self.split_text(caret.node, caret.offset)?;
                }
                index + 1
            };
            let run = self.alloc(Node::text(text, pending));
            self.insert_child(parent, at, run)?;
            Point::new(run, added)
        };
        self.selection = Some(Selection::Range(RangeSelection::caret(new_caret)));
        Ok(())
    }

    fn extend_selection_backward(&mut self, chars: usize) -> Result<(), DocumentError> {
        let range = self.range()?;
        let mut focus = range.focus;
        let mut remaining = chars;
        while remaining > 0 {
            let next = self.step(focus, true)?;
            if next == focus {
                break;
            }
            // Hopping to the end of the previous node does not consume a character.
            if next.node == focus.node {
                remaining -= 1;
            }
            focus = next;
        }
        self.selection = Some(Selection::Range(RangeSelection::new(range.anchor, focus)));
        Ok(())
    }

    fn toggle_link(&mut self, link: Option<&LinkAttributes>) -> Result<(), DocumentError> {
        let range = self.range()?;
        if range.is_collapsed() {
            if link.is_none() {
                let parent = self.node(range.anchor.node)?.parent;
                if let Some(parent) = parent
                    && self.node(parent)?.kind == NodeKind::Link
                {
                    self.unwrap(parent)?;
                }
            }
            return Ok(());
        }
        let nodes = self.isolate(&range)?;
        let mut links = Vec::new();
        let mut loose = Vec::new();
        for id in &nodes {
            match self.node(*id)?.parent {
                Some(parent) if self.node(parent)?.kind == NodeKind::Link => {
                    if !links.contains(&parent) {
                        links.push(parent);
                    }
                }
                _ => loose.push(*id),
            }
        }
        match link {
            None => {
                for container in links {
                    self.unwrap(container)?;
                }
            }
            Some(attrs) => {
                for container in links {
                    self.node_mut(container)?.link = Some(attrs.clone());
                }
                for run in self.sibling_runs(&loose)? {
                    let container = Node {
                        link: Some(attrs.clone()),
                        ..Node::new(NodeKind::Link)
                    };
                    self.wrap(&run, container)?;
                }
            }
        }
        Ok(())
    }
}

/// Reference document engine backed by [`Tree`] snapshots.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    tree: Tree,
    events: Vec<EngineEvent>,
    transactions: usize,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// A document holding only the root node and no selection.
    pub fn empty() -> Self {
        Self {
            tree: Tree::new(),
            events: Vec::new(),
            transactions: 0,
        }
    }

    /// A document with one empty paragraph and the caret inside it.
    pub fn new() -> Self {
        let mut doc = Self::empty();
        let text = doc.push_block(BlockType::Paragraph, "");
        doc.set_caret(Point::new(text, 0));
        doc.events.clear();
        doc
    }

    /// Use `theme` for generated markup.
    #[must_use]
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.tree.theme = Rc::new(theme);
        self
    }

    /// Append a top-level block holding `text`; returns the text node.
    pub fn push_block(&mut self, block: BlockType, text: &str) -> NodeId {
        let root = self.tree.root;
        let block_node = self.tree.alloc(Node::new(block.node_kind()));
        let text_node = self.tree.alloc(Node::text(text, TextFormat::empty()));
        self.link_child(block_node, text_node);
        self.link_child(root, block_node);
        text_node
    }

    /// Append a top-level list; returns the text node of every item.
    pub fn push_list(&mut self, kind: ListKind, items: &[&str]) -> Vec<NodeId> {
        let root = self.tree.root;
        let list = self.tree.alloc(Node::new(NodeKind::List(kind)));
        self.link_child(root, list);
        items
            .iter()
            .map(|item| {
                let li = self.tree.alloc(Node::new(NodeKind::ListItem));
                let text = self.tree.alloc(Node::text(item, TextFormat::empty()));
                self.link_child(li, text);
                self.link_child(list, li);
                text
            })
            .collect()
    }

    /// Append a raw node under `parent`.
    pub fn append_node(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = self.tree.alloc(Node::new(kind));
        self.link_child(parent, id);
        id
    }

    /// Append a text run under `parent`.
    pub fn append_text(&mut self, parent: NodeId, text: &str, format: TextFormat) -> NodeId {
        let id = self.tree.alloc(Node::text(text, format));
        self.link_child(parent, id);
        id
    }

    fn link_child(&mut self, parent: NodeId, child: NodeId) {
        if self.tree.append_child(parent, child).is_err() {
            tracing::warn!(%parent, %child, "append to missing node ignored");
        }
    }

    /// Cut `node` loose from its parent without freeing it.
    ///
    /// # Errors
    /// Returns an error if the node is already detached.
    pub fn detach(&mut self, node: NodeId) -> Result<(), DocumentError> {
        self.tree.detach(node)
    }

    /// Replace the selection, queueing a change notification when it differs.
    pub fn set_selection(&mut self, selection: Option<Selection>) {
        if self.tree.selection != selection {
            self.tree.set_selection(selection);
            self.events.push(EngineEvent::SelectionChanged);
        }
    }

    pub fn set_caret(&mut self, at: Point) {
        self.set_selection(Some(Selection::Range(RangeSelection::caret(at))));
    }

    pub fn select(&mut self, anchor: Point, focus: Point) {
        self.set_selection(Some(Selection::Range(RangeSelection::new(anchor, focus))));
    }

    /// Select the whole of a text node.
    pub fn select_text(&mut self, node: NodeId) {
        let len = self.tree.text_len(node).unwrap_or(0);
        self.select(Point::new(node, 0), Point::new(node, len));
    }

    /// Move the focus one character, dragging the anchor along unless
    /// `extend` is set.
    pub fn move_caret(&mut self, backward: bool, extend: bool) {
        let Ok(range) = self.tree.range() else { return };
        let Ok(focus) = self.tree.step(range.focus, backward) else {
            return;
        };
        let anchor = if extend { range.anchor } else { focus };
        self.select(anchor, focus);
    }

    /// Put the caret at the start of the top-level block after the anchor's.
    pub fn caret_to_next_block(&mut self) {
        let Ok(range) = self.tree.range() else { return };
        let Ok(top) = self.tree.top_level_of(range.anchor.node) else {
            return;
        };
        let Ok((parent, index)) = self.tree.index_in_parent(top) else {
            return;
        };
        let next = self
            .tree
            .node(parent)
            .ok()
            .and_then(|p| p.children.get(index + 1).copied());
        let Some(next) = next else { return };
        let first_text = self
            .tree
            .text_nodes()
            .into_iter()
            .find(|id| self.tree.top_level_of(*id).ok() == Some(next));
        if let Some(text) = first_text {
            self.set_caret(Point::new(text, 0));
        }
    }

    /// Number of committed transactions.
    pub const fn transactions(&self) -> usize {
        self.transactions
    }

    /// Kinds of the root's children.
    pub fn block_kinds(&self) -> Vec<NodeKind> {
        self.tree
            .node(self.tree.root)
            .map(|root| {
                root.children
                    .iter()
                    .filter_map(|c| self.tree.node(*c).ok().map(|n| n.kind))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Concatenated text beneath `node`.
    pub fn plain_text(&self, node: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            let Ok(n) = self.tree.node(id) else { continue };
            out.push_str(&n.text);
            stack.extend(n.children.iter().rev());
        }
        out
    }

    /// Every link in document order with its visible text.
    pub fn links(&self) -> Vec<(String, LinkAttributes)> {
        let mut out = Vec::new();
        let mut stack = vec![self.tree.root];
        while let Some(id) = stack.pop() {
            let Ok(n) = self.tree.node(id) else { continue };
            if n.kind == NodeKind::Link
                && let Some(link) = &n.link
            {
                out.push((self.plain_text(id), link.clone()));
            }
            stack.extend(n.children.iter().rev());
        }
        out
    }

    /// Format bits on a text node.
    pub fn format_of(&self, node: NodeId) -> Option<TextFormat> {
        self.tree.node(node).ok().map(|n| n.format)
    }
}

impl DocumentReader for MemoryDocument {
    fn selection(&self) -> Option<Selection> {
        self.tree.selection()
    }

    fn root(&self) -> NodeId {
        self.tree.root()
    }

    fn kind(&self, node: NodeId) -> Result<NodeKind, DocumentError> {
        self.tree.kind(node)
    }

    fn parent(&self, node: NodeId) -> Result<Option<NodeId>, DocumentError> {
        self.tree.parent(node)
    }

    fn children(&self, node: NodeId) -> Result<Vec<NodeId>, DocumentError> {
        self.tree.children(node)
    }

    fn text_content(&self, range: &RangeSelection) -> Result<String, DocumentError> {
        self.tree.text_content(range)
    }

    fn has_format(&self, range: &RangeSelection, format: TextFormat) -> Result<bool, DocumentError> {
        self.tree.has_format(range, format)
    }

    fn generate_markup(&self) -> Result<String, DocumentError> {
        self.tree.generate_markup()
    }
}

impl DocumentEngine for MemoryDocument {
    fn update<T, F>(&mut self, f: F) -> Result<T, DocumentError>
    where
        F: FnOnce(&mut dyn EditingPrimitives) -> Result<T, DocumentError>,
    {
        let snapshot = self.tree.clone();
        match f(&mut self.tree) {
            Ok(value) => {
                self.transactions += 1;
                self.events.push(EngineEvent::DocumentUpdated);
                if self.tree.selection != snapshot.selection {
                    self.events.push(EngineEvent::SelectionChanged);
                }
                Ok(value)
            }
            Err(err) => {
                self.tree = snapshot;
                Err(err)
            }
        }
    }

    fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }
}

fn byte_index(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map_or(s.len(), |(i, _)| i)
}

fn class_attr(class: &str) -> String {
    if class.is_empty() {
        String::new()
    } else {
        format!(" class=\"{class}\"")
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn write_text(node: &Node, theme: &Theme, out: &mut String) {
    if node.text.is_empty() {
        return;
    }
    let format = node.format;
    let (tag, wrapper) = if format.contains(TextFormat::CODE) {
        ("code", None)
    } else if format.contains(TextFormat::BOLD) {
        ("strong", Some("b"))
    } else if format.contains(TextFormat::ITALIC) {
        ("em", Some("i"))
    } else {
        ("span", None)
    };
    let mut classes: Vec<&str> = Vec::new();
    if format.contains(TextFormat::BOLD) {
        classes.push(&theme.bold);
    }
    if format.contains(TextFormat::ITALIC) {
        classes.push(&theme.italic);
    }
    match (
        format.contains(TextFormat::UNDERLINE),
        format.contains(TextFormat::STRIKETHROUGH),
    ) {
        (true, true) => classes.push(&theme.underline_strikethrough),
        (true, false) => classes.push(&theme.underline),
        (false, true) => classes.push(&theme.strikethrough),
        (false, false) => {}
    }
    let class = classes.join(" ");
    if let Some(wrapper) = wrapper {
        let _ = write!(out, "<{wrapper}>");
    }
    let _ = write!(
        out,
        "<{tag}{} style=\"white-space: pre-wrap;\">{}</{tag}>",
        class_attr(&class),
        escape(&node.text)
    );
    if let Some(wrapper) = wrapper {
        let _ = write!(out, "</{wrapper}>");
    }
}
