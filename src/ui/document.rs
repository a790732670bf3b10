use std::collections::HashMap;

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use crate::document::{
    DocumentReader, ListKind, MemoryDocument, NodeId, NodeKind, Point, Selection, TextFormat,
};

/// Rendered document lines plus where the terminal cursor belongs.
#[derive(Debug, Default)]
pub struct DocumentView {
    pub lines: Vec<Line<'static>>,
    /// `(column, row)` of the selection focus, relative to the text area.
    pub caret: Option<(u16, u16)>,
}

/// Lay out every top-level block as one line.
pub fn document_view(doc: &MemoryDocument) -> DocumentView {
    let order = text_order(doc);
    let selection = match doc.selection() {
        Some(Selection::Range(range)) => {
            let anchor = position(&order, range.anchor);
            let focus = position(&order, range.focus);
            anchor.zip(focus)
        }
        _ => None,
    };
    let mut builder = LineBuilder {
        doc,
        order: &order,
        selection,
        view: DocumentView::default(),
        spans: Vec::new(),
        col: 0,
    };
    for block in doc.children(doc.root()).unwrap_or_default() {
        match doc.kind(block) {
            Ok(NodeKind::Paragraph) => builder.block(block, String::new(), Style::default()),
            Ok(NodeKind::Heading(level)) => builder.block(
                block,
                format!("{} ", "#".repeat(usize::from(level.number()))),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Ok(NodeKind::List(kind)) => {
                let items = doc.children(block).unwrap_or_default();
                for (index, item) in items.into_iter().enumerate() {
                    let marker = match kind {
                        ListKind::Bullet => "• ".to_string(),
                        ListKind::Ordered => format!("{}. ", index + 1),
                    };
                    builder.block(item, format!("  {marker}"), Style::default());
                }
            }
            _ => {}
        }
    }
    builder.view
}

/// Text nodes in document order.
fn text_order(doc: &MemoryDocument) -> HashMap<NodeId, usize> {
    let mut order = HashMap::new();
    let mut stack = vec![doc.root()];
    while let Some(id) = stack.pop() {
        if doc.kind(id) == Ok(NodeKind::Text) {
            order.insert(id, order.len());
        }
        let mut children = doc.children(id).unwrap_or_default();
        children.reverse();
        stack.extend(children);
    }
    order
}

fn position(order: &HashMap<NodeId, usize>, point: Point) -> Option<(usize, usize)> {
    order.get(&point.node).map(|index| (*index, point.offset))
}

fn format_style(format: TextFormat) -> Style {
    let mut style = Style::default();
    if format.contains(TextFormat::BOLD) {
        style = style.add_modifier(Modifier::BOLD);
    }
    if format.contains(TextFormat::ITALIC) {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if format.contains(TextFormat::UNDERLINE) {
        style = style.add_modifier(Modifier::UNDERLINED);
    }
    if format.contains(TextFormat::STRIKETHROUGH) {
        style = style.add_modifier(Modifier::CROSSED_OUT);
    }
    style
}

struct LineBuilder<'a> {
    doc: &'a MemoryDocument,
    order: &'a HashMap<NodeId, usize>,
    /// `(anchor, focus)` as `(text index, offset)` pairs.
    selection: Option<((usize, usize), (usize, usize))>,
    view: DocumentView,
    spans: Vec<Span<'static>>,
    col: usize,
}

impl LineBuilder<'_> {
    fn block(&mut self, block: NodeId, prefix: String, base: Style) {
        self.col = prefix.width();
        self.spans.push(Span::styled(prefix, base));
        self.inline(block, base);
        self.view.lines.push(Line::from(std::mem::take(&mut self.spans)));
    }

    fn inline(&mut self, parent: NodeId, style: Style) {
        for child in self.doc.children(parent).unwrap_or_default() {
            match self.doc.kind(child) {
                Ok(NodeKind::Text) => {
                    let format = self.doc.format_of(child).unwrap_or_default();
                    self.text(child, style.patch(format_style(format)));
                }
                Ok(NodeKind::Link) => self.inline(
                    child,
                    style
                        .fg(Color::Blue)
                        .add_modifier(Modifier::UNDERLINED),
                ),
                _ => {}
            }
        }
    }

    fn text(&mut self, node: NodeId, style: Style) {
        let Some(&index) = self.order.get(&node) else {
            return;
        };
        let text = self.doc.plain_text(node);
        let len = text.chars().count();
        let (from, to) = self.selected_chars(index, len);

        if let Some((_, (focus_index, focus_offset))) = self.selection
            && focus_index == index
        {
            let before: String = text.chars().take(focus_offset).collect();
            let col = u16::try_from(self.col + before.width()).unwrap_or(u16::MAX);
            let row = u16::try_from(self.view.lines.len()).unwrap_or(u16::MAX);
            self.view.caret = Some((col, row));
        }

        let segment = |a: usize, b: usize| text.chars().skip(a).take(b - a).collect::<String>();
        for (piece, piece_style) in [
            (segment(0, from), style),
            (segment(from, to), style.add_modifier(Modifier::REVERSED)),
            (segment(to, len), style),
        ] {
            if !piece.is_empty() {
                self.col += piece.width();
                self.spans.push(Span::styled(piece, piece_style));
            }
        }
    }

    /// Character range of text node `index` that lies inside the selection.
    fn selected_chars(&self, index: usize, len: usize) -> (usize, usize) {
        let Some((anchor, focus)) = self.selection else {
            return (0, 0);
        };
        let (start, end) = if anchor <= focus {
            (anchor, focus)
        } else {
            (focus, anchor)
        };
        if index < start.0 || index > end.0 {
            return (0, 0);
        }
        let from = if index == start.0 { start.1.min(len) } else { 0 };
        let to = if index == end.0 { end.1.min(len) } else { len };
        if from < to { (from, to) } else { (0, 0) }
    }
}
