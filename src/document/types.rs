//! Core document types shared by the toolbar and engine adapters.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Handle to a node owned by the document engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Heading levels `h1` through `h6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
}

impl HeadingLevel {
    pub const ALL: [Self; 6] = [Self::H1, Self::H2, Self::H3, Self::H4, Self::H5, Self::H6];

    /// Level from its number (1-6).
    pub const fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::H1),
            2 => Some(Self::H2),
            3 => Some(Self::H3),
            4 => Some(Self::H4),
            5 => Some(Self::H5),
            6 => Some(Self::H6),
            _ => None,
        }
    }

    pub const fn number(self) -> u8 {
        match self {
            Self::H1 => 1,
            Self::H2 => 2,
            Self::H3 => 3,
            Self::H4 => 4,
            Self::H5 => 5,
            Self::H6 => 6,
        }
    }

    /// Markup tag name (`h1`..`h6`).
    pub const fn tag(self) -> &'static str {
        match self {
            Self::H1 => "h1",
            Self::H2 => "h2",
            Self::H3 => "h3",
            Self::H4 => "h4",
            Self::H5 => "h5",
            Self::H6 => "h6",
        }
    }
}

/// The two list flavours the toolbar knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Bullet,
    Ordered,
}

impl ListKind {
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Bullet => "ul",
            Self::Ordered => "ol",
        }
    }
}

/// Closed set of node kinds an engine adapter reports.
///
/// Adapters translate their own node classes into this enum once, so the
/// toolbar never re-checks node types during traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Root,
    Paragraph,
    Heading(HeadingLevel),
    List(ListKind),
    ListItem,
    Text,
    Link,
}

impl NodeKind {
    /// Whether this kind holds inline content directly.
    pub const fn is_block(self) -> bool {
        matches!(self, Self::Paragraph | Self::Heading(_) | Self::ListItem)
    }
}

bitflags::bitflags! {
    /// Inline format bits carried by text nodes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TextFormat: u32 {
        const BOLD = 1 << 0;
        const ITALIC = 1 << 1;
        const STRIKETHROUGH = 1 << 2;
        const UNDERLINE = 1 << 3;
        const CODE = 1 << 4;
        const SUBSCRIPT = 1 << 5;
        const SUPERSCRIPT = 1 << 6;
    }
}

/// Inline formats the toolbar can toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InlineFormat {
    Bold,
    Italic,
    Underline,
    Strikethrough,
}

impl InlineFormat {
    pub const ALL: [Self; 4] = [Self::Bold, Self::Italic, Self::Underline, Self::Strikethrough];

    pub const fn flag(self) -> TextFormat {
        match self {
            Self::Bold => TextFormat::BOLD,
            Self::Italic => TextFormat::ITALIC,
            Self::Underline => TextFormat::UNDERLINE,
            Self::Strikethrough => TextFormat::STRIKETHROUGH,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Underline => "underline",
            Self::Strikethrough => "strikethrough",
        }
    }
}

/// Structural role of a top-level block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockType {
    Paragraph,
    Heading(HeadingLevel),
}

impl BlockType {
    pub const fn node_kind(self) -> NodeKind {
        match self {
            Self::Paragraph => NodeKind::Paragraph,
            Self::Heading(level) => NodeKind::Heading(level),
        }
    }
}

/// One endpoint of a selection. `offset` counts characters within `node`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub node: NodeId,
    pub offset: usize,
}

impl Point {
    pub const fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// A text range between two points. Collapsed when both points coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RangeSelection {
    pub anchor: Point,
    pub focus: Point,
}

impl RangeSelection {
    pub const fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    pub const fn caret(at: Point) -> Self {
        Self {
            anchor: at,
            focus: at,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

/// What the engine currently has selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Caret or text range.
    Range(RangeSelection),
    /// Whole-node selection (images, embeds). Not range-shaped.
    Node(NodeId),
}

impl Selection {
    pub const fn as_range(&self) -> Option<&RangeSelection> {
        match self {
            Self::Range(range) => Some(range),
            Self::Node(_) => None,
        }
    }
}

/// Attributes applied when decorating a range as a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkAttributes {
    pub url: String,
    pub target: Option<String>,
}

impl LinkAttributes {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            target: None,
        }
    }

    #[must_use]
    pub fn with_target(mut self, target: Option<String>) -> Self {
        self.target = target;
        self
    }
}

/// Notifications an engine emits after state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// A transaction committed.
    DocumentUpdated,
    /// The selection moved without a document change.
    SelectionChanged,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_level_number_roundtrip_bounds() {
        assert_eq!(HeadingLevel::from_number(0), None);
        assert_eq!(HeadingLevel::from_number(7), None);
        for level in HeadingLevel::ALL {
            assert_eq!(HeadingLevel::from_number(level.number()), Some(level));
        }
        assert_eq!(HeadingLevel::H3.tag(), "h3");
    }

    #[test]
    fn test_inline_format_flags_are_distinct() {
        let all = InlineFormat::ALL
            .iter()
            .fold(TextFormat::empty(), |acc, f| acc | f.flag());
        assert_eq!(all.bits().count_ones(), 4);
    }

    #[test]
    fn test_range_collapsed() {
        let p = Point::new(NodeId(3), 2);
        assert!(RangeSelection::caret(p).is_collapsed());
        assert!(!RangeSelection::new(p, Point::new(NodeId(3), 4)).is_collapsed());
    }

    #[test]
    fn test_node_selection_is_not_range() {
        assert!(Selection::Node(NodeId(1)).as_range().is_none());
    }
}
