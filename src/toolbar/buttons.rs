//! Toolbar button descriptors.
//!
//! Hosts render these however they like; each carries the translation key
//! for its accessible label, its `aria-pressed` value and the message a
//! press sends.

use crate::document::{BlockType, HeadingLevel, InlineFormat, ListKind};

use super::{Message, ToolbarState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonGroup {
    Inline,
    Block,
    Link,
    List,
    Docs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolbarButton {
    pub group: ButtonGroup,
    /// Translation key of the accessible label.
    pub label_key: &'static str,
    /// Short visible caption.
    pub caption: &'static str,
    /// `aria-pressed`; `None` for action buttons that carry no state.
    pub pressed: Option<bool>,
    pub message: Message,
}

impl ToolbarButton {
    pub fn is_active(&self) -> bool {
        self.pressed == Some(true)
    }
}

/// Translation key of the toolbar's own label.
pub const TOOLBAR_LABEL_KEY: &str = "editorToolbar";

const fn format_label(format: InlineFormat) -> (&'static str, &'static str) {
    match format {
        InlineFormat::Bold => ("bold", "B"),
        InlineFormat::Italic => ("italic", "I"),
        InlineFormat::Underline => ("underline", "U"),
        InlineFormat::Strikethrough => ("strikethrough", "S"),
    }
}

const fn heading_label(level: HeadingLevel) -> (&'static str, &'static str) {
    match level {
        HeadingLevel::H1 => ("heading1", "H1"),
        HeadingLevel::H2 => ("heading2", "H2"),
        HeadingLevel::H3 => ("heading3", "H3"),
        HeadingLevel::H4 => ("heading4", "H4"),
        HeadingLevel::H5 => ("heading5", "H5"),
        HeadingLevel::H6 => ("heading6", "H6"),
    }
}

/// Every button in display order.
pub fn toolbar_buttons(state: &ToolbarState, docs_visible: bool) -> Vec<ToolbarButton> {
    let mut buttons = Vec::with_capacity(16);
    for format in InlineFormat::ALL {
        let (label_key, caption) = format_label(format);
        buttons.push(ToolbarButton {
            group: ButtonGroup::Inline,
            label_key,
            caption,
            pressed: Some(state.format_active(format)),
            message: Message::ToggleFormat(format),
        });
    }
    for level in HeadingLevel::ALL {
        let (label_key, caption) = heading_label(level);
        buttons.push(ToolbarButton {
            group: ButtonGroup::Block,
            label_key,
            caption,
            pressed: Some(state.heading_active(level)),
            message: Message::SetBlock(BlockType::Heading(level)),
        });
    }
    buttons.push(ToolbarButton {
        group: ButtonGroup::Block,
        label_key: "paragraph",
        caption: "P",
        pressed: Some(state.heading.is_none() && state.list.is_none()),
        message: Message::SetBlock(BlockType::Paragraph),
    });
    buttons.push(ToolbarButton {
        group: ButtonGroup::Link,
        label_key: "link",
        caption: "Link",
        pressed: None,
        message: Message::OpenLinkDialog,
    });
    buttons.push(ToolbarButton {
        group: ButtonGroup::List,
        label_key: "bulletList",
        caption: "•",
        pressed: Some(state.list_active(ListKind::Bullet)),
        message: Message::ToggleList(ListKind::Bullet),
    });
    buttons.push(ToolbarButton {
        group: ButtonGroup::List,
        label_key: "numberedList",
        caption: "1.",
        pressed: Some(state.list_active(ListKind::Ordered)),
        message: Message::ToggleList(ListKind::Ordered),
    });
    buttons.push(ToolbarButton {
        group: ButtonGroup::Docs,
        label_key: "showHelp",
        caption: "?",
        pressed: Some(docs_visible),
        message: Message::ToggleDocs,
    });
    buttons
}
