use serde::{Deserialize, Serialize};

use crate::document::{HeadingLevel, InlineFormat, ListKind};

/// Which formatting applies to the current selection.
///
/// Always rebuilt as a whole by the resolver; one heading level and one
/// list kind at most, by construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolbarState {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub heading: Option<HeadingLevel>,
    pub list: Option<ListKind>,
}

impl ToolbarState {
    pub const fn format_active(&self, format: InlineFormat) -> bool {
        match format {
            InlineFormat::Bold => self.bold,
            InlineFormat::Italic => self.italic,
            InlineFormat::Underline => self.underline,
            InlineFormat::Strikethrough => self.strikethrough,
        }
    }

    pub fn heading_active(&self, level: HeadingLevel) -> bool {
        self.heading == Some(level)
    }

    pub fn list_active(&self, kind: ListKind) -> bool {
        self.list == Some(kind)
    }

    /// JSON snapshot for hosts that render outside Rust.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_inactive() {
        let state = ToolbarState::default();
        for format in InlineFormat::ALL {
            assert!(!state.format_active(format));
        }
        assert_eq!(state.heading, None);
        assert_eq!(state.list, None);
    }

    #[test]
    fn test_json_snapshot_uses_tag_names() {
        let state = ToolbarState {
            bold: true,
            heading: Some(HeadingLevel::H2),
            list: Some(ListKind::Ordered),
            ..ToolbarState::default()
        };
        let json = state.to_json().unwrap();
        assert!(json.contains("\"heading\":\"h2\""), "{json}");
        assert!(json.contains("\"list\":\"ordered\""), "{json}");
        assert!(json.contains("\"bold\":true"), "{json}");
    }
}
