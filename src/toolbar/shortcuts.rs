//! Keyboard chord routing.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::config::Platform;
use crate::document::{HeadingLevel, InlineFormat, ListKind};

/// What a recognised chord asks the toolbar to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Format(InlineFormat),
    List(ListKind),
    Heading(HeadingLevel),
    /// Prompt for a URL and link the selection.
    Link,
    /// Show or hide the shortcut reference.
    Docs,
    Escape,
}

/// Maps key events to [`Shortcut`]s for one platform's modifier layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShortcutRouter {
    platform: Platform,
}

impl ShortcutRouter {
    pub const fn new(platform: Platform) -> Self {
        Self { platform }
    }

    pub const fn platform(&self) -> Platform {
        self.platform
    }

    /// Route `key`, or `None` when it is not a toolbar chord.
    ///
    /// Anything without the primary modifier other than Escape is ignored.
    pub fn route(&self, key: &KeyEvent) -> Option<Shortcut> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        if key.code == KeyCode::Esc {
            return Some(Shortcut::Escape);
        }
        if !key.modifiers.contains(self.platform.primary_modifier()) {
            return None;
        }
        let KeyCode::Char(c) = key.code else {
            return None;
        };
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);

        if key.modifiers.contains(KeyModifiers::ALT) {
            let digit = c.to_digit(10).and_then(|d| u8::try_from(d).ok())?;
            return HeadingLevel::from_number(digit).map(Shortcut::Heading);
        }

        match c.to_ascii_lowercase() {
            'b' => Some(Shortcut::Format(InlineFormat::Bold)),
            'i' => Some(Shortcut::Format(InlineFormat::Italic)),
            'u' => Some(Shortcut::Format(InlineFormat::Underline)),
            'k' => Some(Shortcut::Link),
            'd' => Some(Shortcut::Docs),
            '8' if shift => Some(Shortcut::List(ListKind::Bullet)),
            '7' if shift => Some(Shortcut::List(ListKind::Ordered)),
            // Terminals often report the shifted symbol instead of the digit.
            '*' => Some(Shortcut::List(ListKind::Bullet)),
            '&' => Some(Shortcut::List(ListKind::Ordered)),
            _ => None,
        }
    }

    /// Shortcut reference lines with this platform's modifier names.
    pub fn help_lines(&self) -> Vec<String> {
        SHORTCUT_HELP
            .iter()
            .map(|entry| entry.render(self.platform))
            .collect()
    }
}

/// One key of a chord in the shortcut reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChordKey {
    Primary,
    Alt,
    Shift,
    Key(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelpEntry {
    pub chord: &'static [ChordKey],
    pub action: &'static str,
}

impl HelpEntry {
    pub fn render(&self, platform: Platform) -> String {
        let keys = self
            .chord
            .iter()
            .map(|key| match *key {
                ChordKey::Primary => platform.primary_name(),
                ChordKey::Alt => platform.alt_name(),
                ChordKey::Shift => "Shift",
                ChordKey::Key(name) => name,
            })
            .collect::<Vec<_>>();
        format!("{}: {}", keys.join(" + "), self.action)
    }
}

/// The documentation panel's contents.
pub const SHORTCUT_HELP: &[HelpEntry] = &[
    HelpEntry {
        chord: &[ChordKey::Primary, ChordKey::Key("B")],
        action: "Bold",
    },
    HelpEntry {
        chord: &[ChordKey::Primary, ChordKey::Key("I")],
        action: "Italic",
    },
    HelpEntry {
        chord: &[ChordKey::Primary, ChordKey::Key("U")],
        action: "Underline",
    },
    HelpEntry {
        chord: &[ChordKey::Primary, ChordKey::Key("K")],
        action: "Insert Link",
    },
    HelpEntry {
        chord: &[ChordKey::Primary, ChordKey::Shift, ChordKey::Key("8")],
        action: "Bullet List",
    },
    HelpEntry {
        chord: &[ChordKey::Primary, ChordKey::Shift, ChordKey::Key("7")],
        action: "Numbered List",
    },
    HelpEntry {
        chord: &[ChordKey::Primary, ChordKey::Alt, ChordKey::Key("1")],
        action: "Heading 1",
    },
    HelpEntry {
        chord: &[ChordKey::Primary, ChordKey::Alt, ChordKey::Key("2")],
        action: "Heading 2",
    },
    HelpEntry {
        chord: &[ChordKey::Primary, ChordKey::Alt, ChordKey::Key("3")],
        action: "Heading 3",
    },
    HelpEntry {
        chord: &[ChordKey::Primary, ChordKey::Alt, ChordKey::Key("4")],
        action: "Heading 4",
    },
    HelpEntry {
        chord: &[ChordKey::Primary, ChordKey::Alt, ChordKey::Key("5")],
        action: "Heading 5",
    },
    HelpEntry {
        chord: &[ChordKey::Primary, ChordKey::Alt, ChordKey::Key("6")],
        action: "Heading 6",
    },
    HelpEntry {
        chord: &[ChordKey::Primary, ChordKey::Key("D")],
        action: "Toggle Shortcut Reference",
    },
    HelpEntry {
        chord: &[ChordKey::Key("Esc")],
        action: "Exit editor focus",
    },
];
