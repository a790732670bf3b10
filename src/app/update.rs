use crossterm::event::KeyEvent;

use crate::app::Model;
use crate::app::model::{Focus, View};
use crate::document::{BlockType, DocumentEngine, DocumentError, DocumentReader, Selection};
use crate::toolbar;

/// All possible events and actions in the demo host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A key the toolbar router claims; delivered through the hub.
    Chord(KeyEvent),
    /// A toolbar button press or dialog action.
    Toolbar(toolbar::Message),

    // Editor
    /// Type a character at the selection
    Insert(char),
    /// Delete the selection, or the character before the caret
    Backspace,
    /// Start a new paragraph after the current block
    NewLine,
    /// Move the caret one character
    MoveCaret { backward: bool, extend: bool },

    // Link dialog
    /// Type into the focused dialog field
    LinkFieldInput(char),
    /// Delete the last character of the focused dialog field
    LinkFieldBackspace,

    /// Return to the editor from the preview or a blurred state
    FocusEditor,
    /// Terminal resized
    Resize(u16, u16),
    /// Quit the application
    Quit,
}

/// Apply `msg` to `model`, then run deferred toolbar work.
pub fn update(mut model: Model, msg: Message) -> Model {
    match msg {
        Message::Chord(key) => {
            model.hub.broadcast(key);
            let effects = model.toolbar.pump_keys(&mut model.document);
            model.apply_effects(effects);
        }
        Message::Toolbar(message) => {
            let effects = model.toolbar.handle(&mut model.document, message);
            model.apply_effects(effects);
        }
        Message::Insert(c) => {
            if model.focus == Focus::Editor {
                let mut buf = [0; 4];
                let text: &str = c.encode_utf8(&mut buf);
                edit(&mut model, |tx| tx.insert_text(text));
            }
        }
        Message::Backspace => {
            if model.focus == Focus::Editor {
                edit(&mut model, |tx| {
                    let collapsed = matches!(
                        tx.selection(),
                        Some(Selection::Range(range)) if range.is_collapsed()
                    );
                    if collapsed {
                        tx.extend_selection_backward(1)?;
                    }
                    tx.insert_text("")
                });
            }
        }
        Message::NewLine => {
            if model.focus == Focus::Editor {
                edit(&mut model, |tx| tx.insert_block(BlockType::Paragraph));
                model.document.caret_to_next_block();
            }
        }
        Message::MoveCaret { backward, extend } => {
            if model.focus == Focus::Editor {
                model.document.move_caret(backward, extend);
            }
        }
        Message::LinkFieldInput(c) => model.toolbar.edit_link_field(|field| field.push(c)),
        Message::LinkFieldBackspace => model.toolbar.edit_link_field(|field| {
            field.pop();
        }),
        Message::FocusEditor => {
            model.focus = Focus::Editor;
            model.view = View::Editor;
        }
        Message::Resize(width, height) => model.size = (width, height),
        Message::Quit => model.should_quit = true,
    }

    let effects = model.toolbar.settle(&mut model.document);
    model.apply_effects(effects);
    model.toolbar.sync(&mut model.document);
    model
}

fn edit<F>(model: &mut Model, f: F)
where
    F: FnOnce(&mut dyn crate::document::EditingPrimitives) -> Result<(), DocumentError>,
{
    if let Err(err) = model.document.update(f) {
        tracing::debug!(%err, "edit rejected");
    }
}
