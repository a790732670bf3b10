use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::{Position, Rect};

use crate::app::model::Focus;
use crate::app::{App, Message, Model};
use crate::toolbar;

impl App {
    pub(super) fn handle_event(event: Event, model: &Model) -> Option<Message> {
        match event {
            Event::Key(key) => Self::handle_key(key, model),
            Event::Mouse(mouse) => Self::handle_mouse(mouse, model),
            Event::Resize(w, h) => {
                crate::perf::log_event("event.resize", format!("width={w} height={h}"));
                Some(Message::Resize(w, h))
            }
            _ => None,
        }
    }

    pub(super) fn handle_key(key: KeyEvent, model: &Model) -> Option<Message> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('q' | 'c'))
        {
            return Some(Message::Quit);
        }
        if model.toolbar.router().route(&key).is_some() {
            return Some(Message::Chord(key));
        }

        match model.focus {
            Focus::Dialog => match key.code {
                KeyCode::Char(c) => Some(Message::LinkFieldInput(c)),
                KeyCode::Backspace => Some(Message::LinkFieldBackspace),
                KeyCode::Tab | KeyCode::BackTab => {
                    Some(Message::Toolbar(toolbar::Message::LinkNextField))
                }
                KeyCode::Enter => Some(Message::Toolbar(toolbar::Message::CommitLink)),
                _ => None,
            },
            Focus::Editor => {
                let extend = key.modifiers.contains(KeyModifiers::SHIFT);
                match key.code {
                    KeyCode::Char(c) => Some(Message::Insert(c)),
                    KeyCode::Backspace => Some(Message::Backspace),
                    KeyCode::Enter => Some(Message::NewLine),
                    KeyCode::Left => Some(Message::MoveCaret {
                        backward: true,
                        extend,
                    }),
                    KeyCode::Right => Some(Message::MoveCaret {
                        backward: false,
                        extend,
                    }),
                    _ => None,
                }
            }
            Focus::Blurred => match key.code {
                KeyCode::Enter | KeyCode::Char('i') => Some(Message::FocusEditor),
                KeyCode::Char('q') => Some(Message::Quit),
                _ => None,
            },
        }
    }

    pub(super) fn handle_mouse(mouse: MouseEvent, model: &Model) -> Option<Message> {
        if !matches!(mouse.kind, MouseEventKind::Up(MouseButton::Left)) {
            return None;
        }
        let area = Rect::new(0, 0, model.size.0, model.size.1);
        let at = Position::new(mouse.column, mouse.row);

        if model.toolbar.dialog().is_open() {
            if crate::ui::link_dialog_rect(area).contains(at) {
                return None;
            }
            return Some(Message::Toolbar(toolbar::Message::DismissLinkDialog));
        }

        let (toolbar_area, _, _) = crate::ui::split_screen(area);
        if !toolbar_area.contains(at) {
            return None;
        }
        let buttons = model.toolbar.buttons();
        crate::ui::button_at(&buttons, mouse.column - toolbar_area.x)
            .map(|index| Message::Toolbar(buttons[index].message.clone()))
    }
}
