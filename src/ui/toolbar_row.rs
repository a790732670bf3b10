use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use unicode_width::UnicodeWidthStr;

use crate::toolbar::ToolbarButton;
use crate::toolbar::buttons::ButtonGroup;

/// `(x, width)` of every button, laid out left to right with a gap
/// between groups.
pub fn button_slots(buttons: &[ToolbarButton]) -> Vec<(u16, u16)> {
    let mut slots = Vec::with_capacity(buttons.len());
    let mut x: u16 = 0;
    let mut previous: Option<ButtonGroup> = None;
    for button in buttons {
        if previous.is_some_and(|group| group != button.group) {
            x = x.saturating_add(2);
        }
        let width = u16::try_from(button.caption.width() + 2).unwrap_or(u16::MAX);
        slots.push((x, width));
        x = x.saturating_add(width);
        previous = Some(button.group);
    }
    slots
}

/// Index of the button under `column`, if any.
pub fn button_at(buttons: &[ToolbarButton], column: u16) -> Option<usize> {
    button_slots(buttons)
        .into_iter()
        .position(|(x, width)| column >= x && column < x.saturating_add(width))
}

pub fn render_toolbar_row(buttons: &[ToolbarButton], frame: &mut Frame, area: Rect) {
    let mut spans = Vec::new();
    let mut cursor: u16 = 0;
    for (button, (x, _)) in buttons.iter().zip(button_slots(buttons)) {
        if x > cursor {
            spans.push(Span::raw(" ".repeat(usize::from(x - cursor))));
        }
        let style = if button.is_active() {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White).bg(Color::Indexed(238))
        };
        let caption = format!(" {} ", button.caption);
        cursor = x.saturating_add(u16::try_from(caption.width()).unwrap_or(u16::MAX));
        spans.push(Span::styled(caption, style));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolbar::{ToolbarState, toolbar_buttons};

    #[test]
    fn test_groups_are_separated() {
        let buttons = toolbar_buttons(&ToolbarState::default(), false);
        let slots = button_slots(&buttons);
        // B I U S are adjacent, H1 starts after a two-column gap.
        assert_eq!(slots[0], (0, 3));
        assert_eq!(slots[3], (9, 3));
        assert_eq!(slots[4], (14, 4));
    }

    #[test]
    fn test_button_at_hits_and_misses() {
        let buttons = toolbar_buttons(&ToolbarState::default(), false);
        assert_eq!(button_at(&buttons, 1), Some(0));
        assert_eq!(button_at(&buttons, 12), None);
        assert_eq!(button_at(&buttons, 14), Some(4));
        assert_eq!(button_at(&buttons, 500), None);
    }
}
