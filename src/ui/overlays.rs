use ratatui::Frame;
use ratatui::layout::{Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph, Wrap};
use unicode_width::UnicodeWidthStr;

use crate::toolbar::{DialogField, LinkDialog};

const DIALOG_WIDTH: u16 = 60;
const DIALOG_HEIGHT: u16 = 9;
const FIELD_LABEL_WIDTH: u16 = 7;

/// Screen rect of the link dialog for a frame of `area`.
pub fn link_dialog_rect(area: Rect) -> Rect {
    centered_popup_rect(DIALOG_WIDTH.min(area.width.saturating_sub(4)), DIALOG_HEIGHT, area)
}

pub fn render_link_dialog(dialog: &LinkDialog, frame: &mut Frame, area: Rect) {
    let popup = link_dialog_rect(area);
    let label_style = Style::default().fg(Color::Yellow);
    let focus_style = Style::default().add_modifier(Modifier::REVERSED);
    let dim_style = Style::default().fg(Color::Indexed(245));

    let field_line = |label: &'static str, value: &str, focused: bool| {
        let value_style = if focused { focus_style } else { Style::default() };
        Line::from(vec![
            Span::styled(format!("{label:<width$}", width = usize::from(FIELD_LABEL_WIDTH)), label_style),
            Span::styled(value.to_string(), value_style),
        ])
    };

    let insert_hint = if dialog.can_insert() {
        Span::raw("Enter: insert")
    } else {
        Span::styled("Enter: insert (needs a URL)", dim_style)
    };
    let lines = vec![
        field_line("URL", dialog.url(), dialog.field() == DialogField::Url),
        Line::raw(""),
        field_line("Text", dialog.text(), dialog.field() == DialogField::Text),
        Line::raw(""),
        Line::from(vec![
            insert_hint,
            Span::styled("  Tab: next field  Esc: cancel", dim_style),
        ]),
    ];

    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .title("Insert link")
                .borders(Borders::ALL)
                .padding(Padding::horizontal(1)),
        ),
        popup,
    );

    // Border plus horizontal padding on the left, border on top.
    let (row, value) = match dialog.field() {
        DialogField::Url => (0, dialog.url()),
        DialogField::Text => (2, dialog.text()),
    };
    let value_width = u16::try_from(value.width()).unwrap_or(u16::MAX);
    let x = popup
        .x
        .saturating_add(2 + FIELD_LABEL_WIDTH)
        .saturating_add(value_width)
        .min(popup.right().saturating_sub(2));
    frame.set_cursor_position(Position::new(x, popup.y + 1 + row));
}

/// Keyboard documentation panel.
pub fn render_docs_panel(help_lines: &[String], frame: &mut Frame, area: Rect) {
    let lines = help_lines
        .iter()
        .map(|line| Line::raw(line.clone()))
        .collect::<Vec<_>>();
    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }).block(
            Block::default()
                .title("Keyboard shortcuts")
                .borders(Borders::ALL)
                .padding(Padding::horizontal(1)),
        ),
        area,
    );
}

fn centered_popup_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(w) / 2);
    let y = area.y + (area.height.saturating_sub(h) / 2);
    Rect::new(x, y, w, h)
}
