use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::app::{Focus, Model, View};

use super::DOCS_WIDTH_PERCENT;
use super::document::document_view;
use super::overlays::{render_docs_panel, render_link_dialog};
use super::toolbar_row::render_toolbar_row;

/// Toolbar row, main pane and status line for a frame of `area`.
pub fn split_screen(area: Rect) -> (Rect, Rect, Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);
    (rows[0], rows[1], rows[2])
}

/// Main pane split into document and docs panel columns.
pub fn split_main_columns(area: Rect, docs_visible: bool) -> (Rect, Option<Rect>) {
    if !docs_visible {
        return (area, None);
    }
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(100 - DOCS_WIDTH_PERCENT),
            Constraint::Percentage(DOCS_WIDTH_PERCENT),
        ])
        .split(area);
    (columns[0], Some(columns[1]))
}

/// Render the whole UI.
pub fn render(model: &Model, frame: &mut Frame) {
    let _scope = crate::perf::scope("ui.render");
    let area = frame.area();
    let (toolbar_area, main_area, status_area) = split_screen(area);

    render_toolbar_row(&model.toolbar.buttons(), frame, toolbar_area);

    let (doc_area, docs_area) = split_main_columns(main_area, model.toolbar.docs_visible());
    match model.view {
        View::Editor => render_document(model, frame, doc_area),
        View::Preview => render_preview(model, frame, doc_area),
    }
    if let Some(docs_area) = docs_area {
        render_docs_panel(&model.toolbar.help_lines(), frame, docs_area);
    }

    render_status_bar(model, frame, status_area);

    if model.toolbar.dialog().is_open() {
        render_link_dialog(model.toolbar.dialog(), frame, area);
    }
}

fn render_document(model: &Model, frame: &mut Frame, area: Rect) {
    let view = document_view(&model.document);
    let block = Block::default().borders(Borders::TOP).title("Editor");
    let inner = block.inner(area);
    frame.render_widget(Paragraph::new(view.lines).block(block), area);

    if model.focus == Focus::Editor
        && let Some((col, row)) = view.caret
        && col < inner.width
        && row < inner.height
    {
        frame.set_cursor_position(Position::new(inner.x + col, inner.y + row));
    }
}

fn render_preview(model: &Model, frame: &mut Frame, area: Rect) {
    frame.render_widget(
        Paragraph::new(model.published_markup())
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::TOP).title("Preview")),
        area,
    );
}

fn render_status_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let platform = model.toolbar.config().platform;
    let focus = match model.focus {
        Focus::Editor => "editor",
        Focus::Dialog => "link dialog",
        Focus::Blurred => "blurred (Enter to edit)",
    };
    let mut status = format!(
        " editbar  [{focus}]  {}+D: docs  Ctrl+Q: quit",
        platform.primary_name()
    );
    if let Some(err) = model.last_error() {
        status.push_str("  error: ");
        status.push_str(&err);
    }
    frame.render_widget(
        Paragraph::new(status).style(Style::default().bg(Color::DarkGray).fg(Color::White)),
        area,
    );
}
