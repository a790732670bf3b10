use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::config::{Platform, ToolbarConfig, ToolbarVariant};
use crate::document::{BlockType, DocumentReader, MemoryDocument, NodeKind, Point, TextFormat};
use crate::toolbar;

use super::{App, Focus, Message, Model, View, update};

fn config(variant: ToolbarVariant) -> ToolbarConfig {
    ToolbarConfig {
        platform: Platform::Other,
        variant,
        ..ToolbarConfig::default()
    }
}

fn create_test_model() -> (Model, crate::document::NodeId) {
    let mut doc = MemoryDocument::empty();
    let text = doc.push_block(BlockType::Paragraph, "Hello world");
    doc.set_caret(Point::new(text, 5));
    (Model::new(config(ToolbarVariant::Editor), doc, (80, 24)), text)
}

fn ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn send(model: Model, event: KeyEvent) -> Model {
    match App::handle_key(event, &model) {
        Some(msg) => update(model, msg),
        None => model,
    }
}

fn doc_text(model: &Model) -> String {
    model.document.plain_text(model.document.root())
}

fn click(model: &Model, column: u16, row: u16) -> Option<Message> {
    App::handle_mouse(
        MouseEvent {
            kind: MouseEventKind::Up(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        },
        model,
    )
}

#[test]
fn test_chord_is_routed_through_hub() {
    let (model, text) = create_test_model();
    let msg = App::handle_key(ctrl('b'), &model);
    assert_eq!(msg, Some(Message::Chord(ctrl('b'))));

    let mut model = model;
    model.document.select_text(text);
    let model = update(model, Message::Chord(ctrl('b')));
    assert!(model.toolbar.state().bold);
    assert_eq!(model.document.format_of(text), Some(TextFormat::BOLD));
}

#[test]
fn test_plain_typing_inserts_text() {
    let (model, _) = create_test_model();
    let model = send(model, key(KeyCode::Char(',')));
    assert_eq!(doc_text(&model), "Hello, world");
    assert!(model.published_markup().contains("Hello, world"));
}

#[test]
fn test_backspace_deletes_previous_char() {
    let (model, _) = create_test_model();
    let model = send(model, key(KeyCode::Backspace));
    assert_eq!(doc_text(&model), "Hell world");
}

#[test]
fn test_shift_arrows_extend_selection() {
    let (model, _) = create_test_model();
    let extend = KeyEvent::new(KeyCode::Left, KeyModifiers::SHIFT);
    let model = send(send(model, extend), extend);
    let range = model.document.selection().unwrap();
    let range = range.as_range().unwrap();
    assert_eq!(model.document.text_content(range).unwrap(), "lo");
}

#[test]
fn test_enter_starts_new_paragraph() {
    let (model, _) = create_test_model();
    let model = send(model, key(KeyCode::Enter));
    assert_eq!(
        model.document.block_kinds(),
        vec![NodeKind::Paragraph, NodeKind::Paragraph]
    );
    let model = send(model, key(KeyCode::Char('x')));
    assert!(model.published_markup().ends_with("<p><span>x</span></p>"));
}

#[test]
fn test_quit_keys() {
    let (model, _) = create_test_model();
    assert_eq!(App::handle_key(ctrl('q'), &model), Some(Message::Quit));
    assert_eq!(App::handle_key(ctrl('c'), &model), Some(Message::Quit));
    let model = update(model, Message::Quit);
    assert!(model.should_quit);
}

#[test]
fn test_escape_blurs_editor_variant() {
    let (model, _) = create_test_model();
    let model = send(model, key(KeyCode::Esc));
    assert_eq!(model.focus, Focus::Blurred);

    // Typing while blurred does not edit.
    let before = model.document.transactions();
    let model = send(model, key(KeyCode::Char('x')));
    assert_eq!(model.document.transactions(), before);

    let model = send(model, key(KeyCode::Enter));
    assert_eq!(model.focus, Focus::Editor);
}

#[test]
fn test_escape_shows_preview_in_tabbed_variant() {
    let mut doc = MemoryDocument::empty();
    let text = doc.push_block(BlockType::Paragraph, "a");
    doc.set_caret(Point::new(text, 0));
    let model = Model::new(config(ToolbarVariant::Tabbed), doc, (80, 24));

    let model = send(model, key(KeyCode::Esc));
    assert_eq!(model.view, View::Preview);
    assert_eq!(model.focus, Focus::Blurred);
}

#[test]
fn test_link_dialog_flow_from_keyboard() {
    let (model, _) = create_test_model();
    let model = send(model, ctrl('k'));
    assert!(model.toolbar.dialog().is_open());
    assert_eq!(model.focus, Focus::Dialog);

    let model = "https://example.com"
        .chars()
        .fold(model, |m, c| send(m, key(KeyCode::Char(c))));
    let model = send(model, key(KeyCode::Tab));
    let model = "Example"
        .chars()
        .fold(model, |m, c| send(m, key(KeyCode::Char(c))));
    assert_eq!(doc_text(&model), "Hello world");

    let model = send(model, key(KeyCode::Enter));
    assert!(!model.toolbar.dialog().is_open());
    assert_eq!(model.focus, Focus::Editor);

    let links = model.document.links();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].0, "Example");
    assert_eq!(links[0].1.url, "https://example.com");
    assert!(
        model
            .published_markup()
            .contains(r#"<a href="https://example.com" target="_blank""#)
    );
}

#[test]
fn test_escape_in_dialog_returns_to_editor() {
    let (model, _) = create_test_model();
    let model = send(model, ctrl('k'));
    let model = send(model, key(KeyCode::Char('h')));
    let model = send(model, key(KeyCode::Esc));
    assert!(!model.toolbar.dialog().is_open());
    assert_eq!(model.focus, Focus::Editor);
    assert!(model.document.links().is_empty());
}

#[test]
fn test_toolbar_click_presses_button() {
    let (model, _) = create_test_model();
    // H1 is the first button after the inline group.
    let msg = click(&model, 15, 0);
    assert_eq!(
        msg,
        Some(Message::Toolbar(toolbar::Message::SetBlock(BlockType::Heading(
            crate::document::HeadingLevel::H1
        ))))
    );
    assert_eq!(click(&model, 15, 5), None);
}

#[test]
fn test_click_outside_dialog_dismisses() {
    let (model, _) = create_test_model();
    let model = update(model, Message::Toolbar(toolbar::Message::OpenLinkDialog));
    assert_eq!(click(&model, 40, 12), None);

    let msg = click(&model, 0, 0);
    assert_eq!(
        msg,
        Some(Message::Toolbar(toolbar::Message::DismissLinkDialog))
    );
    let model = update(model, msg.unwrap());
    assert!(!model.toolbar.dialog().is_open());
}

#[test]
fn test_resize_updates_size() {
    let (model, _) = create_test_model();
    let msg = App::handle_event(Event::Resize(120, 40), &model);
    assert_eq!(msg, Some(Message::Resize(120, 40)));
    let model = update(model, msg.unwrap());
    assert_eq!(model.size, (120, 40));
}

#[test]
fn test_failed_command_surfaces_in_status() {
    let mut doc = MemoryDocument::empty();
    let list = doc.append_node(doc.root(), NodeKind::List(crate::document::ListKind::Bullet));
    let item = doc.append_node(list, NodeKind::ListItem);
    let text = doc.append_text(item, "orphan", TextFormat::empty());
    doc.select_text(text);
    doc.detach(item).unwrap();
    let model = Model::new(config(ToolbarVariant::Editor), doc, (80, 24));

    let model = update(
        model,
        Message::Toolbar(toolbar::Message::SetBlock(BlockType::Heading(
            crate::document::HeadingLevel::H2,
        ))),
    );
    assert!(model.last_error().is_some());
}

#[test]
fn test_sample_document_starts_in_heading() {
    let model = Model::new(
        config(ToolbarVariant::Editor),
        Model::sample_document(),
        (80, 24),
    );
    assert_eq!(
        model.toolbar.state().heading,
        Some(crate::document::HeadingLevel::H1)
    );
    assert!(model.toolbar.is_active());
    assert_eq!(model.hub.listener_count(), 1);
}
