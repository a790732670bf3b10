use std::cell::RefCell;
use std::rc::Rc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use editbar::config::{Platform, ToolbarConfig};
use editbar::document::{
    BlockType, DocumentEngine, DocumentReader, HeadingLevel, ListKind, MemoryDocument, NodeKind,
    Point, Selection, TextFormat,
};
use editbar::toolbar::resolver::resolve;
use editbar::toolbar::{Effect, KeyboardHub, Message, Toolbar, ToolbarState};

fn toolbar() -> Toolbar {
    Toolbar::new(ToolbarConfig {
        platform: Platform::Other,
        ..ToolbarConfig::default()
    })
}

fn paragraph(text: &str) -> (MemoryDocument, editbar::document::NodeId) {
    let mut doc = MemoryDocument::empty();
    let node = doc.push_block(BlockType::Paragraph, text);
    doc.set_caret(Point::new(node, 0));
    doc.drain_events();
    (doc, node)
}

#[test]
fn test_node_selection_resolves_to_default_state() {
    let (mut doc, node) = paragraph("text");
    doc.set_selection(Some(Selection::Node(node)));
    assert_eq!(resolve(&doc), ToolbarState::default());

    doc.set_selection(None);
    assert_eq!(resolve(&doc), ToolbarState::default());
}

#[test]
fn test_resolve_is_idempotent() {
    let mut doc = MemoryDocument::empty();
    let items = doc.push_list(ListKind::Ordered, &["one", "two"]);
    doc.select_text(items[1]);
    let first = resolve(&doc);
    assert_eq!(first.list, Some(ListKind::Ordered));
    assert_eq!(resolve(&doc), first);
}

#[test]
fn test_heading_toggle_is_an_involution() {
    let (mut doc, _) = paragraph("Title");
    let mut toolbar = toolbar();
    let h2 = Message::SetBlock(BlockType::Heading(HeadingLevel::H2));

    toolbar.handle(&mut doc, h2.clone());
    assert_eq!(doc.block_kinds(), vec![NodeKind::Heading(HeadingLevel::H2)]);
    assert!(toolbar.state().heading_active(HeadingLevel::H2));

    toolbar.handle(&mut doc, h2);
    assert_eq!(doc.block_kinds(), vec![NodeKind::Paragraph]);
    assert_eq!(toolbar.state().heading, None);
}

#[test]
fn test_list_toggle_is_an_involution() {
    let (mut doc, _) = paragraph("item");
    let mut toolbar = toolbar();
    let bullet = Message::ToggleList(ListKind::Bullet);

    toolbar.handle(&mut doc, bullet.clone());
    assert_eq!(doc.block_kinds(), vec![NodeKind::List(ListKind::Bullet)]);
    assert!(toolbar.state().list_active(ListKind::Bullet));

    toolbar.handle(&mut doc, bullet);
    assert_eq!(doc.block_kinds(), vec![NodeKind::Paragraph]);
    assert_eq!(toolbar.state().list, None);
}

#[test]
fn test_collapsed_link_insertion_through_dialog() {
    let (mut doc, _) = paragraph("");
    let published = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&published);
    let mut toolbar = toolbar().on_content_change(move |markup| sink.borrow_mut().push(markup.to_string()));

    toolbar.handle(&mut doc, Message::OpenLinkDialog);
    assert_eq!(toolbar.settle(&mut doc), vec![Effect::FocusUrlField]);
    toolbar.handle(&mut doc, Message::LinkUrlChanged("https://example.com".into()));
    toolbar.handle(&mut doc, Message::LinkTextChanged("Example".into()));
    toolbar.handle(&mut doc, Message::CommitLink);
    assert_eq!(toolbar.settle(&mut doc), vec![Effect::FocusEditor]);

    let links = doc.links();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].0, "Example");
    assert_eq!(links[0].1.url, "https://example.com");
    assert_eq!(links[0].1.target.as_deref(), Some("_blank"));

    let published = published.borrow();
    assert_eq!(published.len(), 1);
    assert_eq!(
        published[0],
        r#"<p><a href="https://example.com" target="_blank" rel="noreferrer"><span>Example</span></a></p>"#
    );
}

#[test]
fn test_empty_url_does_not_mutate() {
    let (mut doc, node) = paragraph("hello");
    doc.select_text(node);
    let before = doc.generate_markup().unwrap();
    let mut toolbar = toolbar();

    toolbar.handle(&mut doc, Message::OpenLinkDialog);
    toolbar.handle(&mut doc, Message::CommitLink);
    toolbar.settle(&mut doc);

    assert_eq!(doc.transactions(), 0);
    assert_eq!(doc.generate_markup().unwrap(), before);
    assert!(!toolbar.dialog().is_open());
}

#[test]
fn test_deep_chain_without_list_item_terminates() {
    let mut doc = MemoryDocument::empty();
    let mut parent = doc.append_node(doc.root(), NodeKind::Paragraph);
    for _ in 0..11 {
        parent = doc.append_node(parent, NodeKind::Link);
    }
    let text = doc.append_text(parent, "deep", TextFormat::BOLD);
    doc.select_text(text);

    let state = resolve(&doc);
    assert_eq!(state.list, None);
    assert!(state.bold);
}

#[test]
fn test_keys_without_primary_modifier_do_nothing() {
    let (mut doc, node) = paragraph("hello");
    doc.select_text(node);
    doc.drain_events();
    let hub = KeyboardHub::new();
    let mut toolbar = toolbar();
    toolbar.activate(&hub);

    for code in [KeyCode::Char('b'), KeyCode::Char('8'), KeyCode::Enter] {
        hub.broadcast(KeyEvent::new(code, KeyModifiers::NONE));
    }
    hub.broadcast(KeyEvent::new(KeyCode::Char('b'), KeyModifiers::ALT));

    assert!(toolbar.pump_keys(&mut doc).is_empty());
    assert_eq!(doc.transactions(), 0);
    assert_eq!(*toolbar.state(), ToolbarState::default());
}

#[test]
fn test_primary_chord_dispatches_once() {
    let (mut doc, node) = paragraph("hello");
    doc.select_text(node);
    let hub = KeyboardHub::new();
    let mut toolbar = toolbar();
    toolbar.activate(&hub);

    hub.broadcast(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
    toolbar.pump_keys(&mut doc);
    assert_eq!(doc.transactions(), 1);
    assert!(toolbar.state().underline);
}

#[test]
fn test_listener_released_on_drop_deactivate_and_panic() {
    let hub = KeyboardHub::new();

    let mut first = toolbar();
    first.activate(&hub);
    assert_eq!(hub.listener_count(), 1);
    first.deactivate();
    assert_eq!(hub.listener_count(), 0);

    {
        let mut scoped = toolbar();
        scoped.activate(&hub);
        assert_eq!(hub.listener_count(), 1);
    }
    assert_eq!(hub.listener_count(), 0);

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let mut mounted = toolbar();
        mounted.activate(&hub);
        panic!("host failed during render");
    }));
    assert!(result.is_err());
    assert_eq!(hub.listener_count(), 0);
}
