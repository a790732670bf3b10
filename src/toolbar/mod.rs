//! Formatting toolbar core.
//!
//! [`Toolbar`] follows the same Message / update / effect flow as the rest
//! of the crate: the host feeds it [`Message`]s (or raw key events through
//! a [`KeyListener`]), the toolbar mutates the document through the
//! [`CommandDispatcher`], and returns [`Effect`]s the host must carry out.
//! Work that has to wait for the host to catch up sits in a
//! [`ContinuationQueue`] until [`Toolbar::settle`] runs it.

pub mod buttons;
pub mod continuation;
pub mod dispatcher;
pub mod keyboard;
pub mod link_dialog;
pub mod resolver;
pub mod shortcuts;
mod state;

use std::fmt;

use crossterm::event::KeyEvent;

use crate::config::{ToolbarConfig, ToolbarVariant};
use crate::document::{BlockType, DocumentEngine, EngineEvent, InlineFormat, ListKind, Selection};
use crate::markup::clean_markup;
use crate::perf;

pub use buttons::{ToolbarButton, toolbar_buttons};
pub use continuation::{Continuation, ContinuationQueue};
pub use dispatcher::{CommandDispatcher, DispatchError};
pub use keyboard::{KeyListener, KeyboardHub};
pub use link_dialog::{DialogField, DialogPhase, LinkDialog};
pub use shortcuts::{Shortcut, ShortcutRouter};
pub use state::ToolbarState;

/// Inputs the toolbar reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    ToggleFormat(InlineFormat),
    SetBlock(BlockType),
    ToggleList(ListKind),
    /// Open the link dialog for the current selection.
    OpenLinkDialog,
    /// Ask the host's [`UrlPrompt`] for a URL and link directly.
    PromptLink,
    LinkUrlChanged(String),
    LinkTextChanged(String),
    LinkNextField,
    CommitLink,
    CancelLink,
    /// Click outside the dialog.
    DismissLinkDialog,
    ToggleDocs,
    Escape,
}

impl From<Shortcut> for Message {
    fn from(shortcut: Shortcut) -> Self {
        match shortcut {
            Shortcut::Format(format) => Self::ToggleFormat(format),
            Shortcut::List(kind) => Self::ToggleList(kind),
            Shortcut::Heading(level) => Self::SetBlock(BlockType::Heading(level)),
            Shortcut::Link => Self::PromptLink,
            Shortcut::Docs => Self::ToggleDocs,
            Shortcut::Escape => Self::Escape,
        }
    }
}

/// Side effects the host must perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    FocusUrlField,
    FocusEditor,
    /// Leave the editor (blur) in the standalone variant.
    ExitEditor,
    /// Switch to the preview tab in the tabbed variant.
    ShowPreview,
    DocsVisibility(bool),
}

/// Blocking URL input used by the primary+K shortcut.
pub trait UrlPrompt {
    /// `None` when the user cancelled.
    fn prompt_url(&mut self, label_key: &'static str) -> Option<String>;
}

type ErrorHandler = Box<dyn FnMut(&DispatchError)>;
type ContentListener = Box<dyn FnMut(&str)>;

pub struct Toolbar {
    config: ToolbarConfig,
    router: ShortcutRouter,
    dispatcher: CommandDispatcher,
    state: ToolbarState,
    dialog: LinkDialog,
    queue: ContinuationQueue,
    docs_visible: bool,
    listener: Option<KeyListener>,
    prompt: Option<Box<dyn UrlPrompt>>,
    on_error: ErrorHandler,
    on_content: Option<ContentListener>,
}

impl fmt::Debug for Toolbar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Toolbar")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("dialog", &self.dialog)
            .field("queue", &self.queue)
            .field("docs_visible", &self.docs_visible)
            .field("active", &self.listener.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for Toolbar {
    fn default() -> Self {
        Self::new(ToolbarConfig::default())
    }
}

impl Toolbar {
    pub fn new(config: ToolbarConfig) -> Self {
        Self {
            router: ShortcutRouter::new(config.platform),
            dispatcher: CommandDispatcher::new(config.link_target.clone()),
            docs_visible: config.docs_visible,
            config,
            state: ToolbarState::default(),
            dialog: LinkDialog::new(),
            queue: ContinuationQueue::new(),
            listener: None,
            prompt: None,
            on_error: Box::new(|err| tracing::error!(%err, "toolbar command failed")),
            on_content: None,
        }
    }

    /// Route dispatch failures to `handler` instead of the log.
    #[must_use]
    pub fn with_error_handler(mut self, handler: impl FnMut(&DispatchError) + 'static) -> Self {
        self.on_error = Box::new(handler);
        self
    }

    #[must_use]
    pub fn with_url_prompt(mut self, prompt: impl UrlPrompt + 'static) -> Self {
        self.prompt = Some(Box::new(prompt));
        self
    }

    /// Receive cleaned markup once per committed document update.
    #[must_use]
    pub fn on_content_change(mut self, listener: impl FnMut(&str) + 'static) -> Self {
        self.on_content = Some(Box::new(listener));
        self
    }

    pub const fn config(&self) -> &ToolbarConfig {
        &self.config
    }

    pub const fn router(&self) -> &ShortcutRouter {
        &self.router
    }

    pub const fn state(&self) -> &ToolbarState {
        &self.state
    }

    pub const fn dialog(&self) -> &LinkDialog {
        &self.dialog
    }

    pub const fn docs_visible(&self) -> bool {
        self.docs_visible
    }

    pub fn buttons(&self) -> Vec<ToolbarButton> {
        toolbar_buttons(&self.state, self.docs_visible)
    }

    /// Documentation panel lines for the configured platform.
    pub fn help_lines(&self) -> Vec<String> {
        self.router.help_lines()
    }

    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Start listening to `hub`. Re-activating replaces the old listener.
    pub fn activate(&mut self, hub: &KeyboardHub) {
        self.listener = Some(hub.listen());
    }

    /// Release the key listener.
    pub fn deactivate(&mut self) {
        self.listener = None;
    }

    pub const fn is_active(&self) -> bool {
        self.listener.is_some()
    }

    /// Recompute state from scratch, e.g. right after mounting.
    pub fn refresh<E: DocumentEngine>(&mut self, doc: &E) {
        let _scope = perf::scope("toolbar.resolve");
        self.state = resolver::resolve(doc);
    }

    /// Consume engine notifications: re-resolve on every one and publish
    /// content for every committed update.
    pub fn sync<E: DocumentEngine>(&mut self, doc: &mut E) {
        for event in doc.drain_events() {
            self.refresh(&*doc);
            if event == EngineEvent::DocumentUpdated {
                self.publish_content(&*doc);
            }
        }
    }

    fn publish_content<E: DocumentEngine>(&mut self, doc: &E) {
        let Some(listener) = self.on_content.as_mut() else {
            return;
        };
        match doc.generate_markup() {
            Ok(markup) => listener(&clean_markup(&markup)),
            Err(err) => tracing::warn!(%err, "markup generation failed; content change skipped"),
        }
    }

    /// Handle key events delivered to the active listener.
    pub fn pump_keys<E: DocumentEngine>(&mut self, doc: &mut E) -> Vec<Effect> {
        let Some(listener) = self.listener.as_ref() else {
            return Vec::new();
        };
        let mut effects = Vec::new();
        for key in listener.pending() {
            effects.extend(self.handle_key(doc, &key));
        }
        effects
    }

    /// Route one key event; non-chords are ignored.
    pub fn handle_key<E: DocumentEngine>(&mut self, doc: &mut E, key: &KeyEvent) -> Vec<Effect> {
        match self.router.route(key) {
            Some(shortcut) => self.handle(doc, shortcut.into()),
            None => Vec::new(),
        }
    }

    pub fn handle<E: DocumentEngine>(&mut self, doc: &mut E, message: Message) -> Vec<Effect> {
        self.sync(doc);
        let mut effects = Vec::new();
        let result = match message {
            Message::ToggleFormat(format) => self.dispatcher.toggle_inline_format(doc, format),
            Message::SetBlock(block) => self.dispatcher.set_block_type(doc, block),
            Message::ToggleList(kind) => self.dispatcher.toggle_list(doc, kind, &self.state),
            Message::OpenLinkDialog => {
                self.open_link_dialog(&*doc);
                Ok(())
            }
            Message::PromptLink => match self.prompt.as_mut() {
                Some(prompt) => match prompt.prompt_url("enterUrl") {
                    Some(url) => self.dispatcher.toggle_link(doc, &url),
                    None => Ok(()),
                },
                None => {
                    self.open_link_dialog(&*doc);
                    Ok(())
                }
            },
            Message::LinkUrlChanged(url) => {
                self.dialog.set_url(url);
                Ok(())
            }
            Message::LinkTextChanged(text) => {
                self.dialog.set_text(text);
                Ok(())
            }
            Message::LinkNextField => {
                self.dialog.next_field();
                Ok(())
            }
            Message::CommitLink => {
                self.dialog.commit(&mut self.queue);
                Ok(())
            }
            Message::CancelLink | Message::DismissLinkDialog => {
                self.dialog.cancel(&mut self.queue);
                Ok(())
            }
            Message::ToggleDocs => {
                self.docs_visible = !self.docs_visible;
                effects.push(Effect::DocsVisibility(self.docs_visible));
                Ok(())
            }
            Message::Escape => {
                if !self.dialog.cancel(&mut self.queue) {
                    effects.push(match self.config.variant {
                        ToolbarVariant::Editor => Effect::ExitEditor,
                        ToolbarVariant::Tabbed => Effect::ShowPreview,
                    });
                }
                Ok(())
            }
        };
        if let Err(err) = result {
            (self.on_error)(&err);
        }
        self.sync(doc);
        effects
    }

    fn open_link_dialog<E: DocumentEngine>(&mut self, doc: &E) {
        let text = match doc.selection() {
            Some(Selection::Range(range)) => doc.text_content(&range).unwrap_or_default(),
            _ => String::new(),
        };
        self.dialog.open(text, &mut self.queue);
    }

    /// Run every deferred step, oldest first, including steps queued while
    /// settling.
    pub fn settle<E: DocumentEngine>(&mut self, doc: &mut E) -> Vec<Effect> {
        let mut effects = Vec::new();
        while let Some(step) = self.queue.pop() {
            match step {
                Continuation::FocusUrlField => effects.push(Effect::FocusUrlField),
                Continuation::FocusEditor => effects.push(Effect::FocusEditor),
                Continuation::ApplyLink { url, text } => {
                    if let Err(err) = self.dispatcher.apply_link(doc, &url, &text) {
                        (self.on_error)(&err);
                    }
                }
                Continuation::ResetLinkFields { generation } => {
                    self.dialog.reset(generation);
                }
            }
        }
        self.sync(doc);
        effects
    }

    /// Edit the focused dialog field in place.
    pub fn edit_link_field(&mut self, edit: impl FnOnce(&mut String)) {
        if self.dialog.is_open() {
            edit(self.dialog.field_mut());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crossterm::event::{KeyCode, KeyModifiers};

    use super::*;
    use crate::config::Platform;
    use crate::document::{
        DocumentReader, HeadingLevel, MemoryDocument, NodeKind, Point, TextFormat,
    };

    fn toolbar() -> Toolbar {
        Toolbar::new(ToolbarConfig {
            platform: Platform::Other,
            ..ToolbarConfig::default()
        })
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn test_selection_change_updates_state() {
        let mut doc = MemoryDocument::empty();
        let items = doc.push_list(ListKind::Ordered, &["a"]);
        let mut bar = toolbar();
        assert_eq!(bar.state().list, None);

        doc.set_caret(Point::new(items[0], 0));
        bar.sync(&mut doc);
        assert_eq!(bar.state().list, Some(ListKind::Ordered));
    }

    #[test]
    fn test_key_chord_dispatches() {
        let mut doc = MemoryDocument::new();
        let mut bar = toolbar();
        let chord = KeyEvent::new(KeyCode::Char('2'), KeyModifiers::CONTROL | KeyModifiers::ALT);
        bar.handle_key(&mut doc, &chord);
        assert_eq!(bar.state().heading, Some(HeadingLevel::H2));
        assert_eq!(doc.transactions(), 1);
    }

    #[test]
    fn test_plain_keys_do_nothing() {
        let mut doc = MemoryDocument::new();
        let mut bar = toolbar();
        for c in ['b', 'k', '1'] {
            let key = KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE);
            assert!(bar.handle_key(&mut doc, &key).is_empty());
        }
        assert_eq!(doc.transactions(), 0);
    }

    #[test]
    fn test_escape_depends_on_variant() {
        let mut doc = MemoryDocument::new();
        let esc = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);

        let mut editor = toolbar();
        assert_eq!(editor.handle_key(&mut doc, &esc), vec![Effect::ExitEditor]);

        let mut tabbed = Toolbar::new(ToolbarConfig {
            variant: ToolbarVariant::Tabbed,
            ..ToolbarConfig::default()
        });
        assert_eq!(tabbed.handle_key(&mut doc, &esc), vec![Effect::ShowPreview]);
    }

    #[test]
    fn test_escape_closes_open_dialog_first() {
        let mut doc = MemoryDocument::new();
        let mut bar = toolbar();
        bar.handle(&mut doc, Message::OpenLinkDialog);
        assert_eq!(bar.settle(&mut doc), vec![Effect::FocusUrlField]);

        let effects = bar.handle(&mut doc, Message::Escape);
        assert!(effects.is_empty());
        assert!(!bar.dialog().is_open());
    }

    #[test]
    fn test_link_dialog_commit_flow() {
        let mut doc = MemoryDocument::new();
        let mut bar = toolbar();
        bar.handle(&mut doc, Message::OpenLinkDialog);
        bar.settle(&mut doc);
        bar.handle(&mut doc, Message::LinkUrlChanged("https://example.com".into()));
        bar.handle(&mut doc, Message::LinkTextChanged("Example".into()));
        bar.handle(&mut doc, Message::CommitLink);

        assert!(!bar.dialog().is_open());
        assert_eq!(doc.transactions(), 0, "link applies only once settled");

        let effects = bar.settle(&mut doc);
        assert_eq!(effects, vec![Effect::FocusEditor]);
        assert_eq!(doc.links().len(), 1);
        assert_eq!(bar.dialog().url(), "");
    }

    #[test]
    fn test_open_dialog_prefills_selected_text() {
        let mut doc = MemoryDocument::empty();
        let text = doc.push_block(BlockType::Paragraph, "hello world");
        doc.select(Point::new(text, 6), Point::new(text, 11));
        let mut bar = toolbar();
        bar.handle(&mut doc, Message::OpenLinkDialog);
        assert_eq!(bar.dialog().text(), "world");
    }

    #[test]
    fn test_prompt_link_uses_url_prompt() {
        struct Fixed(Option<&'static str>);
        impl UrlPrompt for Fixed {
            fn prompt_url(&mut self, _: &'static str) -> Option<String> {
                self.0.map(str::to_string)
            }
        }

        let mut doc = MemoryDocument::empty();
        let text = doc.push_block(BlockType::Paragraph, "site");
        doc.select_text(text);
        let mut bar = toolbar().with_url_prompt(Fixed(Some("https://site.example")));
        bar.handle_key(&mut doc, &ctrl('k'));
        assert_eq!(doc.links().len(), 1);
        assert!(!bar.dialog().is_open());

        let mut cancelled = toolbar().with_url_prompt(Fixed(None));
        cancelled.handle_key(&mut doc, &ctrl('k'));
        assert_eq!(doc.transactions(), 1);
    }

    #[test]
    fn test_prompt_link_with_empty_url_keeps_links() {
        struct Answers(Vec<&'static str>);
        impl UrlPrompt for Answers {
            fn prompt_url(&mut self, _: &'static str) -> Option<String> {
                Some(self.0.remove(0).to_string())
            }
        }

        let published = Rc::new(RefCell::new(Vec::<String>::new()));
        let sink = Rc::clone(&published);
        let mut doc = MemoryDocument::empty();
        let text = doc.push_block(BlockType::Paragraph, "site");
        doc.select_text(text);
        let mut bar = toolbar()
            .with_url_prompt(Answers(vec!["https://a.example", ""]))
            .on_content_change(move |markup| sink.borrow_mut().push(markup.to_string()));

        bar.handle_key(&mut doc, &ctrl('k'));
        assert_eq!(doc.links().len(), 1);
        assert_eq!(doc.transactions(), 1);

        bar.handle_key(&mut doc, &ctrl('k'));
        assert_eq!(doc.links().len(), 1);
        assert_eq!(doc.transactions(), 1);
        assert_eq!(published.borrow().len(), 1);
    }

    #[test]
    fn test_prompt_link_without_prompt_opens_dialog() {
        let mut doc = MemoryDocument::new();
        let mut bar = toolbar();
        bar.handle_key(&mut doc, &ctrl('k'));
        assert!(bar.dialog().is_open());
    }

    #[test]
    fn test_docs_toggle_reports_visibility() {
        let mut doc = MemoryDocument::new();
        let mut bar = toolbar();
        assert_eq!(
            bar.handle_key(&mut doc, &ctrl('d')),
            vec![Effect::DocsVisibility(true)]
        );
        assert!(bar.docs_visible());
        assert_eq!(
            bar.handle(&mut doc, Message::ToggleDocs),
            vec![Effect::DocsVisibility(false)]
        );
    }

    #[test]
    fn test_fallback_failure_reaches_error_handler() {
        let mut doc = MemoryDocument::empty();
        let root = doc.root();
        let item = doc.append_node(root, NodeKind::ListItem);
        let text = doc.append_text(item, "orphan", TextFormat::empty());
        doc.detach(item).unwrap();
        doc.set_caret(Point::new(text, 0));

        let errors = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&errors);
        let mut bar =
            toolbar().with_error_handler(move |err| seen.borrow_mut().push(err.clone()));
        bar.handle(&mut doc, Message::SetBlock(BlockType::Heading(HeadingLevel::H1)));

        assert!(matches!(
            errors.borrow().as_slice(),
            [DispatchError::BlockFallback { .. }]
        ));
        assert_eq!(doc.transactions(), 0);
    }

    #[test]
    fn test_content_change_receives_clean_markup() {
        let published = Rc::new(RefCell::new(Vec::<String>::new()));
        let sink = Rc::clone(&published);
        let mut doc = MemoryDocument::empty();
        let text = doc.push_block(BlockType::Paragraph, "Hi");
        doc.set_caret(Point::new(text, 1));
        let mut bar =
            toolbar().on_content_change(move |markup| sink.borrow_mut().push(markup.to_string()));

        bar.handle(&mut doc, Message::SetBlock(BlockType::Heading(HeadingLevel::H1)));

        let published = published.borrow();
        assert_eq!(published.as_slice(), ["<h1><span>Hi</span></h1>"]);
    }

    #[test]
    fn test_listener_released_on_deactivate_and_drop() {
        let hub = KeyboardHub::new();
        let mut bar = toolbar();
        bar.activate(&hub);
        assert_eq!(hub.listener_count(), 1);
        bar.deactivate();
        assert_eq!(hub.listener_count(), 0);

        bar.activate(&hub);
        drop(bar);
        assert_eq!(hub.listener_count(), 0);
    }

    #[test]
    fn test_pump_keys_reads_hub() {
        let hub = KeyboardHub::new();
        let mut doc = MemoryDocument::empty();
        let text = doc.push_block(BlockType::Paragraph, "word");
        doc.select_text(text);
        let mut bar = toolbar();
        bar.activate(&hub);

        hub.broadcast(ctrl('b'));
        hub.broadcast(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE));
        bar.pump_keys(&mut doc);
        assert!(bar.state().bold);
        assert_eq!(doc.transactions(), 1);
    }
}
