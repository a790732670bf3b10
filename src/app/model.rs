use std::cell::RefCell;
use std::rc::Rc;

use crate::config::ToolbarConfig;
use crate::document::{
    BlockType, DocumentEngine, DocumentReader, HeadingLevel, MemoryDocument, Point,
};
use crate::markup::clean_markup;
use crate::toolbar::{Effect, KeyboardHub, Toolbar};

/// Where keyboard input goes when it is not a toolbar chord.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Editor,
    /// The link dialog's fields.
    Dialog,
    /// Focus left the editor (Escape in the standalone variant).
    Blurred,
}

/// Main pane contents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Editor,
    /// Cleaned markup, as a content consumer would receive it.
    Preview,
}

/// Demo application state.
pub struct Model {
    pub document: MemoryDocument,
    pub toolbar: Toolbar,
    pub hub: KeyboardHub,
    pub focus: Focus,
    pub view: View,
    pub should_quit: bool,
    pub size: (u16, u16),
    published: Rc<RefCell<String>>,
    errors: Rc<RefCell<Vec<String>>>,
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("toolbar", &self.toolbar)
            .field("focus", &self.focus)
            .field("view", &self.view)
            .field("should_quit", &self.should_quit)
            .finish_non_exhaustive()
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new(ToolbarConfig::default(), MemoryDocument::new(), (80, 24))
    }
}

impl Model {
    pub fn new(config: ToolbarConfig, document: MemoryDocument, size: (u16, u16)) -> Self {
        let initial = document
            .generate_markup()
            .map(|m| clean_markup(&m))
            .unwrap_or_default();
        let published = Rc::new(RefCell::new(initial));
        let errors = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&published);
        let error_log = Rc::clone(&errors);
        let mut toolbar = Toolbar::new(config)
            .on_content_change(move |markup| markup.clone_into(&mut sink.borrow_mut()))
            .with_error_handler(move |err| {
                tracing::error!(%err, "toolbar command failed");
                error_log.borrow_mut().push(err.to_string());
            });

        let hub = KeyboardHub::new();
        toolbar.activate(&hub);
        toolbar.refresh(&document);

        Self {
            document,
            toolbar,
            hub,
            focus: Focus::Editor,
            view: View::Editor,
            should_quit: false,
            size,
            published,
            errors,
        }
    }

    /// A short sample document with the caret at the end of its first line.
    pub fn sample_document() -> MemoryDocument {
        let mut doc = MemoryDocument::empty();
        let title = doc.push_block(BlockType::Heading(HeadingLevel::H1), "editbar");
        doc.push_block(
            BlockType::Paragraph,
            "Select text with Shift+arrows, then format it from the keyboard.",
        );
        doc.push_block(BlockType::Paragraph, "");
        doc.set_caret(Point::new(title, "editbar".len()));
        doc.drain_events();
        doc
    }

    /// Last markup delivered through the content-change callback.
    pub fn published_markup(&self) -> String {
        self.published.borrow().clone()
    }

    /// Most recent dispatch failure, for the status line.
    pub fn last_error(&self) -> Option<String> {
        self.errors.borrow().last().cloned()
    }

    pub fn apply_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            crate::perf::log_event("app.effect", format!("{effect:?}"));
            match effect {
                Effect::FocusUrlField => self.focus = Focus::Dialog,
                Effect::FocusEditor => {
                    self.focus = Focus::Editor;
                    self.view = View::Editor;
                }
                Effect::ExitEditor => self.focus = Focus::Blurred,
                Effect::ShowPreview => {
                    self.view = View::Preview;
                    self.focus = Focus::Blurred;
                }
                Effect::DocsVisibility(_) => {}
            }
        }
        if self.focus == Focus::Dialog && !self.toolbar.dialog().is_open() {
            self.focus = Focus::Editor;
        }
    }
}
