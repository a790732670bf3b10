//! Link insertion dialog state.

use super::continuation::{Continuation, ContinuationQueue};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DialogPhase {
    #[default]
    Closed,
    Open,
}

/// Field the dialog's input focus sits in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DialogField {
    #[default]
    Url,
    Text,
}

/// The link dialog: a phase plus its URL and display-text fields.
///
/// Fields are cleared only by a deferred [`Continuation::ResetLinkFields`]
/// queued on close, so anything reading them during the close still sees
/// what the user typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkDialog {
    phase: DialogPhase,
    url: String,
    text: String,
    field: DialogField,
    generation: u64,
}

impl LinkDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn phase(&self) -> DialogPhase {
        self.phase
    }

    pub fn is_open(&self) -> bool {
        self.phase == DialogPhase::Open
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub const fn field(&self) -> DialogField {
        self.field
    }

    /// Commit is only offered once a URL has been typed.
    pub fn can_insert(&self) -> bool {
        !self.url.is_empty()
    }

    /// Open with `text` pre-filled from the current selection.
    ///
    /// Re-opening an already open dialog only refreshes the text.
    pub fn open(&mut self, text: String, queue: &mut ContinuationQueue) {
        self.text = text;
        if self.is_open() {
            return;
        }
        self.phase = DialogPhase::Open;
        self.generation += 1;
        self.url.clear();
        self.field = DialogField::Url;
        queue.defer(Continuation::FocusUrlField);
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Mutable access to the focused field, for hosts feeding keystrokes.
    pub fn field_mut(&mut self) -> &mut String {
        match self.field {
            DialogField::Url => &mut self.url,
            DialogField::Text => &mut self.text,
        }
    }

    pub fn focus_field(&mut self, field: DialogField) {
        self.field = field;
    }

    pub fn next_field(&mut self) {
        self.field = match self.field {
            DialogField::Url => DialogField::Text,
            DialogField::Text => DialogField::Url,
        };
    }

    /// Close without applying. Covers cancel, Escape and outside dismiss.
    ///
    /// Returns `false` if the dialog was already closed.
    pub fn cancel(&mut self, queue: &mut ContinuationQueue) -> bool {
        if !self.is_open() {
            return false;
        }
        self.phase = DialogPhase::Closed;
        queue.defer(Continuation::ResetLinkFields {
            generation: self.generation,
        });
        true
    }

    /// Close and queue the link for application.
    ///
    /// With an empty URL this behaves like [`cancel`](Self::cancel).
    /// Returns `true` if a link was queued.
    pub fn commit(&mut self, queue: &mut ContinuationQueue) -> bool {
        if !self.can_insert() {
            self.cancel(queue);
            return false;
        }
        if !self.is_open() {
            return false;
        }
        self.phase = DialogPhase::Closed;
        queue.defer(Continuation::FocusEditor);
        queue.defer(Continuation::ApplyLink {
            url: self.url.clone(),
            text: self.text.clone(),
        });
        queue.defer(Continuation::ResetLinkFields {
            generation: self.generation,
        });
        true
    }

    /// Run a deferred reset. Stale resets from an earlier session are
    /// ignored; returns whether the fields were cleared.
    pub fn reset(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.is_open() {
            return false;
        }
        self.url.clear();
        self.text.clear();
        self.field = DialogField::Url;
        true
    }
}
