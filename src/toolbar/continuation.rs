//! Deferred toolbar steps.
//!
//! Work that must happen only after the host has processed a state change
//! (the dialog closing, the dialog appearing) is queued here and run by
//! [`Toolbar::settle`](super::Toolbar::settle), strictly in FIFO order.

use std::collections::VecDeque;

/// One deferred step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Continuation {
    /// Move focus into the link dialog's URL field.
    FocusUrlField,
    /// Return focus to the document.
    FocusEditor,
    /// Apply a committed link.
    ApplyLink { url: String, text: String },
    /// Clear the link dialog fields, unless the dialog has been re-opened
    /// since `generation` was taken.
    ResetLinkFields { generation: u64 },
}

#[derive(Debug, Default)]
pub struct ContinuationQueue {
    pending: VecDeque<Continuation>,
}

impl ContinuationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn defer(&mut self, step: Continuation) {
        self.pending.push_back(step);
    }

    pub fn pop(&mut self) -> Option<Continuation> {
        self.pending.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Continuation> {
        self.pending.iter()
    }
}
