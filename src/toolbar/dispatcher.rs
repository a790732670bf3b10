//! Command dispatch.
//!
//! Every request the toolbar makes of the document goes through
//! [`CommandDispatcher`], one engine transaction per request.

use crate::document::{
    BlockType, DocumentEngine, DocumentError, DocumentReader, InlineFormat, LinkAttributes,
    ListKind, Selection,
};
use crate::perf;

use super::ToolbarState;
use super::resolver::heading_at;

/// Failures surfaced by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Document(#[from] DocumentError),
    /// The block-replace primitive failed and inserting a fresh block did too.
    #[error("block conversion failed ({primary}); fallback insert failed ({fallback})")]
    BlockFallback {
        primary: DocumentError,
        fallback: DocumentError,
    },
}

/// Translates toolbar intents into engine transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDispatcher {
    link_target: Option<String>,
}

impl Default for CommandDispatcher {
    fn default() -> Self {
        Self::new(Some("_blank".to_string()))
    }
}

impl CommandDispatcher {
    pub const fn new(link_target: Option<String>) -> Self {
        Self { link_target }
    }

    pub fn link_target(&self) -> Option<&str> {
        self.link_target.as_deref()
    }

    /// Flip `format` over the selection.
    ///
    /// # Errors
    /// Returns an error if the engine rejects the toggle.
    pub fn toggle_inline_format<E: DocumentEngine>(
        &self,
        doc: &mut E,
        format: InlineFormat,
    ) -> Result<(), DispatchError> {
        log_dispatch("format", format.name());
        doc.update(|tx| tx.format_text(format.flag()))?;
        Ok(())
    }

    /// Convert the selected blocks to `block`.
    ///
    /// Requesting the heading level the selection already sits in converts
    /// back to a paragraph. When the engine cannot replace the blocks, a
    /// fresh block of the target type is inserted at the selection instead.
    /// Does nothing without a range selection.
    ///
    /// # Errors
    /// Returns [`DispatchError::BlockFallback`] when both attempts fail.
    pub fn set_block_type<E: DocumentEngine>(
        &self,
        doc: &mut E,
        block: BlockType,
    ) -> Result<(), DispatchError> {
        let Some(Selection::Range(range)) = doc.selection() else {
            return Ok(());
        };
        let target = match block {
            BlockType::Heading(level)
                if heading_at(&*doc, range.anchor.node).ok().flatten() == Some(level)
                    || heading_at(&*doc, range.focus.node).ok().flatten() == Some(level) =>
            {
                BlockType::Paragraph
            }
            other => other,
        };
        log_dispatch("block", format!("{block:?} -> {target:?}"));

        match doc.update(|tx| tx.set_blocks_type(target)) {
            Ok(()) => Ok(()),
            Err(primary) => {
                tracing::warn!(%primary, ?target, "block replace failed; inserting a fresh block");
                doc.update(|tx| tx.insert_block(target))
                    .map_err(|fallback| DispatchError::BlockFallback { primary, fallback })
            }
        }
    }

    /// Remove the list when `kind` is already active, otherwise insert one.
    ///
    /// Switching from one list kind to the other is an insert of the new
    /// kind; what that does to the existing list is up to the engine.
    ///
    /// # Errors
    /// Returns an error if the engine rejects the request.
    pub fn toggle_list<E: DocumentEngine>(
        &self,
        doc: &mut E,
        kind: ListKind,
        last: &ToolbarState,
    ) -> Result<(), DispatchError> {
        if last.list_active(kind) {
            log_dispatch("list", format!("remove {kind:?}"));
            doc.update(|tx| tx.remove_list())?;
        } else {
            log_dispatch("list", format!("insert {kind:?}"));
            doc.update(|tx| tx.insert_list(kind))?;
        }
        Ok(())
    }

    /// Link the selection to `url`.
    ///
    /// This is the direct form used by the URL prompt shortcut. An empty
    /// `url` counts as a cancelled prompt and opens no transaction.
    ///
    /// # Errors
    /// Returns an error if the engine rejects the request.
    pub fn toggle_link<E: DocumentEngine>(&self, doc: &mut E, url: &str) -> Result<(), DispatchError> {
        if url.is_empty() {
            tracing::debug!("empty prompt url; treated as cancel");
            return Ok(());
        }
        log_dispatch("link", url);
        let attrs = self.attributes(url);
        doc.update(|tx| tx.toggle_link(Some(&attrs)))?;
        Ok(())
    }

    /// Commit a link dialog.
    ///
    /// With a caret and non-empty `text`, the text is inserted and then
    /// selected backward before being linked. Otherwise the current
    /// selection is linked as-is and `text` is ignored. An empty `url`, a
    /// caret with no `text`, or a selection that is not a range leaves the
    /// document untouched.
    ///
    /// # Errors
    /// Returns an error if the engine rejects the request.
    pub fn apply_link<E: DocumentEngine>(
        &self,
        doc: &mut E,
        url: &str,
        text: &str,
    ) -> Result<(), DispatchError> {
        if url.is_empty() {
            tracing::debug!("empty link url; nothing to apply");
            return Ok(());
        }
        let Some(Selection::Range(range)) = doc.selection() else {
            return Ok(());
        };
        if range.is_collapsed() && text.is_empty() {
            tracing::debug!("caret with no link text; nothing to apply");
            return Ok(());
        }
        let attrs = self.attributes(url);
        let insert = range.is_collapsed();
        log_dispatch("link.apply", format!("{url} insert={insert}"));

        doc.update(|tx| {
            if insert {
                tx.insert_text(text)?;
                tx.extend_selection_backward(text.chars().count())?;
            }
            tx.toggle_link(Some(&attrs))
        })?;
        Ok(())
    }

    fn attributes(&self, url: &str) -> LinkAttributes {
        LinkAttributes::new(url).with_target(self.link_target.clone())
    }
}

fn log_dispatch(command: &str, detail: impl AsRef<str>) {
    let detail = detail.as_ref();
    tracing::debug!(command, detail, "dispatch");
    perf::log_event(command, detail);
}
