//! Terminal demo host.
//!
//! Hosts a [`Toolbar`](crate::toolbar::Toolbar) over the in-memory
//! reference engine, using The Elm Architecture (TEA):
//! - [`Model`]: document, toolbar, keyboard hub and host focus
//! - [`Message`]: user input and toolbar actions
//! - [`update`]: state transitions, followed by deferred toolbar work
//! - [`App::run`]: main event loop with rendering

mod event_loop;
mod input;
mod model;
mod update;

pub use model::{Focus, Model, View};
pub use update::{Message, update};

use crate::config::ToolbarConfig;

/// Owns the terminal and runs the event loop.
pub struct App {
    config: ToolbarConfig,
}

impl App {
    pub const fn new(config: ToolbarConfig) -> Self {
        Self { config }
    }
}

#[cfg(test)]
mod tests;
