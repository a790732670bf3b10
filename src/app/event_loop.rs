use std::io::stdout;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use ratatui::DefaultTerminal;

use crate::app::{App, Model, update};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

impl App {
    /// Run the main event loop.
    ///
    /// Returns the last published markup, cleaned of presentation
    /// attributes.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal initialization or event reading fails.
    pub fn run(&mut self) -> Result<String> {
        let _run_scope = crate::perf::scope("app.run.total");

        let init_scope = crate::perf::scope("app.ratatui_init");
        let mut terminal = ratatui::try_init()
            .context("Failed to initialize terminal; editbar requires an interactive terminal")?;
        let size = terminal.size()?;
        drop(init_scope);

        let document = Model::sample_document();
        let mut model = Model::new(self.config.clone(), document, (size.width, size.height));
        crate::perf::log_event(
            "init.layout",
            format!(
                "terminal={}x{} platform={} variant={}",
                size.width,
                size.height,
                model.toolbar.config().platform.as_str(),
                model.toolbar.config().variant.as_str()
            ),
        );

        let result = execute!(stdout(), EnableMouseCapture)
            .context("Failed to enable mouse capture")
            .and_then(|()| Self::event_loop(&mut terminal, &mut model));

        let _ = execute!(stdout(), DisableMouseCapture);
        ratatui::restore();

        // Release the key listener before the hub goes away.
        model.toolbar.deactivate();
        result.map(|()| model.published_markup())
    }

    fn event_loop(terminal: &mut DefaultTerminal, model: &mut Model) -> Result<()> {
        let mut frame_idx: u64 = 0;
        let mut needs_render = true;

        loop {
            if needs_render {
                let _draw_scope = crate::perf::scope("app.draw");
                terminal.draw(|frame| crate::ui::render(model, frame))?;
                frame_idx += 1;
                needs_render = false;
            }

            if model.should_quit {
                crate::perf::log_event("app.quit", format!("frame={frame_idx}"));
                return Ok(());
            }

            if !event::poll(POLL_INTERVAL)? {
                continue;
            }
            let event = event::read()?;
            if let Some(msg) = Self::handle_event(event, model) {
                crate::perf::log_event("event.message", format!("frame={frame_idx} {msg:?}"));
                *model = update(std::mem::take(model), msg);
                needs_render = true;
            }
            // Drain any burst of queued events before redrawing.
            while event::poll(Duration::ZERO)? {
                if let Some(msg) = Self::handle_event(event::read()?, model) {
                    *model = update(std::mem::take(model), msg);
                }
            }
            if model.toolbar.has_pending() {
                let effects = model.toolbar.settle(&mut model.document);
                model.apply_effects(effects);
            }
        }
    }
}

