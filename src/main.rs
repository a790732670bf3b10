//! editbar - terminal demo of the accessible formatting toolbar.
//!
//! # Usage
//!
//! ```bash
//! editbar
//! editbar --docs --platform mac
//! editbar --variant tabbed --print-markup
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use editbar::app::App;
use editbar::config::{
    ConfigFlags, Platform, ToolbarVariant, clear_config_flags, global_config_path,
    load_config_flags, local_override_path, parse_flag_tokens, save_config_flags,
};
use editbar::perf;

/// Terminal demo of an accessible rich-text formatting toolbar
#[derive(Parser, Debug)]
#[command(name = "editbar", version, about, long_about = None)]
struct Cli {
    /// Modifier convention for shortcuts (Cmd on mac, Ctrl elsewhere)
    #[arg(long, value_enum)]
    platform: Option<Platform>,

    /// Host surface: escape leaves the editor, or switches to the preview tab
    #[arg(long, value_enum)]
    variant: Option<ToolbarVariant>,

    /// Start with the keyboard shortcut panel visible
    #[arg(long)]
    docs: bool,

    /// Enable startup performance logging
    #[arg(long)]
    perf: bool,

    /// Write detailed toolbar debug events to a file
    #[arg(long, value_name = "PATH")]
    debug_log: Option<PathBuf>,

    /// Print the final cleaned markup to stdout on exit
    #[arg(long)]
    print_markup: bool,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

fn main() -> Result<()> {
    // Initialize logging; stderr keeps stdout free for --print-markup.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    perf::set_enabled(effective.perf);
    let debug_log_path = effective
        .debug_log
        .clone()
        .or_else(|| std::env::var_os("EDITBAR_DEBUG_LOG").map(PathBuf::from));
    if let Err(err) = perf::set_debug_log_path(debug_log_path.as_deref()) {
        eprintln!(
            "[warn] Failed to initialize debug log {}: {}",
            debug_log_path
                .as_ref()
                .map_or_else(|| "<unset>".to_string(), |p| p.display().to_string()),
            err
        );
    }

    let mut app = App::new(effective.toolbar_config());
    let result = app.run();
    if perf::is_enabled() {
        perf::log_summary();
    }
    let markup = result.context("Application error")?;
    if cli.print_markup {
        println!("{markup}");
    }
    Ok(())
}
