//! Opt-in timing and a debug event log for toolbar activity.
//!
//! Timing (`--perf`) aggregates every [`scope`] by name so a session can end
//! with one [`log_summary`] line per scope. The debug log (`--debug-log`)
//! records individual events with their offset from when the log opened.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

static TIMING: AtomicBool = AtomicBool::new(false);
static STATE: LazyLock<Mutex<PerfState>> = LazyLock::new(|| Mutex::new(PerfState::default()));

/// Accumulated timings for one scope name.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScopeTotals {
    pub calls: u64,
    pub total_ms: f64,
    pub max_ms: f64,
}

impl ScopeTotals {
    fn record(&mut self, elapsed_ms: f64) {
        self.calls += 1;
        self.total_ms += elapsed_ms;
        self.max_ms = self.max_ms.max(elapsed_ms);
    }
}

#[derive(Debug, Default)]
struct PerfState {
    totals: BTreeMap<&'static str, ScopeTotals>,
    log: Option<EventLog>,
}

#[derive(Debug)]
struct EventLog {
    opened: Instant,
    writer: BufWriter<File>,
}

impl EventLog {
    fn write(&mut self, name: &str, detail: &str) {
        let offset_ms = self.opened.elapsed().as_secs_f64() * 1000.0;
        let _ = writeln!(self.writer, "[{offset_ms:>10.3} ms] {name}: {detail}");
        let _ = self.writer.flush();
    }
}

// A panic while holding the lock leaves the state usable; the worst case
// is a truncated log line.
fn state() -> MutexGuard<'static, PerfState> {
    STATE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Guard returned by [`scope`].
#[derive(Debug)]
pub struct Scope {
    name: &'static str,
    start: Instant,
}

impl Drop for Scope {
    fn drop(&mut self) {
        if !is_enabled() {
            return;
        }
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        tracing::trace!(target: "editbar::perf", scope = self.name, elapsed_ms, "timed");
        let mut state = state();
        state.totals.entry(self.name).or_default().record(elapsed_ms);
        if let Some(log) = state.log.as_mut() {
            log.write("perf", &format!("{}: {elapsed_ms:.3} ms", self.name));
        }
    }
}

pub fn set_enabled(enabled: bool) {
    TIMING.store(enabled, Ordering::Relaxed);
}

pub fn is_enabled() -> bool {
    TIMING.load(Ordering::Relaxed)
}

/// Time the enclosing block; recorded on drop when timing is enabled.
pub fn scope(name: &'static str) -> Scope {
    Scope {
        name,
        start: Instant::now(),
    }
}

/// Totals per scope name, sorted by name.
pub fn totals() -> Vec<(&'static str, ScopeTotals)> {
    state()
        .totals
        .iter()
        .map(|(name, totals)| (*name, *totals))
        .collect()
}

/// Emit one line per timed scope to the tracing subscriber and the debug
/// log, then start counting afresh.
pub fn log_summary() {
    let mut state = state();
    let totals = std::mem::take(&mut state.totals);
    for (name, t) in &totals {
        tracing::info!(
            target: "editbar::perf",
            scope = name,
            calls = t.calls,
            total_ms = t.total_ms,
            max_ms = t.max_ms,
            "summary"
        );
        if let Some(log) = state.log.as_mut() {
            log.write(
                "summary",
                &format!(
                    "{name}: {} calls, {:.3} ms total, {:.3} ms max",
                    t.calls, t.total_ms, t.max_ms
                ),
            );
        }
    }
}

/// Start writing debug events to `path`, or stop when `None`.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn set_debug_log_path(path: Option<&Path>) -> std::io::Result<()> {
    let log = match path {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            writeln!(writer, "editbar debug log start")?;
            writer.flush()?;
            Some(EventLog {
                opened: Instant::now(),
                writer,
            })
        }
        None => None,
    };
    state().log = log;
    Ok(())
}

pub fn is_debug_log_enabled() -> bool {
    state().log.is_some()
}

pub fn log_event(name: &str, detail: impl AsRef<str>) {
    if let Some(log) = state().log.as_mut() {
        log.write(name, detail.as_ref());
    }
}
