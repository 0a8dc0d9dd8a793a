//! Progress reporting.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

/// Total assumed for a body without Content-Length (10 MiB).
pub const UNKNOWN_TOTAL_PLACEHOLDER: u64 = 10 * 1024 * 1024;

/// What a progress counter counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressUnit {
    Bytes,
    Segments,
}

/// A coarse status snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub label: String,
    pub unit: ProgressUnit,
    pub done: u64,
    pub total: u64,
    /// `false` when `total` is a placeholder.
    pub total_known: bool,
}

impl ProgressUpdate {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.done as f64 / self.total as f64 * 100.0).min(100.0)
    }
}

/// Observer of pipeline progress. Purely informational.
pub trait ProgressSink: Send + Sync {
    fn update(&self, update: &ProgressUpdate);

    /// A step without a measurable amount of work started.
    fn status(&self, _label: &str, _message: &str) {}

    fn finish(&self, _label: &str) {}
}

/// Sink that drops every update.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn update(&self, _update: &ProgressUpdate) {}
}

/// Sink rendering updates on an indicatif bar.
pub struct BarProgress {
    bar: Mutex<Option<(ProgressUnit, ProgressBar)>>,
    spinner: Mutex<Option<ProgressBar>>,
}

impl BarProgress {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
            spinner: Mutex::new(None),
        }
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for BarProgress {
    fn update(&self, update: &ProgressUpdate) {
        let mut slot = self.bar.lock().unwrap_or_else(|e| e.into_inner());

        if !matches!(&*slot, Some((unit, _)) if *unit == update.unit) {
            if let Some((_, old)) = slot.take() {
                old.finish_and_clear();
            }
            let bar = match update.unit {
                ProgressUnit::Bytes => create_download_bar(update.total),
                ProgressUnit::Segments => create_item_bar(update.total, "segments"),
            };
            *slot = Some((update.unit, bar));
        }

        if let Some((_, bar)) = slot.as_ref() {
            bar.set_length(update.total);
            bar.set_position(update.done);
            bar.set_message(update.label.clone());
        }
    }

    fn status(&self, label: &str, message: &str) {
        let mut slot = self.bar.lock().unwrap_or_else(|e| e.into_inner());
        if let Some((_, bar)) = slot.take() {
            bar.finish_and_clear();
        }

        let mut spinner = self.spinner.lock().unwrap_or_else(|e| e.into_inner());
        match spinner.as_ref() {
            Some(s) => s.set_message(format!("{}: {}", label, message)),
            None => *spinner = Some(create_spinner(&format!("{}: {}", label, message))),
        }
    }

    fn finish(&self, _label: &str) {
        let mut slot = self.bar.lock().unwrap_or_else(|e| e.into_inner());
        if let Some((_, bar)) = slot.take() {
            bar.finish_and_clear();
        }
        let mut spinner = self.spinner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(s) = spinner.take() {
            s.finish_and_clear();
        }
    }
}

/// Rate limiter for progress emission.
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// `true` at most once per interval; the first call always passes.
    pub fn ready(&mut self) -> bool {
        let now = Instant::now();
        match self.last {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

/// Counter that forwards throttled snapshots to a [`ProgressSink`].
pub struct ProgressReporter<'a> {
    sink: &'a dyn ProgressSink,
    throttle: Throttle,
    update: ProgressUpdate,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(
        sink: &'a dyn ProgressSink,
        label: &str,
        unit: ProgressUnit,
        total: Option<u64>,
        interval: Duration,
    ) -> Self {
        Self {
            sink,
            throttle: Throttle::new(interval),
            update: ProgressUpdate {
                label: label.to_string(),
                unit,
                done: 0,
                total: total.unwrap_or(UNKNOWN_TOTAL_PLACEHOLDER),
                total_known: total.is_some(),
            },
        }
    }

    pub fn advance(&mut self, delta: u64) {
        self.update.done += delta;
        if !self.update.total_known && self.update.done > self.update.total {
            self.update.total = self.update.done;
        }
        if self.throttle.ready() {
            self.sink.update(&self.update);
        }
    }

    /// Emit the final snapshot regardless of the throttle.
    pub fn finish(mut self) {
        if !self.update.total_known {
            self.update.total = self.update.done;
            self.update.total_known = true;
        }
        self.sink.update(&self.update);
        self.sink.finish(&self.update.label);
    }

    pub fn done(&self) -> u64 {
        self.update.done
    }
}

/// Create a spinner for long-running operations.
pub fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Create a progress bar for downloads.
pub fn create_download_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    bar
}

/// Create a progress bar for item counts.
pub fn create_item_bar(total: u64, unit: &str) -> ProgressBar {
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} {{msg}} [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {}",
                unit
            ))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    bar
}
