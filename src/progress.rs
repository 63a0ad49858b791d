//! Progress reporting: per-file completion fraction, a caller callback, an
//! optional terminal bar, and the cooperative suspension point after each file.

use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use std::sync::Arc;

/// Count-style progress bar (files processed out of total), with an optional label.
pub fn make_count_progress(total: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} {msg} {pos}/{len} [{bar:.cyan/blue}] {percent:>3}%  \
         files/s: {per_sec}  elapsed: {elapsed_precise}  eta: {eta_precise}",
    ) {
        pb.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
    }
    if !label.is_empty() {
        pb.set_message(label.to_string());
    }
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Where control is handed back to the host once per processed file.
pub trait Suspend: Send + Sync {
    fn suspend(&self);
}

/// Default suspension: yield the current thread to the scheduler.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadYield;

impl Suspend for ThreadYield {
    fn suspend(&self) {
        std::thread::yield_now();
    }
}

pub type ProgressCallback = Box<dyn Fn(f64) + Send + Sync>;

#[derive(Default)]
struct Counts {
    processed: usize,
    total: usize,
}

impl Counts {
    fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            (self.processed as f64 / self.total as f64).min(1.0)
        }
    }
}

/// Tracks processed/total file counts and reports `processed / total`.
///
/// Increment and callback run under one short lock, so observers see a
/// non-decreasing sequence even when files finish on several workers.
pub struct ProgressReporter {
    counts: Mutex<Counts>,
    callback: Option<ProgressCallback>,
    suspend: Arc<dyn Suspend>,
    bar: Option<ProgressBar>,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self { counts: Mutex::new(Counts::default()), callback: None, suspend: Arc::new(ThreadYield), bar: None }
    }

    pub fn with_callback(mut self, cb: impl Fn(f64) + Send + Sync + 'static) -> Self {
        self.callback = Some(Box::new(cb));
        self
    }

    pub fn with_suspend(mut self, suspend: Arc<dyn Suspend>) -> Self {
        self.suspend = suspend;
        self
    }

    /// Draw a terminal bar labelled `label` in addition to the callback.
    pub fn with_terminal_bar(mut self, enabled: bool, label: Option<String>) -> Self {
        self.bar = enabled.then(|| make_count_progress(0, label.as_deref().unwrap_or("Extracting")));
        self
    }

    /// Reset to `(0, total)`. With `total == 0` the run is already complete and
    /// the callback receives 1.0 right away.
    pub fn begin(&self, total: usize) {
        let mut counts = self.counts.lock();
        counts.processed = 0;
        counts.total = total;
        if let Some(pb) = &self.bar {
            pb.set_length(total as u64);
            pb.set_position(0);
        }
        if total == 0 {
            if let Some(cb) = &self.callback {
                cb(1.0);
            }
        }
    }

    /// Count one finished file, report the new fraction, then suspend.
    pub fn tick(&self) -> f64 {
        let frac = {
            let mut counts = self.counts.lock();
            counts.processed += 1;
            let frac = counts.fraction();
            if let Some(pb) = &self.bar {
                pb.inc(1);
            }
            if let Some(cb) = &self.callback {
                cb(frac);
            }
            frac
        };
        self.suspend.suspend();
        frac
    }

    pub fn fraction(&self) -> f64 {
        self.counts.lock().fraction()
    }

    pub fn processed(&self) -> usize {
        self.counts.lock().processed
    }

    pub fn total(&self) -> usize {
        self.counts.lock().total
    }

    pub fn finish(&self, msg: impl Into<String>) {
        if let Some(pb) = &self.bar {
            pb.finish_with_message(msg.into());
        }
    }
}
