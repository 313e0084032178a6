// Counts and durations are converted to f64 for display only
#![allow(clippy::cast_precision_loss)]

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::resolution::stats::percent;
use crate::resolution::{ResolutionStats, StatsSnapshot};

/// Counters kept by the producer while reading the dump
#[derive(Debug, Default)]
pub struct InputStats {
    lines: AtomicU64,
    queued: AtomicU64,
    skipped: AtomicU64,
    synthetic: AtomicU64,
}

impl InputStats {
    pub fn record_queued(&self) {
        self.lines.fetch_add(1, Ordering::Relaxed);
        self.queued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.lines.fetch_add(1, Ordering::Relaxed);
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_synthetic(&self) {
        self.lines.fetch_add(1, Ordering::Relaxed);
        self.synthetic.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn queued(&self) -> u64 {
        self.queued.load(Ordering::Relaxed)
    }
}

/// Final (or interim) statistics for one run
#[derive(Debug, Clone, Copy)]
pub struct Summary {
    pub lines: u64,
    pub queued: u64,
    pub skipped: u64,
    pub synthetic: u64,
    pub resolution: StatsSnapshot,
    pub elapsed: Duration,
}

impl Summary {
    #[must_use]
    pub fn capture(input: &InputStats, resolution: &ResolutionStats, elapsed: Duration) -> Self {
        Self {
            lines: input.lines.load(Ordering::Relaxed),
            queued: input.queued.load(Ordering::Relaxed),
            skipped: input.skipped.load(Ordering::Relaxed),
            synthetic: input.synthetic.load(Ordering::Relaxed),
            resolution: resolution.snapshot(),
            elapsed,
        }
    }

    #[must_use]
    pub fn queued_percent(&self) -> f64 {
        percent(self.queued, self.lines)
    }

    #[must_use]
    pub fn skipped_percent(&self) -> f64 {
        percent(self.skipped, self.lines)
    }

    #[must_use]
    pub fn success_rate(&self) -> f64 {
        self.resolution.success_rate()
    }

    /// Records processed (resolved, failed or deduped) per second
    #[must_use]
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        let done = self.resolution.attempted() + self.resolution.deduped;
        if secs > 0.0 {
            done as f64 / secs
        } else {
            0.0
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = &self.resolution;
        writeln!(f, "addresses:      {}", self.lines)?;
        writeln!(f, "queued:         {} ({:.1}%)", self.queued, self.queued_percent())?;
        writeln!(f, "skipped:        {} ({:.1}%)", self.skipped, self.skipped_percent())?;
        if self.synthetic > 0 {
            writeln!(f, "synthetic:      {}", self.synthetic)?;
        }
        writeln!(
            f,
            "resolved:       {} of {} ({:.1}%)",
            r.resolved,
            r.attempted(),
            self.success_rate()
        )?;
        if r.disambiguated + r.disambiguation_missed > 0 {
            writeln!(
                f,
                "disambiguated:  {} of {} ({:.1}%)",
                r.disambiguated,
                r.disambiguated + r.disambiguation_missed,
                r.disambiguation_rate()
            )?;
        }
        writeln!(f, "deduped:        {}", r.deduped)?;
        if r.lost > 0 {
            writeln!(f, "lost:           {}", r.lost)?;
        }
        writeln!(f, "recycled:       {}", r.recycled)?;
        writeln!(f, "elapsed:        {:.1}s", self.elapsed.as_secs_f64())?;
        write!(f, "throughput:     {:.0} addresses/s", self.throughput())
    }
}

/// One-line interim statistics
pub fn display_progress(summary: &Summary) {
    let r = &summary.resolution;
    let done = r.attempted() + r.deduped;
    eprintln!(
        "progress: {:.0}s queued={} done={} ({:.1}%) resolved={:.1}% deduped={} skipped={} {:.0}/s",
        summary.elapsed.as_secs_f64(),
        summary.queued,
        done,
        percent(done, summary.queued),
        summary.success_rate(),
        r.deduped,
        summary.skipped,
        summary.throughput(),
    );
}

/// Periodic progress printer; stops when dropped
pub struct ProgressReporter {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ProgressReporter {
    /// Print interim statistics every `interval` until stopped
    ///
    /// # Errors
    /// Returns an error if the thread cannot be spawned
    pub fn start(
        interval: Duration,
        input: Arc<InputStats>,
        resolution: Arc<ResolutionStats>,
        started: Instant,
    ) -> std::io::Result<Self> {
        let (stop_tx, stop_rx) = bounded::<()>(0);
        let handle = thread::Builder::new().name("progress".to_string()).spawn(move || loop {
            match stop_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {
                    display_progress(&Summary::capture(&input, &resolution, started.elapsed()));
                }
                _ => break,
            }
        })?;
        Ok(Self { stop: Some(stop_tx), handle: Some(handle) })
    }

    pub fn stop(&mut self) {
        // Disconnecting the channel wakes the thread
        self.stop = None;
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.stop();
    }
}
