//! Resolution counters shared by every worker

use std::sync::atomic::{AtomicU64, Ordering};

/// Independent counters, safe to bump from any worker without coordination
#[derive(Debug, Default)]
pub struct ResolutionStats {
    resolved: AtomicU64,
    failed: AtomicU64,
    lost: AtomicU64,
    deduped: AtomicU64,
    disambiguated: AtomicU64,
    disambiguation_missed: AtomicU64,
    recycled: AtomicU64,
}

/// Point-in-time copy of [`ResolutionStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub resolved: u64,
    pub failed: u64,
    /// Records dropped because their resolver went away mid-lookup
    pub lost: u64,
    pub deduped: u64,
    pub disambiguated: u64,
    pub disambiguation_missed: u64,
    pub recycled: u64,
}

impl ResolutionStats {
    pub fn record_resolved(&self) {
        self.resolved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lost(&self) {
        self.lost.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_deduped(&self) {
        self.deduped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_disambiguation(&self, hit: bool) {
        let counter = if hit { &self.disambiguated } else { &self.disambiguation_missed };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_recycled(&self) {
        self.recycled.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            resolved: self.resolved.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            lost: self.lost.load(Ordering::Relaxed),
            deduped: self.deduped.load(Ordering::Relaxed),
            disambiguated: self.disambiguated.load(Ordering::Relaxed),
            disambiguation_missed: self.disambiguation_missed.load(Ordering::Relaxed),
            recycled: self.recycled.load(Ordering::Relaxed),
        }
    }
}

// Counts are far below 2^52, display only
#[allow(clippy::cast_precision_loss)]
pub(crate) fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

impl StatsSnapshot {
    /// Records that went through addr2line (deduped records excluded)
    #[must_use]
    pub fn attempted(&self) -> u64 {
        self.resolved + self.failed
    }

    #[must_use]
    pub fn success_rate(&self) -> f64 {
        percent(self.resolved, self.attempted())
    }

    #[must_use]
    pub fn disambiguation_rate(&self) -> f64 {
        percent(self.disambiguated, self.disambiguated + self.disambiguation_missed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_counts() {
        let stats = ResolutionStats::default();
        stats.record_resolved();
        stats.record_resolved();
        stats.record_failed();
        stats.record_deduped();
        stats.record_disambiguation(true);
        stats.record_disambiguation(false);
        stats.record_disambiguation(false);

        let snap = stats.snapshot();
        assert_eq!(snap.attempted(), 3);
        assert_eq!(format!("{:.1}", snap.success_rate()), "66.7");
        assert_eq!(format!("{:.1}", snap.disambiguation_rate()), "33.3");
        assert_eq!(snap.deduped, 1);
    }

    #[test]
    fn test_empty_rates() {
        let snap = StatsSnapshot::default();
        assert!(snap.success_rate().abs() < f64::EPSILON);
        assert!(snap.disambiguation_rate().abs() < f64::EPSILON);
    }
}
