//! Resolver process recycling policy
//!
//! addr2line caches decoded DWARF as it goes, so a long-lived process keeps
//! growing. Each worker restarts its process after a jittered number of
//! lookups; the jitter keeps sibling workers from restarting (and re-reading
//! debug info) at the same moment.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecyclePolicy {
    /// Lookups per process before a restart
    pub base: u32,
    /// Maximum deviation from `base`, in percent
    pub jitter_percent: u32,
}

impl Default for RecyclePolicy {
    fn default() -> Self {
        Self { base: 2000, jitter_percent: 10 }
    }
}

impl RecyclePolicy {
    /// Threshold for `seed`, uniform over `base ± base * jitter_percent / 100`
    #[must_use]
    pub fn threshold_for(&self, seed: u64) -> u32 {
        let base = u64::from(self.base.max(1));
        let spread = base * u64::from(self.jitter_percent.min(100)) / 100;
        let offset = seed % (2 * spread + 1);
        let threshold = (base - spread + offset).max(1);
        u32::try_from(threshold).unwrap_or(u32::MAX)
    }

    /// A fresh randomly jittered threshold
    #[must_use]
    pub fn next_threshold(&self) -> u32 {
        self.threshold_for(rand::random())
    }
}
