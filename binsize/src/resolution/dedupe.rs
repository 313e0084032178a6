//! Address deduplication
//!
//! Aliased symbols (identical code folding, C++ thunks) share an address. Only
//! the first record per address is resolved; later ones are dropped.

use log::warn;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::stats::ResolutionStats;
use crate::domain::Record;

pub struct Deduplicator {
    /// Address → size of the first record seen there. `None` when disabled.
    seen: Option<Mutex<HashMap<u64, String>>>,
    stats: Arc<ResolutionStats>,
}

impl Deduplicator {
    #[must_use]
    pub fn new(enabled: bool, stats: Arc<ResolutionStats>) -> Self {
        Self { seen: enabled.then(|| Mutex::new(HashMap::new())), stats }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.seen.is_some()
    }

    /// Returns true if another record at this address was already claimed.
    ///
    /// Check and insert happen under one lock, so of several workers racing on
    /// a fresh address exactly one gets `false`.
    pub fn try_dedupe(&self, record: &Record) -> bool {
        let Some(ref seen) = self.seen else {
            return false;
        };
        let Some(address) = record.address_value() else {
            return false;
        };

        let mut seen = seen.lock().unwrap_or_else(PoisonError::into_inner);
        match seen.entry(address) {
            Entry::Vacant(slot) => {
                slot.insert(record.size.clone());
                false
            }
            Entry::Occupied(first) => {
                if *first.get() != record.size {
                    warn!(
                        "Size mismatch at {}: {} has size {}, first record had {}",
                        record.address(),
                        record.symbol_name,
                        record.size,
                        first.get()
                    );
                }
                self.stats.record_deduped();
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn record(address: &str, size: &str) -> Record {
        Record::new(address, size, Some('t'), "sym")
    }

    #[test]
    fn test_disabled_never_dedupes() {
        let stats = Arc::new(ResolutionStats::default());
        let dedupe = Deduplicator::new(false, Arc::clone(&stats));
        assert!(!dedupe.try_dedupe(&record("00001000", "00000010")));
        assert!(!dedupe.try_dedupe(&record("00001000", "00000010")));
        assert_eq!(stats.snapshot().deduped, 0);
    }

    #[test]
    fn test_second_record_is_deduped() {
        let stats = Arc::new(ResolutionStats::default());
        let dedupe = Deduplicator::new(true, Arc::clone(&stats));
        assert!(!dedupe.try_dedupe(&record("00001000", "00000010")));
        assert!(dedupe.try_dedupe(&record("00001000", "00000010")));
        assert!(!dedupe.try_dedupe(&record("00002000", "00000010")));
        assert_eq!(stats.snapshot().deduped, 1);
    }

    #[test]
    fn test_size_mismatch_still_dedupes() {
        let stats = Arc::new(ResolutionStats::default());
        let dedupe = Deduplicator::new(true, Arc::clone(&stats));
        assert!(!dedupe.try_dedupe(&record("00001000", "00000010")));
        assert!(dedupe.try_dedupe(&record("00001000", "00000020")));
    }

    #[test]
    fn test_address_key_is_numeric() {
        let stats = Arc::new(ResolutionStats::default());
        let dedupe = Deduplicator::new(true, stats);
        assert!(!dedupe.try_dedupe(&record("0000abcd", "00000010")));
        assert!(dedupe.try_dedupe(&record("000000000000ABCD", "00000010")));
    }

    #[test]
    fn test_concurrent_first_resolution_is_unique() {
        let stats = Arc::new(ResolutionStats::default());
        let dedupe = Arc::new(Deduplicator::new(true, Arc::clone(&stats)));

        let winners: usize = (0..8)
            .map(|_| {
                let dedupe = Arc::clone(&dedupe);
                thread::spawn(move || {
                    usize::from(!dedupe.try_dedupe(&record("00c0ffee", "00000008")))
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap())
            .sum();

        assert_eq!(winners, 1);
        assert_eq!(stats.snapshot().deduped, 7);
    }
}
