//! Lock-free histogram with power-of-two buckets
//!
//! Backs the per-sender batch size and flush duration distributions.
//! Bucket `i` counts values `v` with `2^(i-1) <= v < 2^i` (bucket 0 counts
//! zero); the last bucket absorbs everything larger.

use std::sync::atomic::{AtomicU64, Ordering};

/// Number of buckets. Values below `2^31` land in an exact bucket; the
/// final bucket absorbs the rest, which is plenty for batch sizes and
/// microsecond durations.
pub const BUCKETS: usize = 32;

/// Lock-free histogram.
///
/// All operations use relaxed ordering; values may be slightly stale when
/// read concurrently with updates.
#[derive(Debug)]
pub struct Histogram {
    count: AtomicU64,
    sum: AtomicU64,
    min: AtomicU64,
    max: AtomicU64,
    buckets: [AtomicU64; BUCKETS],
}

impl Histogram {
    /// Create an empty histogram.
    pub const fn new() -> Self {
        // No const array-repeat for non-Copy types; spell the zero out once.
        const ZERO: AtomicU64 = AtomicU64::new(0);
        Self {
            count: AtomicU64::new(0),
            sum: AtomicU64::new(0),
            min: AtomicU64::new(u64::MAX),
            max: AtomicU64::new(0),
            buckets: [ZERO; BUCKETS],
        }
    }

    /// Record one value.
    #[inline]
    pub fn record(&self, value: u64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.sum.fetch_add(value, Ordering::Relaxed);
        self.min.fetch_min(value, Ordering::Relaxed);
        self.max.fetch_max(value, Ordering::Relaxed);
        self.buckets[Self::bucket_index(value)].fetch_add(1, Ordering::Relaxed);
    }

    /// Number of recorded values.
    #[inline]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Bucket index for a value: 0 for 0, else `bits(value)` clamped.
    #[inline]
    fn bucket_index(value: u64) -> usize {
        let bits = (u64::BITS - value.leading_zeros()) as usize;
        bits.min(BUCKETS - 1)
    }

    /// Take a snapshot of current values.
    pub fn snapshot(&self) -> HistogramSnapshot {
        let count = self.count.load(Ordering::Relaxed);
        let min = self.min.load(Ordering::Relaxed);
        let mut buckets = [0u64; BUCKETS];
        for (slot, bucket) in buckets.iter_mut().zip(self.buckets.iter()) {
            *slot = bucket.load(Ordering::Relaxed);
        }
        HistogramSnapshot {
            count,
            sum: self.sum.load(Ordering::Relaxed),
            min: if count == 0 { 0 } else { min },
            max: self.max.load(Ordering::Relaxed),
            buckets,
        }
    }

    /// Reset all values to zero.
    pub fn reset(&self) {
        self.count.store(0, Ordering::Relaxed);
        self.sum.store(0, Ordering::Relaxed);
        self.min.store(u64::MAX, Ordering::Relaxed);
        self.max.store(0, Ordering::Relaxed);
        for bucket in &self.buckets {
            bucket.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of a histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct HistogramSnapshot {
    /// Number of recorded values.
    pub count: u64,
    /// Sum of recorded values.
    pub sum: u64,
    /// Smallest recorded value (0 when empty).
    pub min: u64,
    /// Largest recorded value.
    pub max: u64,
    /// Power-of-two bucket counts.
    pub buckets: [u64; BUCKETS],
}

impl HistogramSnapshot {
    /// Arithmetic mean of recorded values.
    #[inline]
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum as f64 / self.count as f64
        }
    }
}

impl Default for HistogramSnapshot {
    fn default() -> Self {
        Self {
            count: 0,
            sum: 0,
            min: 0,
            max: 0,
            buckets: [0; BUCKETS],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_histogram() {
        let h = Histogram::new();
        let s = h.snapshot();
        assert_eq!(s.count, 0);
        assert_eq!(s.sum, 0);
        assert_eq!(s.min, 0);
        assert_eq!(s.max, 0);
        assert_eq!(s.mean(), 0.0);
    }

    #[test]
    fn test_record_updates_aggregates() {
        let h = Histogram::new();
        h.record(10);
        h.record(20);
        h.record(30);

        let s = h.snapshot();
        assert_eq!(s.count, 3);
        assert_eq!(s.sum, 60);
        assert_eq!(s.min, 10);
        assert_eq!(s.max, 30);
        assert_eq!(s.mean(), 20.0);
    }

    #[test]
    fn test_bucket_placement() {
        let h = Histogram::new();
        h.record(0); // bucket 0
        h.record(1); // bucket 1
        h.record(2); // bucket 2
        h.record(3); // bucket 2
        h.record(4); // bucket 3

        let s = h.snapshot();
        assert_eq!(s.buckets[0], 1);
        assert_eq!(s.buckets[1], 1);
        assert_eq!(s.buckets[2], 2);
        assert_eq!(s.buckets[3], 1);
    }

    #[test]
    fn test_huge_value_lands_in_last_bucket() {
        let h = Histogram::new();
        h.record(u64::MAX);
        let s = h.snapshot();
        assert_eq!(s.buckets[BUCKETS - 1], 1);
        assert_eq!(s.max, u64::MAX);
    }

    #[test]
    fn test_reset() {
        let h = Histogram::new();
        h.record(42);
        h.reset();
        let s = h.snapshot();
        assert_eq!(s.count, 0);
        assert_eq!(s.max, 0);
        assert_eq!(s.buckets.iter().sum::<u64>(), 0);
    }

    #[test]
    fn test_concurrent_records() {
        use std::sync::Arc;
        use std::thread;

        let h = Arc::new(Histogram::new());
        let mut handles = Vec::new();
        for _ in 0..4 {
            let h = Arc::clone(&h);
            handles.push(thread::spawn(move || {
                for i in 0..1000u64 {
                    h.record(i);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let s = h.snapshot();
        assert_eq!(s.count, 4000);
        assert_eq!(s.min, 0);
        assert_eq!(s.max, 999);
    }

    #[test]
    fn test_snapshot_serializes() {
        let h = Histogram::new();
        h.record(7);
        let json = serde_json::to_string(&h.snapshot()).unwrap();
        assert!(json.contains("\"count\":1"));
    }
}
