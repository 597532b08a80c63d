//! Adjustable atomic counter.

use std::sync::atomic::{AtomicI64, Ordering};

/// Cumulative count. Lock-free; a relaxed atomic is enough because every
/// mutation of the value is a single read-modify-write.
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicI64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn inc(&self) {
        self.inc_by(1);
    }

    #[inline]
    pub fn inc_by(&self, n: i64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub fn dec(&self) {
        self.inc_by(-1);
    }

    #[inline]
    pub fn dec_by(&self, n: i64) {
        self.inc_by(-n);
    }

    pub fn value(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }

    /// Read for a snapshot. With `reset` the read and the zeroing are one
    /// atomic swap, so an increment racing the snapshot lands in either this
    /// reading or the next, never nowhere.
    pub fn collect(&self, reset: bool) -> i64 {
        if reset {
            self.value.swap(0, Ordering::Relaxed)
        } else {
            self.value()
        }
    }
}
