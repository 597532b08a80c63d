//! Point-in-time gauge.

use std::fmt;

use parking_lot::RwLock;

enum Source {
    Value(f64),
    Provider(Box<dyn Fn() -> f64 + Send + Sync>),
}

/// Instantaneous value, either set directly or pulled from a provider
/// callback at read time.
///
/// Providers run inline during snapshot builds, so they must return quickly
/// and must not touch the registry.
pub struct Gauge {
    source: RwLock<Source>,
}

impl Gauge {
    pub fn new() -> Self {
        Self {
            source: RwLock::new(Source::Value(0.0)),
        }
    }

    /// Pin the gauge to a fixed value, replacing any provider.
    pub fn set(&self, value: f64) {
        *self.source.write() = Source::Value(value);
    }

    /// Install a callback evaluated on every read.
    pub fn set_provider(&self, provider: impl Fn() -> f64 + Send + Sync + 'static) {
        *self.source.write() = Source::Provider(Box::new(provider));
    }

    pub fn value(&self) -> f64 {
        match &*self.source.read() {
            Source::Value(v) => *v,
            Source::Provider(f) => f(),
        }
    }
}

impl Default for Gauge {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Gauge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.source.read() {
            Source::Value(v) => f.debug_tuple("Gauge").field(v).finish(),
            Source::Provider(_) => f.debug_tuple("Gauge").field(&"<provider>").finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;

    #[test]
    fn starts_at_zero_and_tracks_set() {
        let g = Gauge::new();
        assert_eq!(g.value(), 0.0);
        g.set(12.5);
        assert_eq!(g.value(), 12.5);
        g.set(-3.0);
        assert_eq!(g.value(), -3.0);
    }

    #[test]
    fn provider_is_read_live() {
        let depth = Arc::new(AtomicI64::new(4));
        let g = Gauge::new();
        {
            let depth = Arc::clone(&depth);
            g.set_provider(move || depth.load(Ordering::Relaxed) as f64);
        }
        assert_eq!(g.value(), 4.0);
        depth.store(9, Ordering::Relaxed);
        assert_eq!(g.value(), 9.0);
    }

    #[test]
    fn set_replaces_provider() {
        let g = Gauge::new();
        g.set_provider(|| 100.0);
        assert_eq!(g.value(), 100.0);
        g.set(1.0);
        assert_eq!(g.value(), 1.0);
    }
}
