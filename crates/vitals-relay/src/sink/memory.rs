//! In-memory sink retaining recent payloads.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use vitals_core::encode::EncodedSnapshot;
use vitals_core::error::Result;

use super::Sink;

/// Keeps the most recent payloads in a ring. Tests assert against it, and
/// it doubles as a local buffer when no real backend is wired up yet.
pub struct MemorySink {
    name: String,
    capacity: usize,
    payloads: Mutex<VecDeque<EncodedSnapshot>>,
}

impl MemorySink {
    pub fn new(capacity: usize) -> Self {
        Self::named("memory", capacity)
    }

    pub fn named(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            capacity: capacity.max(1),
            payloads: Mutex::new(VecDeque::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.payloads.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.lock().is_empty()
    }

    /// Retained payloads, oldest first.
    pub fn payloads(&self) -> Vec<EncodedSnapshot> {
        self.payloads.lock().iter().cloned().collect()
    }

    pub fn last(&self) -> Option<EncodedSnapshot> {
        self.payloads.lock().back().cloned()
    }
}

#[async_trait]
impl Sink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, payload: EncodedSnapshot) -> Result<()> {
        let mut buf = self.payloads.lock();
        if buf.len() == self.capacity {
            buf.pop_front();
        }
        buf.push_back(payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn payload(tag: &str) -> EncodedSnapshot {
        EncodedSnapshot {
            content_type: "text/plain; charset=utf-8",
            body: Bytes::from(tag.to_owned()),
        }
    }

    #[tokio::test]
    async fn ring_drops_oldest() {
        let sink = MemorySink::new(2);
        for tag in ["a", "b", "c"] {
            sink.send(payload(tag)).await.unwrap();
        }
        let kept: Vec<_> = sink
            .payloads()
            .into_iter()
            .map(|p| String::from_utf8(p.body.to_vec()).unwrap())
            .collect();
        assert_eq!(kept, vec!["b", "c"]);
        assert_eq!(sink.last().map(|p| p.body), Some(Bytes::from("c")));
    }
}
