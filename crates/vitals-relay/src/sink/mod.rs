//! Delivery sinks.
//!
//! A sink is the transport boundary: it takes an encoded snapshot and gets it
//! to some backend. The reporting pipeline depends only on this trait, so a
//! new backend is one impl away and never touches scheduling or retry code.

mod console;
mod memory;

pub use console::ConsoleSink;
pub use memory::MemorySink;

use async_trait::async_trait;

use vitals_core::encode::EncodedSnapshot;
use vitals_core::error::Result;

#[async_trait]
pub trait Sink: Send + Sync {
    /// Short name used in logs and stats.
    fn name(&self) -> &str;

    /// Deliver one encoded snapshot. Failures that are worth retrying should
    /// surface as [`vitals_core::VitalsError::Transport`]; anything else ends
    /// the tick's delivery immediately.
    async fn send(&self, payload: EncodedSnapshot) -> Result<()>;
}
