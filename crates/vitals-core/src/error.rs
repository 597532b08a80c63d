//! Shared error type across vitals crates.

use thiserror::Error;

use crate::identity::MetricKind;

/// Shared result type.
pub type Result<T> = std::result::Result<T, VitalsError>;

/// Unified error type used by core and relay.
#[derive(Debug, Error)]
pub enum VitalsError {
    /// An identity was requested under a different instrument kind than the
    /// one it was first registered with. The registry entry is left as-is.
    #[error("metric `{id}` is registered as {existing}, requested as {requested}")]
    KindMismatch {
        id: String,
        existing: MetricKind,
        requested: MetricKind,
    },
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("snapshot encode failed: {0}")]
    Encode(String),
    #[error("delivery failed: {0}")]
    Transport(String),
    #[error("delivery timed out after {0} ms")]
    Timeout(u64),
}

impl VitalsError {
    /// Whether a reporter should retry after this error. Timeouts count as
    /// transport failures for the retry policy; everything else is permanent
    /// within the current tick.
    pub fn is_transient(&self) -> bool {
        matches!(self, VitalsError::Transport(_) | VitalsError::Timeout(_))
    }
}
