//! vitals core: instruments, sampling reservoirs, snapshots, and filters.
//!
//! This crate defines the measurement contracts shared by the relay, sinks,
//! and embedding applications. It intentionally carries no async runtime or
//! transport dependencies so instruments can be updated from any thread in
//! any kind of process.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `VitalsError`/`Result` so a metrics
//! engine never takes down the process it is observing.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod encode;
pub mod error;
pub mod filter;
pub mod identity;
pub mod instrument;
pub mod sampling;
pub mod snapshot;

/// Shared result type.
pub use error::{Result, VitalsError};
pub use identity::{MetricId, MetricKind};
