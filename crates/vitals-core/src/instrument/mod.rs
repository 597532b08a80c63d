//! Instruments: the write-side types applications record into.
//!
//! All instruments are `Send + Sync` and update through `&self`, so one
//! instance can be shared across any number of threads or tasks. Reads for
//! snapshots go through each instrument's `collect`, which is the only place
//! reset-on-read happens.

mod counter;
mod gauge;
mod histogram;
mod meter;
mod timer;

pub use counter::Counter;
pub use gauge::Gauge;
pub use histogram::Histogram;
pub use meter::{Ewma, Meter, TICK_INTERVAL};
pub use timer::{Timer, TimerGuard};
