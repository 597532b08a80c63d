//! Periodic reporting: per-reporter tasks plus the scheduler that owns them.

mod reporter;
mod scheduler;

pub use reporter::ReporterStats;
pub use scheduler::ReportScheduler;
