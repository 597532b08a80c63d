//! vitals relay library entry.
//!
//! This crate wires the registry, snapshot builder, report scheduler, sinks,
//! and health checks into a runnable reporting stack. It is intended to be
//! consumed by the binary (`main.rs`), by integration tests, and by services
//! embedding their own reporting loop.

pub mod collect;
pub mod config;
pub mod health;
pub mod registry;
pub mod report;
pub mod sink;
