//! Top-level facade crate for vitals.
//!
//! Re-exports the core measurement types and the relay runtime so users can
//! depend on a single crate.

pub mod core {
    pub use vitals_core::*;
}

pub mod relay {
    pub use vitals_relay::*;
}
