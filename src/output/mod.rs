//! # Output capture and fan-out.
//!
//! - [`OutputMultiplexer`] - drains a process's output readers into an
//!   append-only log and broadcasts chunks to subscribers
//! - [`OutputSubscription`] / [`OutputRecord`] - per-subscriber endpoint
//! - [`OutputReader`] - boxed byte-stream reader a producer drains

mod multiplexer;
mod subscription;

pub use multiplexer::{OutputMultiplexer, OutputReader};
pub use subscription::{OutputRecord, OutputSubscription};
