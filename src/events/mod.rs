//! # Runtime events and the bus that carries them.
//!
//! - [`Event`] / [`EventKind`] - sequence-numbered lifecycle events
//! - [`Bus`] - broadcast channel the supervisor and multiplexers publish to
//!
//! Re-exported at the crate root behind the `events` feature.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
