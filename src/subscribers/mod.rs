//! # Event subscribers for the supervisor runtime.
//!
//! Provides the [`Subscribe`] trait plus the internal fan-out machinery
//! that delivers [`Event`](crate::events::Event)s published on the bus to
//! every registered subscriber through a bounded per-subscriber queue.

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscriber;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub(crate) use set::SubscriberSet;
pub use subscriber::Subscribe;
