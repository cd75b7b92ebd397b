//! # Global runtime configuration.
//!
//! Provides [`Config`] centralized settings for the supervisor runtime.
//!
//! ## Sentinel values
//! - `chunk_size = 0` → clamped up to 1 by [`Config::chunk_size_clamped`]
//! - `bus_capacity = 0` → clamped up to 1 by the event bus

use crate::process::ResourceLimits;

/// Default read size for the output producers, in bytes.
///
/// The value is a policy choice with no deeper meaning; any positive size
/// preserves the stream contract. Tune via [`Config::chunk_size`].
pub const DEFAULT_CHUNK_SIZE: usize = 76;

/// Global configuration for the supervisor runtime.
///
/// ## Field semantics
/// - `chunk_size`: bytes per producer read (`0` is treated as 1)
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
/// - `resource_limits`: default limits applied to process requests
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum number of bytes a producer pulls from a reader per read.
    ///
    /// A partial final chunk at EOF is delivered as-is; a larger value
    /// trades delivery granularity for fewer wakeups.
    pub chunk_size: usize,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Event listeners that lag behind more than `bus_capacity` messages
    /// will skip older events.
    pub bus_capacity: usize,

    /// Default resource limits for started processes.
    ///
    /// Reserved for the cgroup integration layered on top of this crate;
    /// the core records the limits but does not apply them.
    pub resource_limits: ResourceLimits,
}

impl Config {
    /// Returns the chunk size clamped to a minimum of 1.
    #[inline]
    pub fn chunk_size_clamped(&self) -> usize {
        self.chunk_size.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `chunk_size = 76` ([`DEFAULT_CHUNK_SIZE`])
    /// - `bus_capacity = 1024` (good baseline)
    /// - `resource_limits = ResourceLimits::default()` (unlimited)
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            bus_capacity: 1024,
            resource_limits: ResourceLimits::default(),
        }
    }
}
