use std::time::Duration;

/// Default time a released handle may stay idle before it is reclaimed.
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(60);

/// Default period of the reclaimer.
pub const DEFAULT_RECLAIM_INTERVAL: Duration = Duration::from_secs(20);

/// [`Pool`] configuration.
///
/// [`Pool`]: super::Pool
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PoolConfig {
    /// Time a handle may sit in the idle stack before the reclaimer closes
    /// it.
    ///
    /// A zero TTL expires every idle handle on each reclaimer tick.
    pub idle_ttl: Duration,

    /// Period between two reclaimer passes while there are idle handles.
    pub reclaim_interval: Duration,
}

impl PoolConfig {
    /// Creates a new [`PoolConfig`] with the provided `idle_ttl` and the
    /// default reclaim interval.
    #[must_use]
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            idle_ttl,
            reclaim_interval: DEFAULT_RECLAIM_INTERVAL,
        }
    }
}

impl Default for PoolConfig {
    /// Creates a new [`PoolConfig`] with an `idle_ttl` of 60 seconds and a
    /// `reclaim_interval` of 20 seconds.
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_TTL)
    }
}
