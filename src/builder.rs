use std::{fmt, sync::Arc, time::Duration};

use super::{CloseError, Manager, Pool, PoolConfig, ReclaimError};

pub(crate) type ReclaimErrorSink<E> = Arc<dyn Fn(ReclaimError<E>) + Send + Sync>;

/// Builder for [`Pool`]s.
///
/// Instances of this are created by calling the [`Pool::builder()`] method.
#[must_use = "builder does nothing itself, use `.build()` to build it"]
pub struct PoolBuilder<M: Manager> {
    pub(crate) manager: M,
    pub(crate) config: PoolConfig,
    pub(crate) on_reclaim_error: ReclaimErrorSink<CloseError<M>>,
}

// Implemented manually as the error sink is an opaque closure.
impl<M> fmt::Debug for PoolBuilder<M>
where
    M: fmt::Debug + Manager,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolBuilder")
            .field("manager", &self.manager)
            .field("config", &self.config)
            .finish()
    }
}

impl<M: Manager> PoolBuilder<M> {
    pub(crate) fn new(manager: M) -> Self {
        Self {
            manager,
            config: PoolConfig::default(),
            on_reclaim_error: Arc::new(log_reclaim_error::<CloseError<M>>),
        }
    }

    /// Builds the [`Pool`], creating its primary handle.
    ///
    /// # Errors
    ///
    /// Returns the error of [`Manager::create()`] if the primary handle
    /// couldn't be created. No [`Pool`] is built in that case.
    pub async fn build(self) -> Result<Pool<M>, M::Error> {
        Pool::from_builder(self).await
    }

    /// Sets a [`PoolConfig`] to build the [`Pool`] with.
    pub fn config(mut self, value: PoolConfig) -> Self {
        self.config = value;
        self
    }

    /// Sets the [`PoolConfig::idle_ttl`].
    pub fn idle_ttl(mut self, value: Duration) -> Self {
        self.config.idle_ttl = value;
        self
    }

    /// Sets the [`PoolConfig::reclaim_interval`].
    pub fn reclaim_interval(mut self, value: Duration) -> Self {
        self.config.reclaim_interval = value;
        self
    }

    /// Sets the sink receiving errors of handles that failed to close while
    /// being reclaimed.
    ///
    /// Defaults to logging the error with [`tracing`] and carrying on.
    pub fn on_reclaim_error<F>(mut self, sink: F) -> Self
    where
        F: Fn(ReclaimError<CloseError<M>>) + Send + Sync + 'static,
    {
        self.on_reclaim_error = Arc::new(sink);
        self
    }
}

fn log_reclaim_error<E: fmt::Debug>(err: ReclaimError<E>) {
    tracing::warn!(
        error = ?err.error,
        forced = err.forced,
        "failed to close reclaimed handle"
    );
}
