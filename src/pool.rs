use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tokio::{runtime::Handle, task::JoinHandle, time::Instant};

use crate::{
    builder::ReclaimErrorSink,
    reclaimer::{self, IdleEntry},
    Closable, Manager, PoolBuilder, PoolConfig, PoolError, PoolMetrics, ReclaimError, Status,
};

/// Error returned when closing a handle of the [`Manager`] `M`.
pub type CloseError<M> = <<M as Manager>::Type as Closable>::Error;

/// Generic pool of closable handles.
///
/// The pool owns a primary handle created up front and a stack of idle
/// handles that callers [`release()`] back after use. Idle handles are reused
/// most-recently-released first and closed by a background reclaimer once
/// they have been idle for longer than [`PoolConfig::idle_ttl`].
///
/// This struct can be cloned and transferred across thread boundaries and uses
/// reference counting for its internal state.
///
/// [`release()`]: Pool::release
pub struct Pool<M: Manager> {
    pub(crate) inner: Arc<PoolInner<M>>,
}

// Implemented manually to avoid unnecessary trait bound on the error sink.
impl<M> fmt::Debug for Pool<M>
where
    M: fmt::Debug + Manager,
    M::Type: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool").field("inner", &self.inner).finish()
    }
}

impl<M: Manager> Clone for Pool<M> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<M: Manager> Pool<M> {
    /// Instantiates a builder for a new [`Pool`].
    pub fn builder(manager: M) -> PoolBuilder<M> {
        PoolBuilder::new(manager)
    }

    /// Creates a new [`Pool`] with the given `config`, awaiting the creation
    /// of its primary handle.
    ///
    /// # Errors
    ///
    /// Returns the error of [`Manager::create()`] if the primary handle
    /// couldn't be created.
    pub async fn create(manager: M, config: PoolConfig) -> Result<Self, M::Error> {
        Self::builder(manager).config(config).build().await
    }

    pub(crate) async fn from_builder(builder: PoolBuilder<M>) -> Result<Self, M::Error> {
        let PoolBuilder {
            manager,
            config,
            on_reclaim_error,
        } = builder;
        let primary = manager.create().await?;
        let metrics = PoolMetrics::default();
        metrics.record_created();
        tracing::debug!(?config, "pool created");
        Ok(Self {
            inner: Arc::new(PoolInner {
                manager,
                config,
                on_reclaim_error,
                metrics,
                runtime: Handle::try_current().ok(),
                state: Mutex::new(PoolState {
                    primary: Some(Arc::new(primary)),
                    idle: Vec::new(),
                    closed: false,
                    reclaimer: None,
                }),
            }),
        })
    }

    /// Returns the primary handle of this [`Pool`].
    ///
    /// The primary handle is never handed out by [`Pool::acquire()`] and is
    /// never reclaimed. It lives until [`Pool::close()`].
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Closed`] once the [`Pool`] has been closed.
    pub fn primary(&self) -> Result<Arc<M::Type>, PoolError<M::Error>> {
        self.inner.state().primary.clone().ok_or(PoolError::Closed)
    }

    /// Retrieves a handle from this [`Pool`].
    ///
    /// The most recently released idle handle is reused if there is one,
    /// otherwise a new one is created. This never waits for another handle to
    /// be released; the number of outstanding handles is unbounded.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Closed`] if the [`Pool`] has been closed and
    /// [`PoolError::Backend`] if [`Manager::create()`] failed.
    pub async fn acquire(&self) -> Result<M::Type, PoolError<M::Error>> {
        let entry = {
            let mut state = self.inner.state();
            if state.closed {
                return Err(PoolError::Closed);
            }
            state.idle.pop()
        };
        if let Some(entry) = entry {
            self.inner.metrics.record_reused();
            tracing::trace!(idle_for = ?entry.released_at.elapsed(), "reusing idle handle");
            return Ok(entry.handle);
        }
        let handle = self.inner.manager.create().await?;
        self.inner.metrics.record_created();
        tracing::debug!("created new handle");
        Ok(handle)
    }

    /// Returns a `handle` to this [`Pool`].
    ///
    /// The handle becomes idle and is armed for reclamation. If the [`Pool`]
    /// has already been closed, every idle handle, including this one, is
    /// closed before this method returns. Failures to close are routed to the
    /// [`PoolBuilder::on_reclaim_error()`] sink.
    ///
    /// The reclaimer runs on the current Tokio runtime, or on the runtime the
    /// [`Pool`] was built in when this is polled by another executor. Without
    /// either the handle stays idle until a later release arms the reclaimer.
    pub async fn release(&self, handle: M::Type) {
        let drained = {
            let mut state = self.inner.state();
            state.idle.push(IdleEntry {
                handle,
                released_at: Instant::now(),
            });
            if state.closed {
                Some(reclaimer::take_expired(
                    &mut state.idle,
                    self.inner.config.idle_ttl,
                    Instant::now(),
                    true,
                ))
            } else {
                // A finished task means its runtime went away before it
                // could disarm itself.
                if state.reclaimer.as_ref().map_or(true, JoinHandle::is_finished) {
                    state.reclaimer = reclaimer::spawn(&self.inner);
                }
                None
            }
        };
        if let Some(drained) = drained {
            self.inner.close_all(drained, true).await;
        }
    }

    /// Closes this [`Pool`] and its primary handle.
    ///
    /// Handles currently checked out are left alone. Handles already idle
    /// stay in the pool until the reclaimer expires them or the next
    /// [`Pool::release()`] drains them; if neither happens they are never
    /// closed.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::AlreadyClosed`] on a second call and
    /// [`PoolError::Backend`] if closing the primary handle failed. The
    /// [`Pool`] is closed in either case.
    pub async fn close(&self) -> Result<(), PoolError<CloseError<M>>> {
        let primary = {
            let mut state = self.inner.state();
            if state.closed {
                return Err(PoolError::AlreadyClosed);
            }
            state.closed = true;
            state.primary.take()
        };
        tracing::debug!("closing pool");
        match primary {
            Some(primary) => primary.close().await.map_err(PoolError::Backend),
            None => Ok(()),
        }
    }

    /// Indicates whether this [`Pool`] has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.state().closed
    }

    /// Retrieves [`Status`] of this [`Pool`].
    #[must_use]
    pub fn status(&self) -> Status {
        let state = self.inner.state();
        Status {
            idle: state.idle.len(),
            closed: state.closed,
            reclaimer_armed: state
                .reclaimer
                .as_ref()
                .map_or(false, |task| !task.is_finished()),
        }
    }

    /// Returns [`PoolMetrics`] of this [`Pool`].
    pub fn metrics(&self) -> &PoolMetrics {
        &self.inner.metrics
    }

    /// Returns [`PoolConfig`] of this [`Pool`].
    #[must_use]
    pub fn config(&self) -> PoolConfig {
        self.inner.config
    }

    /// Returns [`Manager`] of this [`Pool`].
    #[must_use]
    pub fn manager(&self) -> &M {
        &self.inner.manager
    }
}

pub(crate) struct PoolState<T> {
    pub(crate) primary: Option<Arc<T>>,
    pub(crate) idle: Vec<IdleEntry<T>>,
    pub(crate) closed: bool,
    pub(crate) reclaimer: Option<JoinHandle<()>>,
}

pub(crate) struct PoolInner<M: Manager> {
    pub(crate) config: PoolConfig,
    manager: M,
    on_reclaim_error: ReclaimErrorSink<CloseError<M>>,
    metrics: PoolMetrics,
    pub(crate) runtime: Option<Handle>,
    state: Mutex<PoolState<M::Type>>,
}

impl<M> fmt::Debug for PoolInner<M>
where
    M: fmt::Debug + Manager,
    M::Type: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("PoolInner")
            .field("config", &self.config)
            .field("manager", &self.manager)
            .field("metrics", &self.metrics)
            .field("primary", &state.primary)
            .field("idle", &state.idle)
            .field("closed", &state.closed)
            .finish()
    }
}

impl<M: Manager> PoolInner<M> {
    // Bookkeeping is never left half-updated, so a poisoned lock is still
    // consistent.
    pub(crate) fn state(&self) -> MutexGuard<'_, PoolState<M::Type>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Closes every handle in `handles` one after another. Failures are
    /// handed to the error sink and do not stop the remaining closes.
    pub(crate) async fn close_all(&self, handles: Vec<M::Type>, forced: bool) {
        if handles.is_empty() {
            return;
        }
        let count = handles.len();
        let mut failures = 0;
        for handle in handles {
            if let Err(error) = handle.close().await {
                failures += 1;
                (self.on_reclaim_error)(ReclaimError { error, forced });
            }
        }
        self.metrics.record_reclaimed(count, failures);
        tracing::debug!(count, failures, forced, "reclaimed idle handles");
    }
}

impl<M: Manager> Drop for PoolInner<M> {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(reclaimer) = state.reclaimer.take() {
            reclaimer.abort();
        }
        if !state.idle.is_empty() {
            tracing::debug!(
                count = state.idle.len(),
                "pool dropped with idle handles left unclosed"
            );
        }
    }
}
