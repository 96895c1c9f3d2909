use std::fmt;

/// Possible errors returned by the [`Pool`] operations.
///
/// [`Pool`]: super::Pool
#[derive(Debug)]
pub enum PoolError<E> {
    /// Backend reported an error.
    ///
    /// For [`Pool::acquire()`] this is the error of [`Manager::create()`], for
    /// [`Pool::close()`] the error of closing the primary handle.
    ///
    /// [`Pool::acquire()`]: super::Pool::acquire
    /// [`Pool::close()`]: super::Pool::close
    /// [`Manager::create()`]: super::Manager::create
    Backend(E),

    /// [`Pool`] has been closed.
    ///
    /// [`Pool`]: super::Pool
    Closed,

    /// [`Pool::close()`] was called on an already closed [`Pool`].
    ///
    /// [`Pool`]: super::Pool
    /// [`Pool::close()`]: super::Pool::close
    AlreadyClosed,
}

impl<E> From<E> for PoolError<E> {
    fn from(e: E) -> Self {
        Self::Backend(e)
    }
}

impl<E: fmt::Display> fmt::Display for PoolError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend(e) => write!(f, "Backend error: {}", e),
            Self::Closed => write!(f, "Pool has been closed"),
            Self::AlreadyClosed => write!(f, "Pool has already been closed"),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for PoolError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Closed | Self::AlreadyClosed => None,
            Self::Backend(e) => Some(e),
        }
    }
}

/// Failure to close a handle evicted by the reclaimer.
///
/// These errors never reach a caller of the [`Pool`]. They are handed to the
/// sink configured via [`PoolBuilder::on_reclaim_error()`].
///
/// [`Pool`]: super::Pool
/// [`PoolBuilder::on_reclaim_error()`]: super::PoolBuilder::on_reclaim_error
#[derive(Debug)]
pub struct ReclaimError<E> {
    /// Error returned by [`Closable::close()`].
    ///
    /// [`Closable::close()`]: super::Closable::close
    pub error: E,

    /// Whether the handle was drained by a forced pass after the pool had
    /// been closed rather than because its idle time expired.
    pub forced: bool,
}

impl<E: fmt::Display> fmt::Display for ReclaimError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.forced {
            write!(f, "Error occurred while draining an idle handle: {}", self.error)
        } else {
            write!(f, "Error occurred while reclaiming an expired handle: {}", self.error)
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for ReclaimError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
