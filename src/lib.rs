#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links
)]
#![warn(clippy::pedantic)]
#![warn(
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]
#![allow(
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::match_same_arms
)]

mod builder;
mod config;
mod errors;
mod metrics;
mod pool;
mod reclaimer;

pub use self::{
    builder::PoolBuilder,
    config::{PoolConfig, DEFAULT_IDLE_TTL, DEFAULT_RECLAIM_INTERVAL},
    errors::{PoolError, ReclaimError},
    metrics::PoolMetrics,
    pool::{CloseError, Pool},
};

use std::{fmt, future::Future};

use async_trait::async_trait;

/// The current pool status.
#[derive(Clone, Copy, Debug)]
pub struct Status {
    /// The current handles idle in the pool.
    pub idle: usize,

    /// Whether [`Pool::close()`] has been called.
    pub closed: bool,

    /// Whether a reclaimer task is currently scheduled.
    pub reclaimer_armed: bool,
}

/// Capability required of every handle managed by a [`Pool`].
#[async_trait]
pub trait Closable: Send + Sync + 'static {
    /// Error that closing a handle can return.
    type Error: fmt::Debug + Send + 'static;

    /// Releases the underlying resource of this handle.
    ///
    /// The [`Pool`] calls this exactly once for every handle it reclaims and
    /// once for the primary handle on [`Pool::close()`].
    async fn close(&self) -> Result<(), Self::Error>;
}

/// Manager responsible for creating new handles.
///
/// Any `Fn() -> impl Future<Output = Result<T, E>>` closure is a [`Manager`]
/// as well.
#[async_trait]
pub trait Manager: Sync + Send + 'static {
    /// Type of handles that this [`Manager`] creates.
    type Type: Closable;
    /// Error that this [`Manager`] can return when creating handles.
    type Error;

    /// Creates a new instance of [`Manager::Type`].
    async fn create(&self) -> Result<Self::Type, Self::Error>;
}

#[async_trait]
impl<F, Fut, T, E> Manager for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Closable,
    E: Send + 'static,
{
    type Type = T;
    type Error = E;

    async fn create(&self) -> Result<T, E> {
        (self)().await
    }
}
