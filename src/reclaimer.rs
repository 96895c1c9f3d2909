use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use tokio::{
    runtime::Handle,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

use crate::{pool::PoolInner, Manager};

// `tokio::time::interval` panics on a zero period.
const MIN_RECLAIM_INTERVAL: Duration = Duration::from_millis(1);

// Roughly 30 years, the same "far future" tokio uses for its own timers.
// Anything longer overflows `Instant`.
const MAX_RECLAIM_INTERVAL: Duration = Duration::from_secs(86400 * 365 * 30);

/// Handle released into the idle stack.
#[derive(Debug)]
pub(crate) struct IdleEntry<T> {
    pub(crate) handle: T,
    pub(crate) released_at: Instant,
}

/// Removes the expired prefix of `idle` and returns its handles.
///
/// `idle` is scanned from its oldest end and the scan stops at the first
/// entry that is still fresh; entries behind it are left alone even if they
/// are older. A `forced` pass treats every entry as expired.
pub(crate) fn take_expired<T>(
    idle: &mut Vec<IdleEntry<T>>,
    ttl: Duration,
    now: Instant,
    forced: bool,
) -> Vec<T> {
    let end = if forced {
        idle.len()
    } else {
        idle.iter()
            .position(|entry| now.saturating_duration_since(entry.released_at) < ttl)
            .unwrap_or(idle.len())
    };
    idle.drain(..end).map(|entry| entry.handle).collect()
}

/// Clamps the configured reclaim interval to what a tokio interval accepts.
pub(crate) fn period(configured: Duration) -> Duration {
    configured.clamp(MIN_RECLAIM_INTERVAL, MAX_RECLAIM_INTERVAL)
}

/// Starts the background task evicting handles idle for longer than the
/// configured TTL.
///
/// The task runs on the current runtime, falling back to the one the pool was
/// built in. It keeps only a [`Weak`] reference to the pool and exits once the
/// pool is gone or once a pass leaves the idle stack empty.
///
/// Returns [`None`] if there is no runtime to run the task on.
pub(crate) fn spawn<M: Manager>(pool: &Arc<PoolInner<M>>) -> Option<JoinHandle<()>> {
    let runtime = match Handle::try_current().ok().or_else(|| pool.runtime.clone()) {
        Some(runtime) => runtime,
        None => {
            tracing::warn!("no Tokio runtime available, reclaimer not armed");
            return None;
        }
    };
    let period = period(pool.config.reclaim_interval);
    tracing::debug!(?period, "arming reclaimer");
    Some(runtime.spawn(run(Arc::downgrade(pool), period)))
}

async fn run<M: Manager>(pool: Weak<PoolInner<M>>, period: Duration) {
    let start = Instant::now()
        .checked_add(period)
        .unwrap_or_else(|| Instant::now() + MIN_RECLAIM_INTERVAL);
    let mut interval = time::interval_at(start, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        let _ = interval.tick().await;
        let inner = match pool.upgrade() {
            Some(inner) => inner,
            None => break,
        };
        let (expired, disarmed) = {
            let mut state = inner.state();
            let expired = take_expired(
                &mut state.idle,
                inner.config.idle_ttl,
                Instant::now(),
                false,
            );
            let disarmed = state.idle.is_empty();
            if disarmed {
                state.reclaimer = None;
            }
            (expired, disarmed)
        };
        inner.close_all(expired, false).await;
        if disarmed {
            tracing::debug!("idle stack empty, disarming reclaimer");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle_at(now: Instant, ages: &[u64]) -> Vec<IdleEntry<u64>> {
        ages.iter()
            .map(|&age| IdleEntry {
                handle: age,
                released_at: now - Duration::from_secs(age),
            })
            .collect()
    }

    #[test]
    fn stops_at_first_fresh_entry() {
        let now = Instant::now() + Duration::from_secs(3600);
        let mut idle = idle_at(now, &[90, 70, 10, 80, 5]);
        let expired = take_expired(&mut idle, Duration::from_secs(60), now, false);
        assert_eq!(expired, vec![90, 70]);
        let left: Vec<u64> = idle.iter().map(|e| e.handle).collect();
        assert_eq!(left, vec![10, 80, 5]);
    }

    #[test]
    fn ttl_boundary_is_inclusive() {
        let now = Instant::now() + Duration::from_secs(3600);
        let mut idle = idle_at(now, &[60, 59]);
        let expired = take_expired(&mut idle, Duration::from_secs(60), now, false);
        assert_eq!(expired, vec![60]);
        assert_eq!(idle.len(), 1);
    }

    #[test]
    fn zero_ttl_expires_everything() {
        let now = Instant::now() + Duration::from_secs(3600);
        let mut idle = idle_at(now, &[0, 0, 0]);
        let expired = take_expired(&mut idle, Duration::ZERO, now, false);
        assert_eq!(expired.len(), 3);
        assert!(idle.is_empty());
    }

    #[test]
    fn period_is_clamped() {
        assert_eq!(period(Duration::ZERO), MIN_RECLAIM_INTERVAL);
        assert_eq!(period(Duration::MAX), MAX_RECLAIM_INTERVAL);
        assert_eq!(period(Duration::from_secs(20)), Duration::from_secs(20));
        assert!(Instant::now().checked_add(period(Duration::MAX)).is_some());
    }

    #[test]
    fn forced_pass_takes_fresh_entries() {
        let now = Instant::now() + Duration::from_secs(3600);
        let mut idle = idle_at(now, &[1, 2, 3]);
        let expired = take_expired(&mut idle, Duration::from_secs(60), now, true);
        assert_eq!(expired, vec![1, 2, 3]);
        assert!(idle.is_empty());
    }
}
