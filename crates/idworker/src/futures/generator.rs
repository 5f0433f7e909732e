use core::{future::Future, time::Duration};

use super::SleepProvider;
use crate::{
    error::Result,
    generator::{IdGenerator, Poll},
    id::SnowflakeId,
};

/// Extension trait for asynchronously generating Snowflake IDs.
///
/// Instead of spinning while the current millisecond is exhausted, the
/// returned future sleeps through the given [`SleepProvider`] and polls
/// again.
pub trait IdGeneratorAsyncExt {
    /// Returns a future that resolves to the next available Snowflake ID.
    ///
    /// # Errors
    ///
    /// Resolves to the first error the generator reports. Clock rollbacks
    /// are not retried.
    fn try_next_id_async<S>(&self) -> impl Future<Output = Result<SnowflakeId>>
    where
        S: SleepProvider;
}

impl<G> IdGeneratorAsyncExt for G
where
    G: IdGenerator + Sync,
{
    fn try_next_id_async<S>(&self) -> impl Future<Output = Result<SnowflakeId>>
    where
        S: SleepProvider,
    {
        async move {
            loop {
                let dur = match self.try_poll_id() {
                    Ok(Poll::Ready { id }) => return Ok(id),
                    Ok(Poll::Pending { yield_for }) => Duration::from_millis(yield_for),
                    Err(e) => return Err(e),
                };
                S::sleep_for(dur).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, LockIdWorker, MonotonicClock, TWITTER_EPOCH, TimeSource, WorkerConfig};

    struct FixedTime;

    impl TimeSource for FixedTime {
        fn current_millis(&self) -> u64 {
            10
        }
    }

    async fn drain_several_milliseconds<S: SleepProvider>() {
        let config = WorkerConfig::new(TWITTER_EPOCH, 5, 6).unwrap();
        let generator = LockIdWorker::new(config, MonotonicClock::new());

        let mut prev = None;
        for _ in 0..(3 * 4096 + 10) {
            let id = generator.try_next_id_async::<S>().await.unwrap();
            assert!(prev < Some(id));
            assert_eq!(id.worker_id(), 5);
            assert_eq!(id.datacenter_id(), 6);
            prev = Some(id);
        }
    }

    async fn rollback_is_surfaced<S: SleepProvider>() {
        let config = WorkerConfig::new(Duration::ZERO, 0, 0).unwrap();
        let generator = LockIdWorker::from_components(config, 25, 0, FixedTime);
        let err = generator.try_next_id_async::<S>().await.unwrap_err();
        assert_eq!(err, Error::ClockRolledBack { skew_ms: 15 });
    }

    #[cfg(feature = "async-tokio")]
    #[tokio::test]
    async fn tokio_sleep_generates_across_milliseconds() {
        drain_several_milliseconds::<crate::TokioSleep>().await;
    }

    #[cfg(feature = "async-tokio")]
    #[tokio::test]
    async fn tokio_yield_generates_across_milliseconds() {
        drain_several_milliseconds::<crate::TokioYield>().await;
    }

    #[cfg(feature = "async-tokio")]
    #[tokio::test]
    async fn tokio_rollback_is_surfaced() {
        rollback_is_surfaced::<crate::TokioSleep>().await;
    }

    #[cfg(feature = "async-smol")]
    #[test]
    fn smol_sleep_generates_across_milliseconds() {
        smol::block_on(drain_several_milliseconds::<crate::SmolSleep>());
    }

    #[cfg(feature = "async-smol")]
    #[test]
    fn smol_yield_rollback_is_surfaced() {
        smol::block_on(rollback_is_surfaced::<crate::SmolYield>());
    }
}
