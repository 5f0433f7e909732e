use core::cell::Cell;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    config::WorkerConfig,
    error::Result,
    generator::{
        IdGenerator, Poll,
        state::{Step, advance},
    },
    id::SnowflakeId,
    time::TimeSource,
};

/// A non-concurrent Snowflake ID generator suitable for single-threaded
/// environments.
///
/// This generator is lightweight and fast, but **not thread-safe**.
///
/// ## Features
/// - ❌ Not thread-safe
/// - ✅ No locking or atomics on the hot path
///
/// ## Recommended When
/// - You're in a single-threaded environment (no shared access)
/// - Each thread owns its own `(datacenter, worker)` pair
///
/// ## See Also
/// - [`LockIdWorker`]
/// - [`AtomicIdWorker`]
///
/// [`LockIdWorker`]: crate::generator::LockIdWorker
/// [`AtomicIdWorker`]: crate::generator::AtomicIdWorker
pub struct BasicIdWorker<T>
where
    T: TimeSource,
{
    pub(crate) state: Cell<Option<SnowflakeId>>,
    config: WorkerConfig,
    time: T,
}

impl<T> BasicIdWorker<T>
where
    T: TimeSource,
{
    /// Creates a new [`BasicIdWorker`] that has not issued any id yet.
    ///
    /// # Example
    /// ```
    /// use idworker::{BasicIdWorker, IdGenerator, MonotonicClock, TWITTER_EPOCH, WorkerConfig};
    ///
    /// let config = WorkerConfig::new(TWITTER_EPOCH, 1, 1)?;
    /// let generator = BasicIdWorker::new(config, MonotonicClock::new());
    ///
    /// let id = generator.next_id_with(|_| std::thread::yield_now())?;
    /// assert_eq!(id.worker_id(), 1);
    /// # Ok::<(), idworker::Error>(())
    /// ```
    pub fn new(config: WorkerConfig, time: T) -> Self {
        Self {
            state: Cell::new(None),
            config,
            time,
        }
    }

    /// Creates a generator as if it had last issued the id at `timestamp`
    /// (ms since the epoch) with `sequence`.
    ///
    /// Useful for restoring state, or for starting from a known point in
    /// tests. Prefer [`Self::new`] otherwise.
    pub fn from_components(config: WorkerConfig, timestamp: u64, sequence: u64, time: T) -> Self {
        let last = SnowflakeId::from_components(
            timestamp,
            config.datacenter_id(),
            config.worker_id(),
            sequence,
        );
        Self {
            state: Cell::new(Some(last)),
            config,
            time,
        }
    }

    /// A fallible, non-blocking attempt to generate the next ID.
    ///
    /// # Returns
    /// - `Ok(Poll::Ready { id })`: A new ID is available
    /// - `Ok(Poll::Pending { yield_for })`: The time to wait (in
    ///   milliseconds) before trying again
    /// - `Err(e)`: the clock moved backwards or cannot be encoded
    ///
    /// # Errors
    ///
    /// See [`IdGenerator::try_poll_id`].
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_poll_id(&self) -> Result<Poll> {
        let now = self.time.current_millis();
        match advance(&self.config, self.state.get(), now)? {
            Step::Mint(id) => {
                self.state.set(Some(id));
                Ok(Poll::Ready { id })
            }
            Step::Exhausted => Ok(Poll::Pending { yield_for: 1 }),
        }
    }
}

impl<T> IdGenerator for BasicIdWorker<T>
where
    T: TimeSource,
{
    fn config(&self) -> &WorkerConfig {
        &self.config
    }

    fn try_poll_id(&self) -> Result<Poll> {
        self.try_poll_id()
    }
}
