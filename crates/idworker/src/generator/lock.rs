use core::time::Duration;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    config::WorkerConfig,
    error::Result,
    generator::{
        IdGenerator, Mutex, Poll,
        state::{Step, advance},
    },
    id::SnowflakeId,
    time::{SystemClock, TimeSource},
};

/// The default generator: a [`LockIdWorker`] reading the system wall clock.
pub type IdWorker = LockIdWorker<SystemClock>;

/// A lock-based Snowflake ID generator suitable for multi-threaded
/// environments.
///
/// The clock read and the update of the last issued id happen under one
/// [`Mutex`], so concurrent callers are serialized and ids come out strictly
/// increasing in lock order. Share it behind an `Arc`.
///
/// ## Features
/// - ✅ Thread-safe
/// - ✅ Never reports a false rollback under contention
///
/// ## Recommended When
/// - You're in a multi-threaded environment
/// - Fair access across threads is important
/// - Your target doesn't support 64-bit atomics
///
/// ## See Also
/// - [`BasicIdWorker`]
/// - [`AtomicIdWorker`]
///
/// [`BasicIdWorker`]: crate::generator::BasicIdWorker
/// [`AtomicIdWorker`]: crate::generator::AtomicIdWorker
pub struct LockIdWorker<T>
where
    T: TimeSource,
{
    #[cfg(feature = "cache-padded")]
    pub(crate) state: crossbeam_utils::CachePadded<Mutex<Option<SnowflakeId>>>,
    #[cfg(not(feature = "cache-padded"))]
    pub(crate) state: Mutex<Option<SnowflakeId>>,
    config: WorkerConfig,
    time: T,
}

impl LockIdWorker<SystemClock> {
    /// Builds a wall-clock generator from raw construction parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `worker_id` or `datacenter_id` is
    /// outside `0..=31`.
    ///
    /// # Example
    /// ```
    /// use idworker::{IdGenerator, IdWorker, TWITTER_EPOCH};
    ///
    /// let worker = IdWorker::try_new(TWITTER_EPOCH, 1, 1)?;
    /// let id = worker.next_id()?;
    /// assert_eq!(id.datacenter_id(), 1);
    ///
    /// assert!(IdWorker::try_new(TWITTER_EPOCH, 32, 1).is_err());
    /// # Ok::<(), idworker::Error>(())
    /// ```
    ///
    /// [`Error::Configuration`]: crate::Error::Configuration
    pub fn try_new(epoch: Duration, worker_id: i64, datacenter_id: i64) -> Result<Self> {
        let config = WorkerConfig::new(epoch, worker_id, datacenter_id)?;
        Ok(Self::new(config, SystemClock))
    }
}

impl<T> LockIdWorker<T>
where
    T: TimeSource,
{
    /// Creates a new [`LockIdWorker`] that has not issued any id yet.
    ///
    /// # Example
    /// ```
    /// use std::sync::Arc;
    /// use idworker::{IdGenerator, LockIdWorker, MonotonicClock, TWITTER_EPOCH, WorkerConfig};
    ///
    /// let config = WorkerConfig::new(TWITTER_EPOCH, 2, 3)?;
    /// let generator = Arc::new(LockIdWorker::new(config, MonotonicClock::new()));
    ///
    /// let handle = {
    ///     let generator = Arc::clone(&generator);
    ///     std::thread::spawn(move || generator.next_id())
    /// };
    /// let a = generator.next_id()?;
    /// let b = handle.join().unwrap()?;
    /// assert_ne!(a, b);
    /// # Ok::<(), idworker::Error>(())
    /// ```
    pub fn new(config: WorkerConfig, time: T) -> Self {
        Self::with_state(config, None, time)
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
        Self::with_state(config, Some(last), time)
    }

    fn with_state(config: WorkerConfig, last: Option<SnowflakeId>, time: T) -> Self {
        Self {
            #[cfg(feature = "cache-padded")]
            state: crossbeam_utils::CachePadded::new(Mutex::new(last)),
            #[cfg(not(feature = "cache-padded"))]
            state: Mutex::new(last),
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
    /// - `Err(e)`: the clock moved backwards, cannot be encoded, or the lock
    ///   was poisoned
    ///
    /// # Errors
    ///
    /// See [`IdGenerator::try_poll_id`].
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_poll_id(&self) -> Result<Poll> {
        let mut last = {
            #[cfg(feature = "parking-lot")]
            {
                self.state.lock()
            }
            #[cfg(not(feature = "parking-lot"))]
            {
                self.state.lock()?
            }
        };

        // Read under the lock: a time sampled before acquiring it could be
        // older than an id another thread minted while we waited.
        let now = self.time.current_millis();

        match advance(&self.config, *last, now)? {
            Step::Mint(id) => {
                *last = Some(id);
                Ok(Poll::Ready { id })
            }
            Step::Exhausted => Ok(Poll::Pending { yield_for: 1 }),
        }
    }
}

impl<T> IdGenerator for LockIdWorker<T>
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
