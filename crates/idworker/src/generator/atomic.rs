use portable_atomic::{AtomicU64, Ordering};
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

/// Raw state before the first id. The reserved bit is set, so no generated
/// id can ever equal it.
const IDLE: u64 = u64::MAX;

/// A lock-free Snowflake ID generator suitable for multi-threaded
/// environments.
///
/// The last issued id lives in a single [`AtomicU64`] and is advanced with
/// compare-and-swap. A caller that loses the race gets
/// [`Poll::Pending`] with `yield_for: 0` and simply polls again.
///
/// ## Features
/// - ✅ Thread-safe
/// - ✅ No lock on the hot path
///
/// ## Recommended When
/// - You're in a multi-threaded environment with light contention
/// - Your target supports 64-bit atomics
///
/// ## Caveats
/// - Not fair: a thread can lose the race repeatedly under heavy contention
///
/// ## See Also
/// - [`BasicIdWorker`]
/// - [`LockIdWorker`]
///
/// [`BasicIdWorker`]: crate::generator::BasicIdWorker
/// [`LockIdWorker`]: crate::generator::LockIdWorker
pub struct AtomicIdWorker<T>
where
    T: TimeSource,
{
    #[cfg(feature = "cache-padded")]
    pub(crate) state: crossbeam_utils::CachePadded<AtomicU64>,
    #[cfg(not(feature = "cache-padded"))]
    pub(crate) state: AtomicU64,
    config: WorkerConfig,
    time: T,
}

impl<T> AtomicIdWorker<T>
where
    T: TimeSource,
{
    /// Creates a new [`AtomicIdWorker`] that has not issued any id yet.
    ///
    /// # Example
    /// ```
    /// use idworker::{AtomicIdWorker, IdGenerator, MonotonicClock, TWITTER_EPOCH, WorkerConfig};
    ///
    /// let config = WorkerConfig::new(TWITTER_EPOCH, 0, 7)?;
    /// let generator = AtomicIdWorker::new(config, MonotonicClock::new());
    ///
    /// let id = generator.next_id()?;
    /// assert_eq!(id.datacenter_id(), 7);
    /// # Ok::<(), idworker::Error>(())
    /// ```
    pub fn new(config: WorkerConfig, time: T) -> Self {
        Self::with_raw(config, IDLE, time)
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
        Self::with_raw(config, last.to_raw(), time)
    }

    fn with_raw(config: WorkerConfig, raw: u64, time: T) -> Self {
        Self {
            #[cfg(feature = "cache-padded")]
            state: crossbeam_utils::CachePadded::new(AtomicU64::new(raw)),
            #[cfg(not(feature = "cache-padded"))]
            state: AtomicU64::new(raw),
            config,
            time,
        }
    }

    /// A fallible, non-blocking attempt to generate the next ID.
    ///
    /// # Returns
    /// - `Ok(Poll::Ready { id })`: A new ID is available
    /// - `Ok(Poll::Pending { yield_for })`: The time to wait (in
    ///   milliseconds) before trying again; `0` after a lost race
    /// - `Err(e)`: the clock moved backwards or cannot be encoded
    ///
    /// # Errors
    ///
    /// See [`IdGenerator::try_poll_id`].
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_poll_id(&self) -> Result<Poll> {
        // Load before reading the clock so `now` is never older than the id
        // we compare it against.
        let current_raw = self.state.load(Ordering::Acquire);
        let now = self.time.current_millis();

        let last = (current_raw != IDLE).then(|| SnowflakeId::from_raw(current_raw));
        let next_id = match advance(&self.config, last, now)? {
            Step::Mint(id) => id,
            Step::Exhausted => return Ok(Poll::Pending { yield_for: 1 }),
        };

        if self
            .state
            .compare_exchange(
                current_raw,
                next_id.to_raw(),
                Ordering::AcqRel,
                Ordering::Relaxed,
            )
            .is_ok()
        {
            Ok(Poll::Ready { id: next_id })
        } else {
            // Another thread won the race. Retry immediately.
            Ok(Poll::Pending { yield_for: 0 })
        }
    }
}

impl<T> IdGenerator for AtomicIdWorker<T>
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
