use crate::{
    config::WorkerConfig,
    error::Result,
    generator::Poll,
    id::SnowflakeId,
};

/// A minimal interface for generating Snowflake IDs.
///
/// Implementors only provide [`IdGenerator::try_poll_id`]; the blocking
/// variants loop on it until an id is ready.
pub trait IdGenerator {
    /// The identity encoded into every id this generator produces.
    fn config(&self) -> &WorkerConfig;

    /// Attempts to generate the next available ID without blocking.
    ///
    /// The returned [`Poll`] contains either:
    /// - the newly generated ID, or
    /// - a duration to yield/sleep if the current millisecond is exhausted.
    ///
    /// # Errors
    ///
    /// - [`Error::ClockRolledBack`] if the clock reads earlier than the last
    ///   issued id.
    /// - [`Error::ClockBeforeEpoch`] or [`Error::TimestampOverflow`] if the
    ///   clock cannot be encoded against the epoch.
    /// - [`Error::LockPoisoned`] for lock-based generators.
    ///
    /// None of these change the generator state.
    ///
    /// [`Error::ClockRolledBack`]: crate::Error::ClockRolledBack
    /// [`Error::ClockBeforeEpoch`]: crate::Error::ClockBeforeEpoch
    /// [`Error::TimestampOverflow`]: crate::Error::TimestampOverflow
    /// [`Error::LockPoisoned`]: crate::Error::LockPoisoned
    fn try_poll_id(&self) -> Result<Poll>;

    /// Generates the next ID, calling `f(yield_for)` each time the generator
    /// is pending.
    ///
    /// # Errors
    ///
    /// Returns the first error from [`IdGenerator::try_poll_id`]; clock
    /// errors are never retried here.
    fn next_id_with(&self, mut f: impl FnMut(u64)) -> Result<SnowflakeId>
    where
        Self: Sized,
    {
        loop {
            match self.try_poll_id()? {
                Poll::Ready { id } => break Ok(id),
                Poll::Pending { yield_for } => f(yield_for),
            }
        }
    }

    /// Generates the next ID, busy-waiting for the next millisecond when the
    /// current one is exhausted.
    ///
    /// The wait has no timeout: it ends when the clock advances.
    ///
    /// # Errors
    ///
    /// See [`IdGenerator::try_poll_id`].
    fn next_id(&self) -> Result<SnowflakeId>
    where
        Self: Sized,
    {
        self.next_id_with(|yield_for| {
            if yield_for == 0 {
                core::hint::spin_loop();
            } else {
                std::thread::yield_now();
            }
        })
    }
}
