use crate::SnowflakeId;

/// The outcome of one non-blocking generation attempt.
///
/// - [`Poll::Ready`] carries a freshly minted id.
/// - [`Poll::Pending`] means the 4096 ids of the current millisecond are used
///   up (or a lock-free update lost a race). Retry after `yield_for`
///   milliseconds; `0` means retry immediately.
///
/// # Example
///
/// ```
/// use idworker::{BasicIdWorker, IdGenerator, Poll, TimeSource, WorkerConfig};
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1
///     }
/// }
///
/// let config = WorkerConfig::new(core::time::Duration::ZERO, 0, 0)?;
/// let generator = BasicIdWorker::from_components(config, 1, 4095, FixedTime);
/// match generator.try_poll_id()? {
///     Poll::Ready { id } => println!("ID: {id}"),
///     Poll::Pending { yield_for } => println!("Back off for {yield_for}ms"),
/// }
/// # Ok::<(), idworker::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    /// A unique ID was generated and is ready to use.
    Ready {
        /// The generated Snowflake ID.
        id: SnowflakeId,
    },
    /// No ID could be generated right now.
    Pending {
        /// Milliseconds to wait before polling again.
        yield_for: u64,
    },
}
