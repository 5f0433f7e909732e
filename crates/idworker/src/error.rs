/// A result type defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that `idworker` can emit.
///
/// Configuration errors are only produced while building a [`WorkerConfig`]
/// and are never retryable. Clock errors are produced while generating and
/// leave the generator state untouched, so the caller may retry once the
/// clock has caught up.
///
/// [`WorkerConfig`]: crate::WorkerConfig
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A construction parameter is outside the range its bit field allows.
    #[error("invalid {field}: {reason}")]
    Configuration {
        /// The offending parameter (`"worker_id"`, `"datacenter_id"`, or
        /// `"epoch"`).
        field: &'static str,
        /// Human-readable description of the violated bound.
        reason: String,
    },

    /// The wall clock reads earlier than the timestamp of the last issued id.
    ///
    /// Typically caused by an NTP step. No id is produced and no state
    /// changes; retrying after `skew_ms` milliseconds will succeed unless the
    /// clock regresses again.
    #[error("clock moved backwards by {skew_ms}ms; refusing to generate id")]
    ClockRolledBack {
        /// How far (in milliseconds) the clock is behind the last issued id.
        skew_ms: u64,
    },

    /// The wall clock reads earlier than the configured epoch, so no
    /// timestamp can be encoded.
    #[error("clock ({now_ms}ms) is earlier than the epoch ({epoch_ms}ms)")]
    ClockBeforeEpoch {
        /// Observed unix time in milliseconds.
        now_ms: u64,
        /// Configured epoch in unix milliseconds.
        epoch_ms: u64,
    },

    /// More time has passed since the epoch than the 41-bit timestamp field
    /// can hold (roughly 69 years).
    #[error("{elapsed_ms}ms since epoch does not fit the timestamp field")]
    TimestampOverflow {
        /// Milliseconds elapsed since the epoch.
        elapsed_ms: u64,
    },

    /// The generator lock was poisoned by a thread that panicked while
    /// holding it. Not produced with the `parking-lot` feature.
    #[cfg_attr(docsrs, doc(cfg(not(feature = "parking-lot"))))]
    #[cfg(not(feature = "parking-lot"))]
    #[error("generator lock poisoned")]
    LockPoisoned,
}

impl Error {
    /// Returns `true` if the same call may succeed later without any change
    /// of configuration.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ClockRolledBack { .. } | Self::ClockBeforeEpoch { .. }
        )
    }
}

#[cfg(not(feature = "parking-lot"))]
use crate::generator::{MutexGuard, PoisonError};
#[cfg(not(feature = "parking-lot"))]
impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_errors_are_retryable() {
        assert!(Error::ClockRolledBack { skew_ms: 3 }.is_retryable());
        assert!(
            Error::ClockBeforeEpoch {
                now_ms: 1,
                epoch_ms: 2
            }
            .is_retryable()
        );
        assert!(!Error::TimestampOverflow { elapsed_ms: 1 << 41 }.is_retryable());
        assert!(
            !Error::Configuration {
                field: "worker_id",
                reason: String::from("too big"),
            }
            .is_retryable()
        );
    }

    #[test]
    fn rollback_message_carries_skew() {
        let err = Error::ClockRolledBack { skew_ms: 17 };
        assert_eq!(
            err.to_string(),
            "clock moved backwards by 17ms; refusing to generate id"
        );
    }
}
