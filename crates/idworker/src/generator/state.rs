use core::cmp::Ordering;

use crate::{Error, Result, SnowflakeId, WorkerConfig};

/// What a generator should do with its state after reading the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// Store and return this id.
    Mint(SnowflakeId),
    /// The sequence for this millisecond is used up; leave state as is.
    Exhausted,
}

/// Decides the next state of a generator whose last issued id is `last`
/// (`None` before the first id) when the clock reads `now_ms`.
///
/// Pure: errors and [`Step::Exhausted`] imply the caller keeps its state.
#[inline]
pub(crate) fn advance(
    config: &WorkerConfig,
    last: Option<SnowflakeId>,
    now_ms: u64,
) -> Result<Step> {
    let epoch_ms = config.epoch_millis();

    if let Some(last) = last {
        let last_ms = last.timestamp_millis(epoch_ms);
        if now_ms < last_ms {
            return Err(cold_clock_behind(now_ms, last_ms));
        }
    }

    let Some(elapsed_ms) = now_ms.checked_sub(epoch_ms) else {
        return Err(Error::ClockBeforeEpoch { now_ms, epoch_ms });
    };
    if elapsed_ms > SnowflakeId::max_timestamp() {
        return Err(Error::TimestampOverflow { elapsed_ms });
    }

    let Some(last) = last else {
        return Ok(Step::Mint(config.first_id_at(elapsed_ms)));
    };

    match elapsed_ms.cmp(&last.timestamp()) {
        Ordering::Equal => {
            if last.has_sequence_room() {
                Ok(Step::Mint(last.increment_sequence()))
            } else {
                Ok(Step::Exhausted)
            }
        }
        Ordering::Greater => Ok(Step::Mint(last.rollover_to_timestamp(elapsed_ms))),
        // Rejected above.
        Ordering::Less => Err(cold_clock_behind(now_ms, last.timestamp_millis(epoch_ms))),
    }
}

#[cold]
#[inline(never)]
fn cold_clock_behind(now_ms: u64, last_ms: u64) -> Error {
    let skew_ms = last_ms - now_ms;
    #[cfg(feature = "tracing")]
    tracing::warn!(skew_ms, now_ms, last_ms, "clock moved backwards");
    Error::ClockRolledBack { skew_ms }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;

    fn config() -> WorkerConfig {
        WorkerConfig::new(Duration::from_millis(1_000), 3, 5).unwrap()
    }

    #[test]
    fn first_call_starts_at_sequence_zero() {
        let step = advance(&config(), None, 1_042).unwrap();
        let Step::Mint(id) = step else {
            panic!("expected an id, got {step:?}");
        };
        assert_eq!(id.timestamp(), 42);
        assert_eq!(id.sequence(), 0);
        assert_eq!(id.worker_id(), 3);
        assert_eq!(id.datacenter_id(), 5);
    }

    #[test]
    fn first_call_at_the_epoch_itself() {
        let step = advance(&config(), None, 1_000).unwrap();
        assert_eq!(step, Step::Mint(config().first_id_at(0)));
    }

    #[test]
    fn same_millisecond_increments() {
        let last = config().first_id_at(42);
        let step = advance(&config(), Some(last), 1_042).unwrap();
        assert_eq!(step, Step::Mint(last.increment_sequence()));
    }

    #[test]
    fn exhausted_sequence_waits() {
        let last = SnowflakeId::from_components(42, 5, 3, SnowflakeId::max_sequence());
        assert_eq!(advance(&config(), Some(last), 1_042).unwrap(), Step::Exhausted);
    }

    #[test]
    fn later_millisecond_resets_sequence() {
        let last = SnowflakeId::from_components(42, 5, 3, 17);
        let step = advance(&config(), Some(last), 1_050).unwrap();
        assert_eq!(step, Step::Mint(config().first_id_at(50)));
    }

    #[test]
    fn backwards_clock_reports_skew() {
        let last = config().first_id_at(42);
        let err = advance(&config(), Some(last), 1_030).unwrap_err();
        assert_eq!(err, Error::ClockRolledBack { skew_ms: 12 });
    }

    #[test]
    fn backwards_past_the_epoch_is_still_a_rollback() {
        let last = config().first_id_at(42);
        let err = advance(&config(), Some(last), 500).unwrap_err();
        assert_eq!(err, Error::ClockRolledBack { skew_ms: 542 });
    }

    #[test]
    fn clock_before_epoch() {
        let err = advance(&config(), None, 999).unwrap_err();
        assert_eq!(
            err,
            Error::ClockBeforeEpoch {
                now_ms: 999,
                epoch_ms: 1_000
            }
        );
    }

    #[test]
    fn timestamp_field_exhausted() {
        let now = 1_000 + SnowflakeId::max_timestamp() + 1;
        let err = advance(&config(), None, now).unwrap_err();
        assert_eq!(
            err,
            Error::TimestampOverflow {
                elapsed_ms: SnowflakeId::max_timestamp() + 1
            }
        );

        let last_usable = 1_000 + SnowflakeId::max_timestamp();
        assert!(advance(&config(), None, last_usable).is_ok());
    }
}
