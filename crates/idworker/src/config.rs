use core::time::Duration;

use crate::{Error, Result, SnowflakeId};

/// The immutable identity of one generator instance.
///
/// Holds the deployment-wide epoch plus the `(datacenter, worker)` pair that
/// distinguishes this instance from every other live one. Uniqueness of the
/// pair across instances is an operational contract; only the ranges are
/// checked here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorkerConfig {
    epoch_ms: u64,
    worker_id: u64,
    datacenter_id: u64,
}

impl WorkerConfig {
    /// Validates and freezes a generator identity.
    ///
    /// `worker_id` and `datacenter_id` are signed so that negative values read
    /// from the outside world are rejected here rather than wrapped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if either id falls outside
    /// `0..=31`, or if `epoch` does not fit in 64-bit milliseconds.
    ///
    /// # Example
    ///
    /// ```
    /// use idworker::{Error, TWITTER_EPOCH, WorkerConfig};
    ///
    /// assert!(WorkerConfig::new(TWITTER_EPOCH, 31, 31).is_ok());
    /// assert!(matches!(
    ///     WorkerConfig::new(TWITTER_EPOCH, 32, 0),
    ///     Err(Error::Configuration { field: "worker_id", .. })
    /// ));
    /// ```
    pub fn new(epoch: Duration, worker_id: i64, datacenter_id: i64) -> Result<Self> {
        let epoch_ms = u64::try_from(epoch.as_millis()).map_err(|_| Error::Configuration {
            field: "epoch",
            reason: format!("{}ms does not fit in 64 bits", epoch.as_millis()),
        })?;
        let worker_id = check_range("worker_id", worker_id, SnowflakeId::max_worker_id())?;
        let datacenter_id = check_range(
            "datacenter_id",
            datacenter_id,
            SnowflakeId::max_datacenter_id(),
        )?;

        Ok(Self {
            epoch_ms,
            worker_id,
            datacenter_id,
        })
    }

    /// The epoch, in milliseconds since 1970-01-01 UTC.
    pub const fn epoch_millis(&self) -> u64 {
        self.epoch_ms
    }

    pub const fn worker_id(&self) -> u64 {
        self.worker_id
    }

    pub const fn datacenter_id(&self) -> u64 {
        self.datacenter_id
    }

    /// The first id this identity could mint at `timestamp` (ms since epoch).
    pub(crate) const fn first_id_at(&self, timestamp: u64) -> SnowflakeId {
        SnowflakeId::from_components(timestamp, self.datacenter_id, self.worker_id, 0)
    }
}

fn check_range(field: &'static str, value: i64, max: u64) -> Result<u64> {
    match u64::try_from(value) {
        Ok(v) if v <= max => Ok(v),
        _ => Err(Error::Configuration {
            field,
            reason: format!("{value} is outside 0..={max}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TWITTER_EPOCH;

    #[test]
    fn accepts_the_full_range() {
        let config = WorkerConfig::new(TWITTER_EPOCH, 31, 31).unwrap();
        assert_eq!(config.worker_id(), 31);
        assert_eq!(config.datacenter_id(), 31);
        assert_eq!(config.epoch_millis(), 1_288_834_974_657);

        let config = WorkerConfig::new(TWITTER_EPOCH, 0, 0).unwrap();
        assert_eq!(config.worker_id(), 0);
        assert_eq!(config.datacenter_id(), 0);
    }

    #[test]
    fn rejects_worker_id_one_past_max() {
        let err = WorkerConfig::new(TWITTER_EPOCH, 32, 0).unwrap_err();
        assert_eq!(
            err,
            Error::Configuration {
                field: "worker_id",
                reason: String::from("32 is outside 0..=31"),
            }
        );
    }

    #[test]
    fn rejects_negative_datacenter_id() {
        let err = WorkerConfig::new(TWITTER_EPOCH, 0, -1).unwrap_err();
        assert!(matches!(
            err,
            Error::Configuration {
                field: "datacenter_id",
                ..
            }
        ));
        assert!(!err.is_retryable());
    }

    #[test]
    fn rejects_epoch_wider_than_u64_millis() {
        let epoch = Duration::from_secs(u64::MAX);
        let err = WorkerConfig::new(epoch, 0, 0).unwrap_err();
        assert!(matches!(err, Error::Configuration { field: "epoch", .. }));
    }

    #[test]
    fn first_id_carries_identity() {
        let config = WorkerConfig::new(TWITTER_EPOCH, 4, 9).unwrap();
        let id = config.first_id_at(77);
        assert_eq!(id.timestamp(), 77);
        assert_eq!(id.worker_id(), 4);
        assert_eq!(id.datacenter_id(), 9);
        assert_eq!(id.sequence(), 0);
    }
}
