use std::{
    io::Write,
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    thread,
    time::Duration,
};

use anyhow::{Context, anyhow};
use idworker::{Error, IdGenerator, SnowflakeId};

use crate::config::DriverConfig;

/// Mints IDs from `generator` on `config.threads` threads until
/// `config.count` IDs have been issued (or forever when unset), writing every
/// `config.report_every`-th one to `out` as `"{i}th id: {id}"`.
///
/// The first error from any thread stops every thread and is returned.
/// Returns the number of IDs minted.
pub fn run<G, W>(generator: &G, config: &DriverConfig, out: W) -> anyhow::Result<u64>
where
    G: IdGenerator + Sync,
    W: Write + Send,
{
    let out = Mutex::new(out);
    let next_index = AtomicU64::new(0);
    let minted = AtomicU64::new(0);
    let stop = AtomicBool::new(false);

    thread::scope(|s| {
        let handles: Vec<_> = (0..config.threads)
            .map(|_| {
                s.spawn(|| {
                    let res = mint_loop(generator, config, &next_index, &minted, &stop, &out);
                    if res.is_err() {
                        stop.store(true, Ordering::Relaxed);
                    }
                    res
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().map_err(|_| anyhow!("driver thread panicked"))?)
            .collect::<anyhow::Result<()>>()
    })?;

    out.into_inner()
        .map_err(|_| anyhow!("output lock poisoned"))?
        .flush()?;

    Ok(minted.load(Ordering::Relaxed))
}

fn mint_loop<G, W>(
    generator: &G,
    config: &DriverConfig,
    next_index: &AtomicU64,
    minted: &AtomicU64,
    stop: &AtomicBool,
    out: &Mutex<W>,
) -> anyhow::Result<()>
where
    G: IdGenerator,
    W: Write,
{
    while !stop.load(Ordering::Relaxed) {
        let i = next_index.fetch_add(1, Ordering::Relaxed);
        if config.count.is_some_and(|count| i >= count) {
            break;
        }

        let id = next_id_with_retries(generator, config.max_rollback_retries)?;
        minted.fetch_add(1, Ordering::Relaxed);

        if i % config.report_every == 0 {
            let mut out = out.lock().map_err(|_| anyhow!("output lock poisoned"))?;
            writeln!(out, "{i}th id: {id}")?;
        }
    }
    Ok(())
}

/// Calls [`IdGenerator::next_id`], sleeping out up to `max_retries` clock
/// rollbacks before giving up.
fn next_id_with_retries<G>(generator: &G, max_retries: u32) -> anyhow::Result<SnowflakeId>
where
    G: IdGenerator,
{
    let mut attempt = 0;
    loop {
        match generator.next_id() {
            Ok(id) => return Ok(id),
            Err(Error::ClockRolledBack { skew_ms }) if attempt < max_retries => {
                attempt += 1;
                tracing::warn!(
                    skew_ms,
                    attempt,
                    max_retries,
                    "Clock moved backwards; waiting for it to catch up"
                );
                thread::sleep(Duration::from_millis(skew_ms));
            }
            Err(e) => {
                tracing::error!("Failed to generate id: {e}");
                return Err(e).context("failed to generate id");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClockKind;
    use idworker::{LockIdWorker, MonotonicClock, TWITTER_EPOCH, TimeSource, WorkerConfig};
    use std::collections::{HashSet, VecDeque};

    fn driver_config(count: u64, report_every: u64, threads: usize) -> DriverConfig {
        DriverConfig {
            worker: WorkerConfig::new(TWITTER_EPOCH, 1, 1).unwrap(),
            report_every,
            count: Some(count),
            threads,
            max_rollback_retries: 0,
            clock: ClockKind::Monotonic,
        }
    }

    fn reported_ids(out: &[u8]) -> Vec<(u64, u64)> {
        std::str::from_utf8(out)
            .unwrap()
            .lines()
            .map(|line| {
                let (i, id) = line.split_once("th id: ").unwrap();
                (i.parse().unwrap(), id.parse().unwrap())
            })
            .collect()
    }

    /// Replays scripted readings, then repeats the last one forever.
    struct ScriptedTime {
        readings: Mutex<VecDeque<u64>>,
    }

    impl ScriptedTime {
        fn new(readings: impl IntoIterator<Item = u64>) -> Self {
            Self {
                readings: Mutex::new(readings.into_iter().collect()),
            }
        }
    }

    impl TimeSource for ScriptedTime {
        fn current_millis(&self) -> u64 {
            let mut readings = self.readings.lock().unwrap();
            if readings.len() > 1 {
                readings.pop_front().unwrap()
            } else {
                readings[0]
            }
        }
    }

    #[test]
    fn reports_every_nth_id() {
        let config = driver_config(20_001, 10_000, 1);
        let generator = LockIdWorker::new(config.worker, MonotonicClock::default());
        let mut out = Vec::new();

        let minted = run(&generator, &config, &mut out).unwrap();

        assert_eq!(minted, 20_001);
        let reported = reported_ids(&out);
        let indices: Vec<_> = reported.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, [0, 10_000, 20_000]);
        assert!(reported.windows(2).all(|w| w[0].1 < w[1].1));
    }

    #[test]
    fn shared_generator_issues_unique_ids_across_threads() {
        let config = driver_config(8 * 4096, 1, 4);
        let generator = LockIdWorker::new(config.worker, MonotonicClock::default());
        let mut out = Vec::new();

        let minted = run(&generator, &config, &mut out).unwrap();

        assert_eq!(minted, 8 * 4096);
        let reported = reported_ids(&out);
        assert_eq!(reported.len(), 8 * 4096);
        let unique: HashSet<_> = reported.iter().map(|(_, id)| *id).collect();
        assert_eq!(unique.len(), reported.len());
    }

    #[test]
    fn rollback_fails_fast_without_retry_budget() {
        let config = driver_config(10, 1, 1);
        let worker = WorkerConfig::new(Duration::ZERO, 1, 1).unwrap();
        let generator = LockIdWorker::new(worker, ScriptedTime::new([100, 95]));
        let mut out = Vec::new();

        let err = run(&generator, &config, &mut out).unwrap_err();

        assert_eq!(
            err.downcast_ref::<Error>(),
            Some(&Error::ClockRolledBack { skew_ms: 5 })
        );
        assert_eq!(reported_ids(&out).len(), 1);
    }

    #[test]
    fn rollback_is_retried_within_budget() {
        let mut config = driver_config(3, 1, 1);
        config.max_rollback_retries = 2;
        let worker = WorkerConfig::new(Duration::ZERO, 1, 1).unwrap();
        let generator = LockIdWorker::new(worker, ScriptedTime::new([100, 97, 98, 101]));
        let mut out = Vec::new();

        let minted = run(&generator, &config, &mut out).unwrap();

        assert_eq!(minted, 3);
        let ids: Vec<_> = reported_ids(&out)
            .into_iter()
            .map(|(_, id)| SnowflakeId::from_raw(id))
            .collect();
        assert_eq!(ids[0].timestamp(), 100);
        assert_eq!(ids[1].timestamp(), 101);
        assert_eq!(ids[2].timestamp(), 101);
        assert_eq!(ids[2].sequence(), 1);
    }
}
