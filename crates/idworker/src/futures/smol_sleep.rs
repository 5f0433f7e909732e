use core::{future::Future, time::Duration};

use super::SleepProvider;

/// An implementation of [`SleepProvider`] using Smol's timer.
pub struct SmolSleep;

impl SleepProvider for SmolSleep {
    fn sleep_for(dur: Duration) -> impl Future<Output = ()> + Send {
        async move {
            smol::Timer::after(dur).await;
        }
    }
}

/// An implementation of [`SleepProvider`] using Smol's yield.
pub struct SmolYield;

impl SleepProvider for SmolYield {
    fn sleep_for(_dur: Duration) -> impl Future<Output = ()> + Send {
        smol::future::yield_now()
    }
}
