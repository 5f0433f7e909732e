use core::{future::Future, time::Duration};

/// A trait that abstracts over how to sleep for a given [`Duration`] in async
/// contexts.
///
/// This allows the generator to be generic over runtimes like `Tokio` or
/// `Smol`.
pub trait SleepProvider {
    /// Waits for `dur`, or at least gives other tasks a chance to run.
    fn sleep_for(dur: Duration) -> impl Future<Output = ()> + Send;
}
