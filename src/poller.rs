//! Fixed-interval background polling with explicit start/stop.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Default interval between build status fetches.
pub const BUILD_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// A running poll loop. Dropping the handle stops the loop.
#[derive(Debug)]
pub struct PollHandle {
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Run `callback` immediately and then every `interval` until stopped.
///
/// A slow callback delays the next tick rather than stacking calls.
pub fn start_polling<F, Fut>(interval: Duration, mut callback: F) -> PollHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            callback().await;
        }
    });
    PollHandle { task }
}

pub fn stop(handle: PollHandle) {
    handle.stop();
}
