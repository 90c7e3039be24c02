//! Cancellable, time-bounded background operations polled from the ui loop.
//!
//! The mock login and the chat assistant resolve through [`Deferred::after`],
//! which only sleeps. A real backend call can be dropped in with
//! [`Deferred::spawn`] without the callers changing.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, TryRecvError, bounded};
use tracing::{debug, trace};

const SLEEP_SLICE: Duration = Duration::from_millis(10);

#[derive(Debug, PartialEq)]
pub enum Poll<T> {
    Pending,
    Ready(T),
    TimedOut,
    Cancelled,
    /// The worker went away without a result.
    Failed,
}

/// Handed to the worker so it can stop early.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Sleeps for `duration`, waking early on cancellation. Returns false if
    /// cancelled.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        while !self.is_cancelled() {
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep(SLEEP_SLICE.min(deadline - now));
        }
        false
    }
}

pub struct Deferred<T> {
    rx: Receiver<T>,
    token: CancelToken,
    started: Instant,
    timeout: Duration,
}

impl<T: Send + 'static> Deferred<T> {
    /// Runs `work` on a worker thread. Returning `None` means the work gave up,
    /// which is reported as `Failed` (or `Cancelled` if it was cancelled).
    pub fn spawn<F>(timeout: Duration, work: F) -> Self
    where
        F: FnOnce(&CancelToken) -> Option<T> + Send + 'static,
    {
        let (tx, rx) = bounded(1);
        let token = CancelToken::default();
        let worker_token = token.clone();
        thread::spawn(move || {
            if let Some(value) = work(&worker_token) {
                // the receiver may be gone already, nothing to do then
                let _ = tx.send(value);
            }
        });
        Self {
            rx,
            token,
            started: Instant::now(),
            timeout,
        }
    }

    /// Resolves to `value` after `delay`.
    pub fn after(delay: Duration, timeout: Duration, value: T) -> Self {
        trace!("Deferred value in {}ms", delay.as_millis());
        Self::spawn(timeout, move |token| token.sleep(delay).then_some(value))
    }

    /// Non-blocking. A handle that returned anything but `Pending` is spent
    /// and should be dropped.
    pub fn poll(&mut self) -> Poll<T> {
        if self.token.is_cancelled() {
            return Poll::Cancelled;
        }
        match self.rx.try_recv() {
            Ok(value) => Poll::Ready(value),
            Err(TryRecvError::Empty) if self.started.elapsed() >= self.timeout => {
                debug!("Deferred operation timed out after {}ms", self.timeout.as_millis());
                self.token.cancel();
                Poll::TimedOut
            }
            Err(TryRecvError::Empty) => Poll::Pending,
            Err(TryRecvError::Disconnected) => Poll::Failed,
        }
    }

    pub fn cancel(&mut self) {
        self.token.cancel();
    }

    #[cfg(test)]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl<T> Drop for Deferred<T> {
    fn drop(&mut self) {
        // stop a sleeping worker nobody is waiting for
        self.token.cancel();
    }
}
