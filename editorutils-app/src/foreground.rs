//! Foreground dispatcher
//!
//! Status objects may only be touched from one designated thread. Background
//! work hands results back by posting closures through a [`ForegroundHandle`];
//! the designated thread owns the [`Foreground`] and runs them in FIFO order.

use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError};

/// A unit of work to run on the foreground thread
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Cloneable handle for posting work to the foreground thread
#[derive(Clone)]
pub struct ForegroundHandle {
    tx: Sender<Job>,
}

impl ForegroundHandle {
    /// Queue `job` for the foreground thread.
    ///
    /// Returns false when the foreground has been dropped, in which case the
    /// job is discarded.
    pub fn post(&self, job: impl FnOnce() + Send + 'static) -> bool {
        let posted = self.tx.send(Box::new(job)).is_ok();
        if !posted {
            tracing::debug!("Foreground is gone, dropping posted job");
        }
        posted
    }
}

/// Receiving side, owned by the designated thread
pub struct Foreground {
    rx: Receiver<Job>,
}

impl Foreground {
    pub fn new() -> (ForegroundHandle, Foreground) {
        let (tx, rx) = unbounded();
        (ForegroundHandle { tx }, Foreground { rx })
    }

    /// Run every job that is already queued. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut count = 0;
        loop {
            match self.rx.try_recv() {
                Ok(job) => {
                    job();
                    count += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return count,
            }
        }
    }

    /// Wait up to `timeout` for one job and run it.
    pub fn run_next(&self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(job) => {
                job();
                true
            }
            Err(RecvTimeoutError::Timeout) => false,
            Err(RecvTimeoutError::Disconnected) => {
                // No handle left, nothing can arrive; still honour the wait
                std::thread::sleep(timeout);
                false
            }
        }
    }

    /// Keep running jobs until `done` returns true or `timeout` elapses.
    ///
    /// Without a timeout this waits for as long as it takes. Returns the
    /// final value of `done`.
    pub fn run_until(&self, mut done: impl FnMut() -> bool, timeout: Option<Duration>) -> bool {
        let deadline = timeout.map(|t| Instant::now() + t);
        // Wake up periodically so `done` is re-checked even when no job arrives
        let tick = Duration::from_millis(50);
        loop {
            if done() {
                return true;
            }
            let wait = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return done();
                    }
                    (deadline - now).min(tick)
                }
                None => tick,
            };
            self.run_next(wait);
        }
    }
}
