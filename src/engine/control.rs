use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{after, bounded, select, Sender};

use crate::core::config::MAX_DELAY_MS;

/// Cooperative cancellation flag shared between the controller and a run.
/// Solvers poll it at frontier pops and generation boundaries.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Re-arms the token. Called by the controller before queueing a new run.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Cancels the token once `timeout` elapses, unless the returned guard
    /// is dropped first.
    pub fn cancel_after(&self, timeout: Duration) -> Deadline {
        let (disarm, disarmed) = bounded::<()>(0);
        let token = self.clone();
        let timer = thread::spawn(move || {
            select! {
                recv(disarmed) -> _ => {}
                recv(after(timeout)) -> _ => token.cancel(),
            }
        });
        Deadline { disarm: Some(disarm), timer: Some(timer) }
    }
}

/// Armed timeout for a single run. Dropping it stops the timer thread and
/// waits for it, so it can never fire into a later run.
#[derive(Debug)]
pub struct Deadline {
    disarm: Option<Sender<()>>,
    timer: Option<JoinHandle<()>>,
}

impl Drop for Deadline {
    fn drop(&mut self) {
        // Disconnecting the channel wakes the timer
        self.disarm.take();
        if let Some(timer) = self.timer.take() {
            let _ = timer.join();
        }
    }
}

/// Animation delay, retunable while a run is in flight.
#[derive(Debug, Clone, Default)]
pub struct Pacing(Arc<AtomicU64>);

impl Pacing {
    pub fn new(delay_ms: u64) -> Self {
        Self(Arc::new(AtomicU64::new(delay_ms.min(MAX_DELAY_MS))))
    }

    pub fn set(&self, delay_ms: u64) {
        self.0.store(delay_ms.min(MAX_DELAY_MS), Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.get())
    }
}
