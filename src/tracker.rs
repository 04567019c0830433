//! Elapsed-time tracker
//!
//! A restartable stopwatch counting whole ticks. The ticking runs as its own
//! tokio task and publishes the count through a `watch` channel, so readers
//! never depend on the job's suspension points.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Restartable stopwatch
#[derive(Debug)]
pub struct ElapsedTracker {
    period: Duration,
    count: Arc<watch::Sender<u64>>,
    /// Bumped whenever a ticker is replaced or stopped. An aborted ticker can
    /// still be mid-tick on another worker; it only counts while its
    /// generation is current.
    generation: Arc<AtomicU64>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl ElapsedTracker {
    /// Tracker ticking once per `period`
    pub fn new(period: Duration) -> Self {
        let (count, _) = watch::channel(0);
        Self {
            period,
            count: Arc::new(count),
            generation: Arc::new(AtomicU64::new(0)),
            ticker: Mutex::new(None),
        }
    }

    /// Start counting. Any ticker left over from an earlier start is stopped
    /// first so there is never more than one source of increments.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut ticker = self.ticker.lock();
        if let Some(handle) = ticker.take() {
            handle.abort();
        }
        let mine = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let period = self.period;
        let count = Arc::clone(&self.count);
        let generation = Arc::clone(&self.generation);
        *ticker = Some(tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                tick(&count, &generation, mine);
            }
        }));
    }

    /// Stop counting and keep the current value
    pub fn pause(&self) {
        let mut ticker = self.ticker.lock();
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = ticker.take() {
            handle.abort();
        }
    }

    /// Stop counting and go back to zero
    pub fn reset(&self) {
        self.pause();
        self.count.send_if_modified(|n| {
            let changed = *n != 0;
            *n = 0;
            changed
        });
    }

    pub fn count(&self) -> u64 {
        *self.count.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.ticker.lock().is_some()
    }

    /// Observe every change of the count
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.count.subscribe()
    }
}

/// Add one to the count unless the ticker `mine` has been superseded. The
/// check runs under the channel's write lock, so it is ordered against the
/// zeroing in `reset`.
fn tick(count: &watch::Sender<u64>, generation: &AtomicU64, mine: u64) -> bool {
    count.send_if_modified(|n| {
        if generation.load(Ordering::SeqCst) != mine {
            return false;
        }
        *n += 1;
        true
    })
}

impl Default for ElapsedTracker {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl Drop for ElapsedTracker {
    fn drop(&mut self) {
        self.pause();
    }
}
