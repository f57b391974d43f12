//! Concurrent tick delivery
//!
//! Ticks are pushed onto a bounded `flume` channel and drained by a pool of
//! worker threads that all call into the same handler.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use tracing::{debug, error, warn};

use crate::core::{Result, Tick, TickHandler};

const CHANNEL_CAPACITY: usize = 1024;

/// Counters from one feed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    /// Ticks handed to the handler
    pub delivered: usize,
    /// Ticks the handler rejected as malformed
    pub rejected: usize,
    /// Ticks the handler failed on for any other reason
    pub failed: usize,
    /// Lines that never decoded into a tick
    pub undecodable: usize,
}

/// Deliver `ticks` to `handler` from `workers` threads and wait for all of
/// them to finish. Decode errors and handler errors are logged and counted,
/// with malformed-input rejections kept apart from other failures.
pub fn run_feed<I>(handler: Arc<dyn TickHandler>, ticks: I, workers: usize) -> FeedStats
where
    I: IntoIterator<Item = Result<Tick>>,
{
    let (tx, rx) = flume::bounded::<Tick>(CHANNEL_CAPACITY);
    let delivered = Arc::new(AtomicUsize::new(0));
    let rejected = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let mut undecodable = 0;

    thread::scope(|scope| {
        for worker in 0..workers.max(1) {
            let rx = rx.clone();
            let handler = Arc::clone(&handler);
            let delivered = Arc::clone(&delivered);
            let rejected = Arc::clone(&rejected);
            let failed = Arc::clone(&failed);
            scope.spawn(move || {
                for tick in rx.iter() {
                    delivered.fetch_add(1, Ordering::Relaxed);
                    match handler.respond(&tick) {
                        Ok(()) => {}
                        Err(e) if e.is_validation() => {
                            rejected.fetch_add(1, Ordering::Relaxed);
                            warn!(worker, "Rejected tick {}: {}", tick, e);
                        }
                        Err(e) => {
                            failed.fetch_add(1, Ordering::Relaxed);
                            error!(worker, "Handler failed on tick {}: {}", tick, e);
                        }
                    }
                }
                debug!(worker, "Feed worker done");
            });
        }
        drop(rx);

        for tick in ticks {
            match tick {
                Ok(tick) => {
                    if tx.send(tick).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    undecodable += 1;
                    warn!("Skipping undecodable tick: {}", e);
                }
            }
        }
        drop(tx);
    });

    FeedStats {
        delivered: delivered.load(Ordering::Relaxed),
        rejected: rejected.load(Ordering::Relaxed),
        failed: failed.load(Ordering::Relaxed),
        undecodable,
    }
}
