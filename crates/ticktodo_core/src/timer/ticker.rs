//! Recurring expiry check.
//!
//! # Invariants
//! - Ticks and user mutations are serialized by the store mutex.
//! - The expiry callback runs after the store lock is released.
//! - After `cancel` (or drop) returns, no further tick touches the store.
//! - Ticks are scheduled on a fixed grid from spawn time; sweep duration
//!   does not push later ticks back.

use crate::model::task::TaskId;
use crate::repo::task_repo::TaskRepository;
use crate::service::task_store::SharedTaskStore;
use log::{error, info, warn};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const TICKER_THREAD_NAME: &str = "ticktodo-expiry";

/// Handle to a running periodic expiry sweep.
pub struct ExpiryTicker {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ExpiryTicker {
    /// Starts sweeping `store` every `interval`.
    ///
    /// `on_expired` receives the ids whose timers were disarmed by a tick,
    /// which is the hook a view uses to re-render.
    ///
    /// # Errors
    /// - Returns an error when the worker thread cannot be spawned.
    pub fn spawn<R, F>(
        store: SharedTaskStore<R>,
        interval: Duration,
        mut on_expired: F,
    ) -> std::io::Result<Self>
    where
        R: TaskRepository + Send + 'static,
        F: FnMut(&[TaskId]) + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name(TICKER_THREAD_NAME.to_string())
            .spawn(move || {
                info!(
                    "event=ticker_start module=timer status=ok interval_ms={}",
                    interval.as_millis()
                );
                let mut next_tick = Instant::now() + interval;
                loop {
                    let wait = next_tick.saturating_duration_since(Instant::now());
                    match stop_rx.recv_timeout(wait) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                    next_tick = next_tick_after(next_tick, interval, Instant::now());

                    let swept = match store.lock() {
                        Ok(mut guard) => guard.expire_due(),
                        Err(_) => {
                            error!(
                                "event=ticker_tick module=timer status=error error_code=store_poisoned"
                            );
                            break;
                        }
                    };

                    match swept {
                        Ok(expired) if !expired.is_empty() => on_expired(&expired),
                        Ok(_) => {}
                        Err(err) => warn!(
                            "event=ticker_tick module=timer status=error error_code=expire_failed error={err}"
                        ),
                    }
                }
                info!("event=ticker_stop module=timer status=ok");
            })?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Returns whether the worker thread is still alive.
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stops the sweep and waits for the worker to exit.
    pub fn cancel(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("event=ticker_stop module=timer status=error error_code=worker_panicked");
            }
        }
    }
}

/// Next grid point strictly after `now`; missed ticks are skipped, not replayed.
fn next_tick_after(scheduled: Instant, interval: Duration, now: Instant) -> Instant {
    let mut next = scheduled + interval;
    if next <= now && !interval.is_zero() {
        let behind = now.duration_since(next).as_nanos() / interval.as_nanos();
        let skipped = u32::try_from(behind + 1).unwrap_or(u32::MAX);
        next += interval.saturating_mul(skipped);
    }
    next
}

impl Drop for ExpiryTicker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
