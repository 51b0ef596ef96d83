//! The repeating encounter timer.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::debug;

/// At most one running schedule. Starting again replaces the previous one;
/// stopping or dropping cancels it.
#[derive(Debug, Default)]
pub struct Ticker {
    running: Option<(Sender<()>, JoinHandle<()>)>,
}

impl Ticker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.running.is_some()
    }

    /// Call `on_tick` every `period` on a background thread until stopped.
    pub fn start(&mut self, period: Duration, mut on_tick: impl FnMut() + Send + 'static) {
        self.stop();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = thread::spawn(move || loop {
            match stop_rx.recv_timeout(period) {
                Err(RecvTimeoutError::Timeout) => on_tick(),
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });
        debug!(?period, "ticker started");
        self.running = Some((stop_tx, handle));
    }

    /// Cancel the schedule and wait for the thread to finish its last tick.
    pub fn stop(&mut self) {
        if let Some((stop_tx, handle)) = self.running.take() {
            let _ = stop_tx.send(());
            let _ = handle.join();
            debug!("ticker stopped");
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}
