//! Background interval poller.
//!
//! # Responsibility
//! - Drive the auto-miss check on a fixed cadence, independent of any UI.
//!
//! # Invariants
//! - The tick closure runs once immediately on spawn, then per interval.
//! - `stop` signals the thread and joins it; dropping the handle does the
//!   same.

use log::info;
use std::sync::mpsc::{channel, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

/// Handle to a running poller thread.
pub struct Poller {
    stop: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    /// Spawns a thread invoking `tick` now and then every `interval`.
    pub fn spawn(interval: Duration, mut tick: impl FnMut() + Send + 'static) -> Self {
        let (stop, stop_signal) = channel::<()>();
        let handle = std::thread::spawn(move || {
            info!(
                "event=poller_start module=worker status=ok interval_s={}",
                interval.as_secs()
            );
            loop {
                tick();
                match stop_signal.recv_timeout(interval) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {}
                }
            }
            info!("event=poller_stop module=worker status=ok");
        });

        Self {
            stop,
            handle: Some(handle),
        }
    }

    /// Signals the thread to stop and waits for it to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let _ = self.stop.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn ticks_immediately_and_stops_on_request() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);

        let poller = Poller::spawn(Duration::from_secs(60), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        // The first tick happens before the first interval wait.
        std::thread::sleep(Duration::from_millis(50));
        poller.stop();

        assert_eq!(ticks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn repeats_on_interval() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);

        let poller = Poller::spawn(Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        std::thread::sleep(Duration::from_millis(100));
        poller.stop();

        assert!(ticks.load(Ordering::SeqCst) >= 2);
    }
}
