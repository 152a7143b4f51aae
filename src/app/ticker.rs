use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Background thread that emits one message per interval. Dropping the
/// ticker stops and joins the thread, so an abandoned timer never keeps
/// firing.
pub(crate) struct Ticker {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    rx: Receiver<()>,
}

impl Ticker {
    pub(crate) fn every(interval: Duration) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            let mut next = Instant::now() + interval;
            while !stop_flag.load(Ordering::SeqCst) {
                let now = Instant::now();
                if now < next {
                    thread::park_timeout(next - now);
                    continue;
                }
                if tx.send(()).is_err() {
                    break;
                }
                next += interval;
            }
        });

        Self {
            stop,
            handle: Some(handle),
            rx,
        }
    }

    /// Number of ticks that arrived since the last call, without blocking.
    pub(crate) fn drain(&self) -> usize {
        self.rx.try_iter().count()
    }

    /// Blocks for at most `timeout` waiting for the next tick.
    pub(crate) fn wait(&self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(()) => true,
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => false,
        }
    }

    pub(crate) fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.thread().unpark();
            let _ = handle.join();
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_ticks_until_stopped() {
        let mut ticker = Ticker::every(Duration::from_millis(5));
        assert!(ticker.wait(Duration::from_secs(1)));

        ticker.stop();
        assert!(ticker.handle.is_none());
        ticker.drain();
        assert!(!ticker.wait(Duration::from_millis(30)));
    }

    #[test]
    fn drain_counts_pending_ticks() {
        let ticker = Ticker::every(Duration::from_millis(2));
        thread::sleep(Duration::from_millis(40));
        assert!(ticker.drain() >= 1);
    }

    #[test]
    fn stop_returns_promptly_for_long_intervals() {
        let started = Instant::now();
        let mut ticker = Ticker::every(Duration::from_secs(60));
        ticker.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
