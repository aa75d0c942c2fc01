// src/engine/countdown.rs

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Notify;
use tracing::warn;

/// Lock-free counter that releases every waiter when it reaches zero.
///
/// Used both as a node's prerequisite counter and as the run's global
/// completion signal.
#[derive(Debug)]
pub struct Countdown {
    remaining: AtomicUsize,
    zero: Notify,
}

impl Countdown {
    pub fn new(count: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(count),
            zero: Notify::new(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }

    /// Decrement by one. Returns `true` for the call that hit zero.
    ///
    /// Decrementing an exhausted counter is a no-op.
    pub fn count_down(&self) -> bool {
        match self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
        {
            Ok(1) => {
                self.zero.notify_waiters();
                true
            }
            Ok(_) => false,
            Err(_) => {
                warn!("countdown decremented below zero; ignoring");
                false
            }
        }
    }

    /// Wait until the counter reaches zero.
    pub async fn wait(&self) {
        loop {
            let notified = self.zero.notified();
            tokio::pin!(notified);
            // Register before re-checking so a concurrent notify_waiters
            // between the load and the await is not lost.
            notified.as_mut().enable();
            if self.remaining() == 0 {
                return;
            }
            notified.await;
        }
    }
}

