//! Debounced input.
//!
//! A value only settles once no new input has arrived for the configured
//! delay; intermediate values are overwritten and never emitted.

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    settled: T,
    pending: Option<(T, Instant)>,
}

impl<T: Clone + PartialEq> Debouncer<T> {
    pub fn new(initial: T, delay: Duration) -> Self {
        Self {
            delay,
            settled: initial,
            pending: None,
        }
    }

    /// Record new input, restarting the delay
    pub fn input(&mut self, value: T) {
        self.pending = Some((value, Instant::now()));
    }

    /// Latest input, settled or not
    pub fn current(&self) -> &T {
        self.pending.as_ref().map(|(v, _)| v).unwrap_or(&self.settled)
    }

    /// Last settled value
    pub fn value(&self) -> &T {
        &self.settled
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Settle the pending input if its delay has elapsed.
    ///
    /// Returns the new value only when it differs from the previous one.
    pub fn poll(&mut self) -> Option<T> {
        let ready = matches!(&self.pending, Some((_, at)) if at.elapsed() >= self.delay);
        if !ready {
            return None;
        }
        let (value, _) = self.pending.take()?;
        if value == self.settled {
            return None;
        }
        self.settled = value.clone();
        Some(value)
    }

    /// Wait until the pending input settles
    pub async fn settle(&mut self) -> Option<T> {
        let deadline = self.pending.as_ref().map(|(_, at)| *at + self.delay)?;
        tokio::time::sleep_until(deadline).await;
        self.poll()
    }
}
