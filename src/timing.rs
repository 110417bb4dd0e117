// SPDX-License-Identifier: GPL-3.0-only

//! Timer utilities driving deferred work.
//!
//! Every timer owns at most one tokio task and delivers its events through a
//! `futures` unbounded channel, so the session loop sees them alongside page
//! and host input. Cancelling aborts the task; dropping a timer cancels it.
//!
//! - [`Debounce`]: fires once, a fixed delay after the last trigger.
//! - [`Throttle`]: fires on the leading trigger, then at most once more per
//!   interval with the latest event.
//! - [`RepeatOnHold`]: fires after an initial delay, then on every interval
//!   until stopped.

use futures::channel::mpsc::UnboundedSender;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

fn deliver<T>(tx: &UnboundedSender<T>, event: T) {
    if tx.unbounded_send(event).is_err() {
        tracing::debug!("Timer fired after its receiver closed");
    }
}

fn abort(task: &mut Option<JoinHandle<()>>) {
    if let Some(task) = task.take() {
        task.abort();
    }
}

fn is_running(task: &Option<JoinHandle<()>>) -> bool {
    task.as_ref().is_some_and(|task| !task.is_finished())
}

// ============================================================================
// Debounce
// ============================================================================

/// Coalesces bursts into one event delivered after the burst settles.
#[derive(Debug)]
pub struct Debounce<T> {
    delay: Duration,
    tx: UnboundedSender<T>,
    task: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Debounce<T> {
    #[must_use]
    pub fn new(delay: Duration, tx: UnboundedSender<T>) -> Self {
        Self {
            delay,
            tx,
            task: None,
        }
    }

    /// Restarts the delay; only the latest event is delivered.
    pub fn trigger(&mut self, event: T) {
        abort(&mut self.task);
        let tx = self.tx.clone();
        let delay = self.delay;
        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            deliver(&tx, event);
        }));
    }

    pub fn cancel(&mut self) {
        abort(&mut self.task);
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        is_running(&self.task)
    }
}

impl<T> Drop for Debounce<T> {
    fn drop(&mut self) {
        abort(&mut self.task);
    }
}

// ============================================================================
// Throttle
// ============================================================================

/// Rate-limits events to one per interval, keeping a trailing call.
#[derive(Debug)]
pub struct Throttle<T> {
    interval: Duration,
    tx: UnboundedSender<T>,
    /// Earliest time the next immediate delivery may happen
    next_allowed: Option<Instant>,
    trailing: Option<(Instant, JoinHandle<()>)>,
}

impl<T: Send + 'static> Throttle<T> {
    #[must_use]
    pub fn new(interval: Duration, tx: UnboundedSender<T>) -> Self {
        Self {
            interval,
            tx,
            next_allowed: None,
            trailing: None,
        }
    }

    /// Delivers immediately when the interval has passed, otherwise
    /// schedules a trailing delivery at the end of the interval. A trigger
    /// while the trailing call is pending replaces its event.
    pub fn trigger(&mut self, event: T) {
        let now = Instant::now();

        if let Some((at, task)) = self.trailing.take() {
            if !task.is_finished() {
                task.abort();
                self.schedule(at, event);
                return;
            }
        }

        match self.next_allowed {
            Some(at) if now < at => {
                self.schedule(at, event);
                // The trailing call opens a new interval
                self.next_allowed = Some(at + self.interval);
            }
            _ => {
                deliver(&self.tx, event);
                self.next_allowed = Some(now + self.interval);
            }
        }
    }

    fn schedule(&mut self, at: Instant, event: T) {
        let tx = self.tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep_until(at).await;
            deliver(&tx, event);
        });
        self.trailing = Some((at, task));
    }

    /// Drops the trailing call and forgets the last delivery.
    pub fn cancel(&mut self) {
        if let Some((_, task)) = self.trailing.take() {
            task.abort();
        }
        self.next_allowed = None;
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.trailing
            .as_ref()
            .is_some_and(|(_, task)| !task.is_finished())
    }
}

impl<T> Drop for Throttle<T> {
    fn drop(&mut self) {
        if let Some((_, task)) = self.trailing.take() {
            task.abort();
        }
    }
}

// ============================================================================
// RepeatOnHold
// ============================================================================

/// Press-and-hold auto-repeat.
#[derive(Debug)]
pub struct RepeatOnHold<T> {
    delay: Duration,
    interval: Duration,
    tx: UnboundedSender<T>,
    task: Option<JoinHandle<()>>,
}

impl<T: Clone + Send + 'static> RepeatOnHold<T> {
    #[must_use]
    pub fn new(delay: Duration, interval: Duration, tx: UnboundedSender<T>) -> Self {
        Self {
            delay,
            interval,
            tx,
            task: None,
        }
    }

    /// Starts repeating `event`, replacing any running repeat.
    pub fn start(&mut self, event: T) {
        abort(&mut self.task);
        let tx = self.tx.clone();
        let mut ticks = tokio::time::interval_at(Instant::now() + self.delay, self.interval);
        self.task = Some(tokio::spawn(async move {
            loop {
                ticks.tick().await;
                if tx.unbounded_send(event.clone()).is_err() {
                    break;
                }
            }
        }));
    }

    pub fn stop(&mut self) {
        abort(&mut self.task);
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        is_running(&self.task)
    }
}

impl<T> Drop for RepeatOnHold<T> {
    fn drop(&mut self) {
        abort(&mut self.task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::mpsc;
    use tokio::time::sleep;

    fn drain<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> Vec<T> {
        let mut out = Vec::new();
        while let Ok(Some(event)) = rx.try_next() {
            out.push(event);
        }
        out
    }

    const fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// A burst collapses into its last event
    #[tokio::test(start_paused = true)]
    async fn test_debounce_coalesces() {
        let (tx, mut rx) = mpsc::unbounded();
        let mut debounce = Debounce::new(ms(50), tx);

        debounce.trigger(1);
        sleep(ms(20)).await;
        debounce.trigger(2);
        sleep(ms(20)).await;
        debounce.trigger(3);
        assert!(debounce.is_pending());

        sleep(ms(40)).await;
        assert!(drain(&mut rx).is_empty(), "still inside the delay");

        sleep(ms(20)).await;
        assert_eq!(drain(&mut rx), vec![3]);
        assert!(!debounce.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_cancel_and_drop() {
        let (tx, mut rx) = mpsc::unbounded();
        let mut debounce = Debounce::new(ms(50), tx);

        debounce.trigger(1);
        debounce.cancel();
        sleep(ms(80)).await;
        assert!(drain(&mut rx).is_empty());

        debounce.trigger(2);
        drop(debounce);
        sleep(ms(80)).await;
        assert!(drain(&mut rx).is_empty());
    }

    /// Leading call is immediate, the latest throttled call trails
    #[tokio::test(start_paused = true)]
    async fn test_throttle_leading_and_trailing() {
        let (tx, mut rx) = mpsc::unbounded();
        let mut throttle = Throttle::new(ms(100), tx);

        throttle.trigger(1);
        assert_eq!(drain(&mut rx), vec![1]);

        sleep(ms(10)).await;
        throttle.trigger(2);
        sleep(ms(10)).await;
        throttle.trigger(3);
        assert!(throttle.is_pending());
        assert!(drain(&mut rx).is_empty());

        sleep(ms(90)).await;
        assert_eq!(drain(&mut rx), vec![3]);

        // The trailing delivery opened a new interval
        throttle.trigger(4);
        assert!(drain(&mut rx).is_empty());
        sleep(ms(110)).await;
        assert_eq!(drain(&mut rx), vec![4]);

        sleep(ms(200)).await;
        throttle.trigger(5);
        assert_eq!(drain(&mut rx), vec![5]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_cancel() {
        let (tx, mut rx) = mpsc::unbounded();
        let mut throttle = Throttle::new(ms(100), tx);

        throttle.trigger(1);
        throttle.trigger(2);
        throttle.cancel();
        sleep(ms(150)).await;
        assert_eq!(drain(&mut rx), vec![1]);

        throttle.trigger(3);
        assert_eq!(drain(&mut rx), vec![3], "cancel resets the interval");
    }

    /// First repeat after the delay, then one per interval
    #[tokio::test(start_paused = true)]
    async fn test_repeat_on_hold() {
        let (tx, mut rx) = mpsc::unbounded();
        let mut repeat = RepeatOnHold::new(ms(400), ms(70), tx);

        repeat.start('x');
        sleep(ms(390)).await;
        assert!(drain(&mut rx).is_empty());

        sleep(ms(20)).await;
        assert_eq!(drain(&mut rx), vec!['x']);

        sleep(ms(150)).await;
        assert_eq!(drain(&mut rx).len(), 2, "ticks at 470 and 540");

        repeat.stop();
        assert!(!repeat.is_running());
        sleep(ms(500)).await;
        assert!(drain(&mut rx).is_empty());
    }
}
