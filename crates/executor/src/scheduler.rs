//! Timer plumbing for the execution lifecycle.
//!
//! The state machine never sleeps. It hands a [`TimerRequest`] to a
//! [`Scheduler`] and later receives the token back through `on_timer`. Tokens
//! carry a generation, so a timer that was cancelled or outlived its order
//! is recognised as stale and ignored.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerKind {
    /// Simulated network/settlement latency.
    Confirmation,
    /// How long the success indicator is shown.
    SuccessDisplay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerToken {
    pub generation: u64,
    pub kind: TimerKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerRequest {
    pub token: TimerToken,
    pub delay: Duration,
}

pub trait Scheduler {
    /// Arms a timer that delivers `request.token` after `request.delay`.
    fn schedule(&mut self, request: TimerRequest);

    /// Disarms a timer. Cancelling an unknown or already fired token is a no-op.
    fn cancel(&mut self, token: TimerToken);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ManualTimer {
    due: Duration,
    seq: u64,
    token: TimerToken,
}

/// A virtual clock. Nothing fires until the owner calls [`ManualScheduler::advance`].
#[derive(Debug, Default)]
pub struct ManualScheduler {
    now: Duration,
    next_seq: u64,
    pending: Vec<ManualTimer>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since the scheduler was created.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Delay until the earliest armed timer, if any.
    pub fn next_due_in(&self) -> Option<Duration> {
        self.pending
            .iter()
            .map(|t| t.due.saturating_sub(self.now))
            .min()
    }

    /// Moves the clock forward by `by`, firing every timer that falls due in
    /// order of due time (ties in arming order). The clock is set to each
    /// timer's due time before `fire` runs, so timers armed from inside
    /// `fire` are measured from the correct instant.
    pub fn advance(&mut self, by: Duration, mut fire: impl FnMut(&mut Self, TimerToken)) {
        let target = self.now + by;
        while let Some(timer) = self.pop_due(target) {
            self.now = timer.due;
            fire(self, timer.token);
        }
        self.now = target;
    }

    fn pop_due(&mut self, until: Duration) -> Option<ManualTimer> {
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= until)
            .min_by_key(|(_, t)| (t.due, t.seq))
            .map(|(i, _)| i)?;
        Some(self.pending.remove(index))
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, request: TimerRequest) {
        let timer = ManualTimer {
            due: self.now + request.delay,
            seq: self.next_seq,
            token: request.token,
        };
        self.next_seq += 1;
        self.pending.push(timer);
    }

    fn cancel(&mut self, token: TimerToken) {
        self.pending.retain(|t| t.token != token);
    }
}

/// Arms real timers on the tokio runtime.
///
/// Each timer is a spawned task that sleeps and then sends its token down the
/// channel returned by [`TokioScheduler::new`]. Cancelling aborts the task.
/// Must be used from within a tokio runtime.
#[derive(Debug)]
pub struct TokioScheduler {
    fired_tx: mpsc::UnboundedSender<TimerToken>,
    tasks: HashMap<TimerToken, JoinHandle<()>>,
}

impl TokioScheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerToken>) {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            fired_tx,
            tasks: HashMap::new(),
        };
        (scheduler, fired_rx)
    }

    /// Number of timers still sleeping.
    pub fn armed(&self) -> usize {
        self.tasks.values().filter(|h| !h.is_finished()).count()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&mut self, request: TimerRequest) {
        self.tasks.retain(|_, handle| !handle.is_finished());

        let tx = self.fired_tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(request.delay).await;
            // The receiver is gone only when the session shut down.
            let _ = tx.send(request.token);
        });
        if let Some(previous) = self.tasks.insert(request.token, handle) {
            previous.abort();
        }
    }

    fn cancel(&mut self, token: TimerToken) {
        if let Some(handle) = self.tasks.remove(&token) {
            handle.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for handle in self.tasks.values() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(generation: u64, kind: TimerKind) -> TimerToken {
        TimerToken { generation, kind }
    }

    #[test]
    fn manual_timers_fire_in_due_order() {
        let mut scheduler = ManualScheduler::new();
        let late = token(1, TimerKind::SuccessDisplay);
        let early = token(2, TimerKind::Confirmation);
        scheduler.schedule(TimerRequest {
            token: late,
            delay: Duration::from_secs(3),
        });
        scheduler.schedule(TimerRequest {
            token: early,
            delay: Duration::from_secs(1),
        });

        let mut fired = Vec::new();
        scheduler.advance(Duration::from_secs(5), |s, t| fired.push((s.now(), t)));

        assert_eq!(
            fired,
            vec![(Duration::from_secs(1), early), (Duration::from_secs(3), late)]
        );
        assert_eq!(scheduler.now(), Duration::from_secs(5));
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn timers_armed_while_firing_measure_from_their_trigger() {
        let mut scheduler = ManualScheduler::new();
        let first = token(1, TimerKind::Confirmation);
        let second = token(1, TimerKind::SuccessDisplay);
        scheduler.schedule(TimerRequest {
            token: first,
            delay: Duration::from_millis(1_500),
        });

        let mut fired = Vec::new();
        scheduler.advance(Duration::from_secs(10), |s, t| {
            fired.push((s.now(), t));
            if t == first {
                s.schedule(TimerRequest {
                    token: second,
                    delay: Duration::from_secs(3),
                });
            }
        });

        assert_eq!(
            fired,
            vec![
                (Duration::from_millis(1_500), first),
                (Duration::from_millis(4_500), second)
            ]
        );
    }

    #[test]
    fn cancelled_manual_timers_never_fire() {
        let mut scheduler = ManualScheduler::new();
        let t = token(7, TimerKind::Confirmation);
        scheduler.schedule(TimerRequest {
            token: t,
            delay: Duration::from_secs(1),
        });
        scheduler.cancel(t);

        let mut fired = 0;
        scheduler.advance(Duration::from_secs(2), |_, _| fired += 1);
        assert_eq!(fired, 0);
    }

    #[test]
    fn next_due_reports_remaining_delay() {
        let mut scheduler = ManualScheduler::new();
        assert_eq!(scheduler.next_due_in(), None);
        scheduler.schedule(TimerRequest {
            token: token(1, TimerKind::Confirmation),
            delay: Duration::from_secs(2),
        });
        scheduler.advance(Duration::from_millis(500), |_, _| {});
        assert_eq!(scheduler.next_due_in(), Some(Duration::from_millis(1_500)));
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_timers_deliver_their_token() {
        let (mut scheduler, mut fired_rx) = TokioScheduler::new();
        let t = token(1, TimerKind::Confirmation);
        scheduler.schedule(TimerRequest {
            token: t,
            delay: Duration::from_millis(1_500),
        });

        let started = tokio::time::Instant::now();
        assert_eq!(fired_rx.recv().await, Some(t));
        assert!(started.elapsed() >= Duration::from_millis(1_500));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_tokio_timers_stay_silent() {
        let (mut scheduler, mut fired_rx) = TokioScheduler::new();
        let cancelled = token(1, TimerKind::Confirmation);
        let kept = token(2, TimerKind::Confirmation);
        scheduler.schedule(TimerRequest {
            token: cancelled,
            delay: Duration::from_millis(100),
        });
        scheduler.schedule(TimerRequest {
            token: kept,
            delay: Duration::from_millis(200),
        });
        scheduler.cancel(cancelled);

        assert_eq!(fired_rx.recv().await, Some(kept));
    }
}
