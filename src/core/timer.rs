//! Cancellable one-shot timers for the notification scheduler.
//!
//! The scheduler only ever talks to [`TimerService`]. The event loop uses
//! [`TokioTimer`]; tests drive [`ManualTimer`] by hand.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub type NotificationId = u64;

/// Identifies one scheduled timer so it can be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TimerHandle(pub u64);

/// Which lifecycle step a timer completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimerPhase {
    /// Slide-in finished, the record becomes resident.
    SlideIn,
    /// Display time is over, the record starts leaving.
    Dismiss,
    /// Slide-out finished, the record is removed.
    SlideOut,
}

/// Payload carried by a timer back to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerToken {
    pub id: NotificationId,
    pub phase: TimerPhase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired {
    pub handle: TimerHandle,
    pub token: TimerToken,
}

pub trait TimerService {
    /// Arranges for `token` to be delivered after `delay`.
    fn schedule_after(&mut self, delay: Duration, token: TimerToken) -> TimerHandle;

    /// Cancels a pending timer. Unknown or already fired handles are ignored.
    fn cancel(&mut self, handle: TimerHandle);
}

/// Timers backed by sleeping tokio tasks. Fired timers arrive on the
/// receiver returned by [`TokioTimer::new`].
///
/// Must be used from within a tokio runtime.
pub struct TokioTimer {
    fired_tx: mpsc::UnboundedSender<TimerFired>,
    pending: HashMap<TimerHandle, JoinHandle<()>>,
    next_handle: u64,
}

impl TokioTimer {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerFired>) {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        let timer = Self {
            fired_tx,
            pending: HashMap::new(),
            next_handle: 0,
        };
        (timer, fired_rx)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.values().filter(|task| !task.is_finished()).count()
    }
}

impl TimerService for TokioTimer {
    fn schedule_after(&mut self, delay: Duration, token: TimerToken) -> TimerHandle {
        self.pending.retain(|_, task| !task.is_finished());

        self.next_handle += 1;
        let handle = TimerHandle(self.next_handle);
        let fired_tx = self.fired_tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The receiver is gone only when the session has shut down.
            let _ = fired_tx.send(TimerFired { handle, token });
        });
        self.pending.insert(handle, task);
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(task) = self.pending.remove(&handle) {
            task.abort();
        }
    }
}

impl Drop for TokioTimer {
    fn drop(&mut self) {
        for (_, task) in self.pending.drain() {
            task.abort();
        }
    }
}

/// Deterministic timer with a virtual clock.
#[derive(Debug, Default)]
pub struct ManualTimer {
    now: Duration,
    next_handle: u64,
    pending: BTreeMap<(Duration, u64), TimerToken>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Number of pending timers carrying a token for `id`.
    pub fn pending_for(&self, id: NotificationId) -> usize {
        self.pending.values().filter(|token| token.id == id).count()
    }

    /// Pops the earliest timer due at or before `until` and moves the clock to it.
    pub fn next_due(&mut self, until: Duration) -> Option<TimerFired> {
        let (&(due, raw), _) = self.pending.first_key_value()?;
        if due > until {
            return None;
        }
        let token = self.pending.remove(&(due, raw))?;
        self.now = self.now.max(due);
        Some(TimerFired {
            handle: TimerHandle(raw),
            token,
        })
    }

    pub fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }
}

impl TimerService for ManualTimer {
    fn schedule_after(&mut self, delay: Duration, token: TimerToken) -> TimerHandle {
        self.next_handle += 1;
        self.pending.insert((self.now + delay, self.next_handle), token);
        TimerHandle(self.next_handle)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.pending.retain(|&(_, raw), _| raw != handle.0);
    }
}
