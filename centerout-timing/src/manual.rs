use crate::timer::{TimerCallback, TimerError, TimerHandle, TimerService};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Cancelled callbacks kept for `fire_stale`; older ones are dropped
pub const MAX_STALE: usize = 64;

struct Pending {
    handle: TimerHandle,
    deadline: Duration,
    callback: TimerCallback,
}

#[derive(Default)]
struct Clock {
    now: Duration,
    next_id: u64,
    scheduled: usize,
    pending: Vec<Pending>,
    /// Most recently cancelled callbacks, kept to replay racing deliveries
    stale: VecDeque<Pending>,
}

/// Deterministic timer driven by explicit `advance` calls.
///
/// Clones share the same clock, so a test can keep one clone while the
/// controller owns another. Callbacks never run inside `schedule`; they run
/// from `advance`/`fire_next` after the internal lock is released.
#[derive(Clone, Default)]
pub struct ManualTimer {
    clock: Arc<Mutex<Clock>>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Clock> {
        self.clock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn now(&self) -> Duration {
        self.lock().now
    }

    /// Number of timers armed and not yet fired or cancelled
    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }

    /// Total number of timers ever scheduled
    pub fn scheduled(&self) -> usize {
        self.lock().scheduled
    }

    /// Delay remaining until the earliest pending timer
    pub fn next_deadline(&self) -> Option<Duration> {
        let clock = self.lock();
        clock
            .pending
            .iter()
            .map(|p| p.deadline.saturating_sub(clock.now))
            .min()
    }

    /// Moves the clock forward and runs every callback that came due, in
    /// deadline order. Returns the number of callbacks run.
    pub fn advance(&self, by: Duration) -> usize {
        let due = {
            let mut clock = self.lock();
            clock.now = clock.now.saturating_add(by);
            let now = clock.now;
            let (mut due, rest): (Vec<_>, Vec<_>) =
                clock.pending.drain(..).partition(|p| p.deadline <= now);
            clock.pending = rest;
            due.sort_by_key(|p| p.deadline);
            due
        };
        let fired = due.len();
        for pending in due {
            (pending.callback)();
        }
        fired
    }

    /// Jumps to the earliest pending deadline and runs that callback
    pub fn fire_next(&self) -> bool {
        match self.next_deadline() {
            Some(remaining) => self.advance(remaining) > 0,
            None => false,
        }
    }

    /// Runs the callbacks of cancelled timers, as a real timer thread racing
    /// past a cancellation would. Only the last [`MAX_STALE`] cancellations
    /// are replayed. Returns the number run.
    pub fn fire_stale(&self) -> usize {
        let stale = std::mem::take(&mut self.lock().stale);
        let fired = stale.len();
        for pending in stale {
            (pending.callback)();
        }
        fired
    }
}

impl TimerService for ManualTimer {
    fn schedule(
        &self,
        delay: Duration,
        callback: TimerCallback,
    ) -> Result<TimerHandle, TimerError> {
        let mut clock = self.lock();
        clock.next_id += 1;
        clock.scheduled += 1;
        let handle = TimerHandle::new(clock.next_id);
        let deadline = clock.now.saturating_add(delay);
        clock.pending.push(Pending {
            handle: handle.clone(),
            deadline,
            callback,
        });
        Ok(handle)
    }

    fn cancel(&self, handle: &TimerHandle) {
        handle.mark_cancelled();
        let mut clock = self.lock();
        if let Some(idx) = clock
            .pending
            .iter()
            .position(|p| p.handle.id() == handle.id())
        {
            let pending = clock.pending.remove(idx);
            if clock.stale.len() == MAX_STALE {
                clock.stale.pop_front();
            }
            clock.stale.push_back(pending);
        }
    }
}
