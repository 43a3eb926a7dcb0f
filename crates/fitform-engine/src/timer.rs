//! Host-driven timer queue.
//!
//! Time only moves when the owner calls [`TimerQueue::advance`]. Due timers
//! are returned one at a time in deadline order, with ties broken by
//! scheduling order, so the owner can react to each firing (including
//! scheduling or cancelling other timers) before the next one is examined.

use std::time::Duration;

/// Cancellation handle for a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct Entry<T> {
    handle: TimerHandle,
    deadline: Duration,
    period: Option<Duration>,
    token: T,
}

/// Timers keyed by virtual elapsed time.
#[derive(Debug, Clone)]
pub struct TimerQueue<T> {
    now: Duration,
    next_id: u64,
    entries: Vec<Entry<T>>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

impl<T: Copy> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of scheduled timers.
    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    pub fn is_scheduled(&self, handle: TimerHandle) -> bool {
        self.entries.iter().any(|e| e.handle == handle)
    }

    /// Fire `token` once after `delay`.
    pub fn schedule_once(&mut self, delay: Duration, token: T) -> TimerHandle {
        self.push(delay, None, token)
    }

    /// Fire `token` every `period`, first after one full period.
    ///
    /// A zero period is treated as one millisecond.
    pub fn schedule_repeating(&mut self, period: Duration, token: T) -> TimerHandle {
        let period = period.max(Duration::from_millis(1));
        self.push(period, Some(period), token)
    }

    /// Cancel a timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.handle != handle);
        self.entries.len() != before
    }

    /// Pop the earliest timer due at or before `until`.
    ///
    /// Virtual time moves to that timer's deadline. Repeating timers are
    /// rescheduled one period later under the same handle.
    pub fn pop_due(&mut self, until: Duration) -> Option<(TimerHandle, T)> {
        let index = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.deadline <= until)
            .min_by_key(|(_, e)| (e.deadline, e.handle.0))
            .map(|(index, _)| index)?;

        let entry = &mut self.entries[index];
        self.now = self.now.max(entry.deadline);
        let fired = (entry.handle, entry.token);

        if let Some(period) = entry.period {
            entry.deadline += period;
        } else {
            self.entries.swap_remove(index);
        }

        Some(fired)
    }

    /// Move virtual time forward without firing anything.
    ///
    /// Callers drain [`TimerQueue::pop_due`] first; this only settles the clock.
    pub fn settle(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }

    /// Advance by `elapsed`, collecting every firing in order.
    ///
    /// Suitable when firings do not schedule or cancel timers. Owners that
    /// react to firings should loop over [`TimerQueue::pop_due`] instead.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<T> {
        let until = self.now + elapsed;
        let mut fired = Vec::new();
        while let Some((_, token)) = self.pop_due(until) {
            fired.push(token);
        }
        self.settle(until);
        fired
    }

    fn push(&mut self, delay: Duration, period: Option<Duration>, token: T) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            handle,
            deadline: self.now + delay,
            period,
            token,
        });
        handle
    }
}
