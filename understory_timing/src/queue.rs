// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cancellable one-shot timers ordered by deadline.

use alloc::vec::Vec;

/// Identifier of a scheduled timer.
///
/// Identifiers are never reused by the queue that issued them, so a stale id
/// can be cancelled safely after its timer has fired.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// A timer that has reached its deadline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expired<T> {
    /// The id returned when the timer was scheduled.
    pub id: TimerId,
    /// The deadline the timer was scheduled for.
    pub deadline: u64,
    /// The scheduled payload.
    pub payload: T,
}

#[derive(Clone, Debug)]
struct Entry<T> {
    id: TimerId,
    deadline: u64,
    payload: T,
}

/// Cancellable one-shot timers ordered by deadline.
///
/// Entries are kept sorted by `(deadline, id)`, so timers sharing a deadline
/// fire in the order they were scheduled. Queues in UI controllers hold a
/// handful of entries, which keeps the linear insert cheap.
#[derive(Clone, Debug)]
pub struct TimerQueue<T> {
    entries: Vec<Entry<T>>,
    next_id: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }

    /// Schedules `payload` to fire at `deadline`.
    pub fn schedule_at(&mut self, deadline: u64, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let at = self
            .entries
            .partition_point(|e| (e.deadline, e.id) <= (deadline, id));
        self.entries.insert(
            at,
            Entry {
                id,
                deadline,
                payload,
            },
        );
        id
    }

    /// Schedules `payload` to fire `delay` milliseconds after `now`.
    pub fn schedule_after(&mut self, now: u64, delay: u64, payload: T) -> TimerId {
        self.schedule_at(now.saturating_add(delay), payload)
    }

    /// Cancels a pending timer, returning its payload.
    ///
    /// Returns `None` if the timer already fired, was cancelled, or was never
    /// issued by this queue.
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        let index = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(index).payload)
    }

    /// Returns `true` if `id` is still pending.
    #[must_use]
    pub fn contains(&self, id: TimerId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// Returns the earliest pending deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<u64> {
        self.entries.first().map(|e| e.deadline)
    }

    /// Removes and returns the earliest timer whose deadline is `<= now`.
    pub fn pop_due(&mut self, now: u64) -> Option<Expired<T>> {
        if self.entries.first()?.deadline > now {
            return None;
        }
        let Entry {
            id,
            deadline,
            payload,
        } = self.entries.remove(0);
        Some(Expired {
            id,
            deadline,
            payload,
        })
    }

    /// Cancels every pending timer.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns the number of pending timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no timer is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn drain(queue: &mut TimerQueue<&'static str>, now: u64) -> Vec<&'static str> {
        let mut out = Vec::new();
        while let Some(expired) = queue.pop_due(now) {
            out.push(expired.payload);
        }
        out
    }

    #[test]
    fn fires_in_deadline_order() {
        let mut q = TimerQueue::new();
        q.schedule_at(30, "c");
        q.schedule_at(10, "a");
        q.schedule_at(20, "b");

        assert_eq!(q.next_deadline(), Some(10));
        assert_eq!(drain(&mut q, 100), vec!["a", "b", "c"]);
        assert!(q.is_empty());
    }

    #[test]
    fn equal_deadlines_fire_in_scheduling_order() {
        let mut q = TimerQueue::new();
        q.schedule_at(10, "first");
        q.schedule_at(10, "second");
        q.schedule_at(5, "earlier");

        assert_eq!(drain(&mut q, 10), vec!["earlier", "first", "second"]);
    }

    #[test]
    fn only_due_timers_fire() {
        let mut q = TimerQueue::new();
        q.schedule_after(0, 200, "scroll");
        q.schedule_after(0, 1_000, "release");

        assert_eq!(drain(&mut q, 199), Vec::<&str>::new());
        assert_eq!(drain(&mut q, 200), vec!["scroll"]);
        assert_eq!(q.len(), 1);
        assert_eq!(q.next_deadline(), Some(1_000));
    }

    #[test]
    fn cancel_removes_pending_timer() {
        let mut q = TimerQueue::new();
        let a = q.schedule_at(10, "a");
        let b = q.schedule_at(20, "b");

        assert_eq!(q.cancel(a), Some("a"));
        assert!(!q.contains(a));
        assert!(q.contains(b));
        assert_eq!(drain(&mut q, 100), vec!["b"]);
    }

    #[test]
    fn cancel_after_fire_is_a_no_op() {
        let mut q = TimerQueue::new();
        let a = q.schedule_at(10, "a");
        assert!(q.pop_due(10).is_some());

        assert_eq!(q.cancel(a), None);
        assert_eq!(q.cancel(a), None);
    }

    #[test]
    fn ids_are_not_reused() {
        let mut q = TimerQueue::new();
        let a = q.schedule_at(10, "a");
        q.clear();
        let b = q.schedule_at(10, "b");
        assert_ne!(a, b, "a cleared id must not alias a new timer");
        assert_eq!(q.cancel(a), None);
        assert!(q.contains(b));
    }

    #[test]
    fn schedule_after_saturates() {
        let mut q = TimerQueue::new();
        q.schedule_after(u64::MAX - 1, 10, "late");
        assert_eq!(q.next_deadline(), Some(u64::MAX));
    }

    #[test]
    fn expired_reports_id_and_deadline() {
        let mut q = TimerQueue::new();
        let id = q.schedule_after(100, 50, 7_u8);
        let fired = q.pop_due(500).unwrap();
        assert_eq!(
            fired,
            Expired {
                id,
                deadline: 150,
                payload: 7
            }
        );
    }
}
