// thermonode - Adaptive publishing for battery-powered sensor nodes
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Cooperative one-shot scheduler
//!
//! Tasks are plain values queued against a deadline. Nothing runs on its
//! own: the owner polls [`TimerQueue::pop_due`] from its event loop and
//! dispatches whatever comes out. Tasks due at the same tick come out in
//! scheduling order. A repeating task reschedules itself when handled.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::sample::Timestamp;

#[derive(Debug)]
struct Entry<T> {
    deadline: Timestamp,
    seq: u64,
    task: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Reversed so the max-heap yields the earliest deadline first.
impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Deadline-ordered queue of one-shot tasks
#[derive(Debug)]
pub struct TimerQueue<T> {
    heap: BinaryHeap<Entry<T>>,
    next_seq: u64,
}

impl<T> TimerQueue<T> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Run `task` once, `delay_ms` after `now`
    pub fn schedule_once(&mut self, now: Timestamp, delay_ms: u64, task: T) {
        self.schedule_at(now.saturating_add(delay_ms), task);
    }

    /// Run `task` once at `deadline`
    pub fn schedule_at(&mut self, deadline: Timestamp, task: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry {
            deadline,
            seq,
            task,
        });
    }

    /// Remove and return the earliest task due at or before `now`
    pub fn pop_due(&mut self, now: Timestamp) -> Option<(Timestamp, T)> {
        if self.heap.peek()?.deadline > now {
            return None;
        }
        self.heap.pop().map(|e| (e.deadline, e.task))
    }

    /// Deadline of the earliest pending task
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.heap.peek().map(|e| e.deadline)
    }

    /// Number of pending tasks
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Check if no task is pending
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
