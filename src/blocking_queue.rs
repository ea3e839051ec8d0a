// vectorlink: a distributed overlay IP path-vector router
// Copyright (C) 2026 The vectorlink Authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//! A bounded FIFO queue whose producer blocks on a full queue rather than
//! busy-waiting on a `ready()` predicate. Unlike `crossbeam_channel`, this
//! exposes a "pop the front only if a predicate holds" operation, which the
//! substrate egress scheduler needs to test a packet's release time without
//! removing it from the queue when it isn't releasable yet.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

pub struct BoundedQueue<T> {
    capacity: usize,
    inner: Mutex<VecDeque<T>>,
    not_full: Condvar,
}

impl<T> BoundedQueue<T> {
    pub fn new(capacity: usize) -> Self {
        BoundedQueue {
            capacity,
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            not_full: Condvar::new(),
        }
    }

    /// Blocks until there is room, then appends `item`.
    pub fn push_blocking(&self, item: T) {
        let mut guard = self.inner.lock().unwrap();
        while guard.len() >= self.capacity {
            guard = self.not_full.wait(guard).unwrap();
        }
        guard.push_back(item);
    }

    /// Non-blocking capacity check, for `ready()`-style callers.
    pub fn is_full(&self) -> bool {
        self.inner.lock().unwrap().len() >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    /// Removes and returns the front element iff `pred` accepts it.
    /// Leaves the queue untouched otherwise.
    pub fn pop_front_if<F: FnOnce(&T) -> bool>(&self, pred: F) -> Option<T> {
        let mut guard = self.inner.lock().unwrap();
        let releasable = guard.front().map(pred).unwrap_or(false);
        if !releasable {
            return None;
        }
        let item = guard.pop_front();
        drop(guard);
        self.not_full.notify_one();
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_pop_if() {
        let q: BoundedQueue<i32> = BoundedQueue::new(2);
        q.push_blocking(1);
        q.push_blocking(2);
        assert!(q.is_full());
        assert_eq!(q.pop_front_if(|_| false), None);
        assert_eq!(q.pop_front_if(|&v| v == 1), Some(1));
        assert!(!q.is_full());
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn blocks_until_space() {
        use std::sync::Arc;
        use std::thread;
        use std::time::Duration;

        let q = Arc::new(BoundedQueue::new(1));
        q.push_blocking(1);

        let q2 = q.clone();
        let handle = thread::spawn(move || {
            q2.push_blocking(2);
        });

        thread::sleep(Duration::from_millis(20));
        assert!(!handle.is_finished());

        assert_eq!(q.pop_front_if(|_| true), Some(1));
        handle.join().unwrap();
        assert_eq!(q.pop_front_if(|_| true), Some(2));
    }
}
