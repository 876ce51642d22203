// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Single-assignment latch guarding a descriptor body.

use parking_lot::{Condvar, Mutex};
use std::sync::OnceLock;

/// Value published exactly once; readers block until then.
pub(crate) struct BuildCell<T> {
    value: OnceLock<T>,
    lock: Mutex<()>,
    published: Condvar,
}

impl<T> BuildCell<T> {
    pub(crate) fn new() -> Self {
        Self {
            value: OnceLock::new(),
            lock: Mutex::new(()),
            published: Condvar::new(),
        }
    }

    pub(crate) fn ready(value: T) -> Self {
        let cell = Self::new();
        let _ = cell.value.set(value);
        cell
    }

    pub(crate) fn get(&self) -> Option<&T> {
        self.value.get()
    }

    /// Publish and wake every waiter. Returns `false` if already published.
    pub(crate) fn publish(&self, value: T) -> bool {
        let stored = self.value.set(value).is_ok();
        let _guard = self.lock.lock();
        self.published.notify_all();
        stored
    }

    pub(crate) fn wait(&self) -> &T {
        if let Some(value) = self.value.get() {
            return value;
        }
        let mut guard = self.lock.lock();
        loop {
            if let Some(value) = self.value.get() {
                return value;
            }
            self.published.wait(&mut guard);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_waiters_see_published_value() {
        let cell = Arc::new(BuildCell::<u32>::new());
        let barrier = Arc::new(Barrier::new(5));

        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let cell = Arc::clone(&cell);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    *cell.wait()
                })
            })
            .collect();

        barrier.wait();
        thread::sleep(Duration::from_millis(10));
        assert!(cell.publish(7));
        assert!(!cell.publish(8));

        for w in waiters {
            assert_eq!(w.join().expect("waiter"), 7);
        }
        assert_eq!(cell.get(), Some(&7));
    }

    #[test]
    fn test_ready_cell_never_blocks() {
        let cell = BuildCell::ready("done");
        assert_eq!(*cell.wait(), "done");
    }
}
