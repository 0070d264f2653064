// Per-client blocking outbound queue.
//
// Every connection gets one of these; the writer thread blocks in `pop`
// and the broadcast path in `session.rs` feeds it under the session lock.
// A queue is born pre-seeded with the replay history so a late joiner's
// writer emits the session's whole joinable sequence before any live
// frame.
//
// `close()` is idempotent and wakes a blocked popper: teardown from either
// the reader side (connection error) or the writer side (write error)
// converges on the same path. A closed queue's `pop` returns `None`
// immediately — the peer is gone, so the backlog is discarded rather than
// drained.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};

pub struct BlockingQueue<T> {
    inner: Mutex<Inner<T>>,
    ready: Condvar,
}

struct Inner<T> {
    items: VecDeque<T>,
    open: bool,
}

impl<T> BlockingQueue<T> {
    pub fn new() -> Self {
        Self::seeded(VecDeque::new())
    }

    /// A queue that starts out holding `initial` items.
    pub fn seeded(initial: VecDeque<T>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                items: initial,
                open: true,
            }),
            ready: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append an item and wake a blocked popper. Pushing to a closed
    /// queue is a silent no-op.
    pub fn push(&self, item: T) {
        let mut inner = self.lock();
        if !inner.open {
            return;
        }
        inner.items.push_back(item);
        self.ready.notify_one();
    }

    /// Remove the front item, blocking while the queue is empty and open.
    /// Returns `None` once the queue is closed.
    pub fn pop(&self) -> Option<T> {
        let mut inner = self.lock();
        loop {
            if !inner.open {
                return None;
            }
            if let Some(item) = inner.items.pop_front() {
                return Some(item);
            }
            inner = self
                .ready
                .wait(inner)
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    /// Close the queue and wake every blocked popper. Idempotent.
    pub fn close(&self) {
        let mut inner = self.lock();
        inner.open = false;
        self.ready.notify_all();
    }

    pub fn is_open(&self) -> bool {
        self.lock().open
    }
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn fifo_order() {
        let queue = BlockingQueue::new();
        queue.push(1);
        queue.push(2);
        queue.push(3);
        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), Some(3));
    }

    #[test]
    fn seeded_items_come_first() {
        let queue = BlockingQueue::seeded(VecDeque::from([10, 20]));
        queue.push(30);
        assert_eq!(queue.pop(), Some(10));
        assert_eq!(queue.pop(), Some(20));
        assert_eq!(queue.pop(), Some(30));
    }

    #[test]
    fn pop_blocks_until_push() {
        let queue = Arc::new(BlockingQueue::new());
        let popper = {
            let queue = queue.clone();
            thread::spawn(move || queue.pop())
        };
        thread::sleep(Duration::from_millis(50));
        queue.push(7);
        assert_eq!(popper.join().unwrap(), Some(7));
    }

    #[test]
    fn close_wakes_blocked_popper() {
        let queue: Arc<BlockingQueue<u32>> = Arc::new(BlockingQueue::new());
        let popper = {
            let queue = queue.clone();
            thread::spawn(move || queue.pop())
        };
        thread::sleep(Duration::from_millis(50));
        queue.close();
        assert_eq!(popper.join().unwrap(), None);
    }

    #[test]
    fn close_is_idempotent_and_discards_backlog() {
        let queue = BlockingQueue::new();
        queue.push(1);
        queue.close();
        queue.close();
        assert!(!queue.is_open());
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn push_after_close_is_ignored() {
        let queue = BlockingQueue::new();
        queue.close();
        queue.push(1);
        assert_eq!(queue.pop(), None);
    }
}
