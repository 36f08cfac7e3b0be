use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use log::error;

/// Thread-safe handoff queue between generation workers and the main loop.
///
/// Workers `push` completed results from the pool; the owner `drain`s the
/// whole queue once per tick. Items come back out in the order they were
/// enqueued. Cloning the queue clones the handle, not the contents, so a
/// clone can be moved into a worker closure.
pub struct ResultQueue<T> {
    inner: Arc<Mutex<VecDeque<T>>>,
}

impl<T> ResultQueue<T> {
    pub fn new() -> Self {
        ResultQueue {
            inner: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Enqueue a finished result. Called from worker threads.
    pub fn push(&self, item: T) {
        match self.inner.lock() {
            Ok(mut queue) => queue.push_back(item),
            Err(_) => error!("Result queue mutex poisoned; dropping a result"),
        }
    }

    /// Remove and return everything queued so far, oldest first.
    pub fn drain(&self) -> Vec<T> {
        match self.inner.lock() {
            Ok(mut queue) => queue.drain(..).collect(),
            Err(_) => {
                error!("Result queue mutex poisoned; draining nothing");
                Vec::new()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|queue| queue.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Clone for ResultQueue<T> {
    fn clone(&self) -> Self {
        ResultQueue {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for ResultQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::threading::thread_pool::ThreadPool;

    #[test]
    fn drains_in_fifo_order_and_empties() {
        let queue = ResultQueue::new();
        queue.push(1);
        queue.push(2);
        queue.push(3);

        assert_eq!(queue.drain(), vec![1, 2, 3]);
        assert!(queue.is_empty());
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn clone_shares_the_same_queue() {
        let queue = ResultQueue::new();
        let handle = queue.clone();
        handle.push("from the clone");

        assert_eq!(queue.drain(), vec!["from the clone"]);
    }

    #[test]
    fn collects_results_pushed_from_workers() {
        let pool = ThreadPool::new(4);
        let queue = ResultQueue::new();

        for i in 0..16u32 {
            let handle = queue.clone();
            pool.execute(move || handle.push(i));
        }

        let mut received = Vec::new();
        for _ in 0..400 {
            received.extend(queue.drain());
            if received.len() == 16 {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }

        received.sort_unstable();
        assert_eq!(received, (0..16).collect::<Vec<_>>());
    }
}
