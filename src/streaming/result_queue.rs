//! Lock-protected FIFO handing finished work from workers to the tick thread

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// A finished job: the correlation token it was submitted with and its output.
#[derive(Debug)]
pub struct Completed<K, T> {
    pub token: K,
    pub value: T,
}

/// Multi-producer queue drained in one batch by its owner.
///
/// Items come out in completion order. The lock is held only for a single
/// push or a single swap of the whole buffer.
pub struct ResultQueue<T> {
    inner: Arc<Mutex<VecDeque<T>>>,
}

impl<T> Clone for ResultQueue<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T> Default for ResultQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ResultQueue<T> {
    pub fn new() -> Self {
        Self { inner: Arc::new(Mutex::new(VecDeque::new())) }
    }

    // A worker that panicked mid-push leaves the deque itself intact.
    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push(&self, item: T) {
        self.lock().push_back(item);
    }

    /// Take everything queued so far
    pub fn drain(&self) -> VecDeque<T> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_preserves_push_order() {
        let queue = ResultQueue::new();
        queue.push(1);
        queue.push(2);
        queue.push(3);

        let drained: Vec<_> = queue.drain().into_iter().collect();
        assert_eq!(drained, vec![1, 2, 3]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_concurrent_producers() {
        let queue = ResultQueue::new();
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let queue = queue.clone();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        queue.push(Completed { token: t, value: i });
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let drained = queue.drain();
        assert_eq!(drained.len(), 400);

        // Per-producer order survives interleaving
        for t in 0..4 {
            let values: Vec<_> = drained.iter().filter(|c| c.token == t).map(|c| c.value).collect();
            assert_eq!(values, (0..100).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_recovers_from_poisoned_lock() {
        let queue = ResultQueue::new();
        queue.push(7);

        let poisoner = queue.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.inner.lock().unwrap();
            panic!("worker died holding the lock");
        })
        .join();

        queue.push(8);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.drain().into_iter().collect::<Vec<_>>(), vec![7, 8]);
    }
}
