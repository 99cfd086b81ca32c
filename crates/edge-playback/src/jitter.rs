//! Bounded FIFO absorbing network-arrival irregularity between the
//! transport reader and the playback driver. Whole-chunk granular so
//! fade/drop decisions line up with what the device actually plays.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

pub struct JitterBuffer {
    queue: Mutex<VecDeque<Vec<f32>>>,
    capacity: usize,
    finished: AtomicBool,
}

impl JitterBuffer {
    pub fn new(capacity: usize) -> Self {
        Self { queue: Mutex::new(VecDeque::with_capacity(capacity)), capacity, finished: AtomicBool::new(false) }
    }

    /// Push a chunk. Returns `false` (having dropped the oldest chunk to
    /// make room) if the buffer was already at capacity.
    pub fn push(&self, chunk: Vec<f32>) -> bool {
        let mut queue = self.queue.lock();
        let accepted = if queue.len() >= self.capacity {
            queue.pop_front();
            false
        } else {
            true
        };
        queue.push_back(chunk);
        accepted
    }

    pub fn pop(&self) -> Option<Vec<f32>> {
        self.queue.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.queue.lock().clear();
    }

    /// Mark that no more chunks will be pushed for this session; the
    /// driver drains what remains rather than waiting for it to fill.
    pub fn mark_finished(&self) {
        self.finished.store(true, Ordering::Release);
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_fifo_order() {
        let buf = JitterBuffer::new(4);
        buf.push(vec![1.0]);
        buf.push(vec![2.0]);
        assert_eq!(buf.pop(), Some(vec![1.0]));
        assert_eq!(buf.pop(), Some(vec![2.0]));
        assert_eq!(buf.pop(), None);
    }

    #[test]
    fn test_push_drops_oldest_when_full() {
        let buf = JitterBuffer::new(2);
        assert!(buf.push(vec![1.0]));
        assert!(buf.push(vec![2.0]));
        assert!(!buf.push(vec![3.0])); // drops [1.0]
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.pop(), Some(vec![2.0]));
        assert_eq!(buf.pop(), Some(vec![3.0]));
    }

    #[test]
    fn test_finished_flag() {
        let buf = JitterBuffer::new(2);
        assert!(!buf.is_finished());
        buf.mark_finished();
        assert!(buf.is_finished());
    }

    #[test]
    fn test_clear_empties_queue() {
        let buf = JitterBuffer::new(4);
        buf.push(vec![1.0]);
        buf.push(vec![2.0]);
        buf.clear();
        assert!(buf.is_empty());
    }
}
