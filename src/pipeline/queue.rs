//! Handoff queue between the listener and the flush loop

use std::sync::{Mutex, PoisonError};

use crate::types::RawDatagram;

/// Unbounded, mutex-guarded buffer of received datagrams
///
/// The lock is held only for a push or a swap, never across decode or I/O.
/// There is no capacity limit: the listener is never slowed down by a slow
/// sink, memory grows instead.
#[derive(Debug, Default)]
pub struct HandoffQueue {
    items: Mutex<Vec<RawDatagram>>,
}

impl HandoffQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one datagram
    pub fn push(&self, datagram: RawDatagram) {
        self.items.lock().unwrap_or_else(PoisonError::into_inner).push(datagram);
    }

    /// Take every queued datagram in arrival order, leaving the queue empty
    pub fn drain_and_swap(&self) -> Vec<RawDatagram> {
        std::mem::take(&mut *self.items.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;

    #[test]
    fn drain_returns_arrival_order_and_empties() {
        let queue = HandoffQueue::new();
        for i in 0..5u8 {
            queue.push(RawDatagram::new(Utc::now(), &[i]));
        }
        assert_eq!(queue.len(), 5);

        let drained = queue.drain_and_swap();
        let bytes: Vec<u8> = drained.iter().map(|d| d.data[0]).collect();
        assert_eq!(bytes, vec![0, 1, 2, 3, 4]);
        assert!(queue.is_empty());
        assert!(queue.drain_and_swap().is_empty());
    }

    #[test]
    fn concurrent_pushes_are_not_lost() {
        let queue = Arc::new(HandoffQueue::new());
        let writers: Vec<_> = (0..4u8)
            .map(|w| {
                let queue = Arc::clone(&queue);
                std::thread::spawn(move || {
                    for i in 0..250u8 {
                        queue.push(RawDatagram::new(Utc::now(), &[w, i]));
                    }
                })
            })
            .collect();

        let mut drained = Vec::new();
        while writers.iter().any(|w| !w.is_finished()) {
            drained.extend(queue.drain_and_swap());
        }
        for writer in writers {
            writer.join().unwrap();
        }
        drained.extend(queue.drain_and_swap());

        assert_eq!(drained.len(), 1000);
        // per-writer order survives interleaving
        for w in 0..4u8 {
            let seq: Vec<u8> = drained.iter().filter(|d| d.data[0] == w).map(|d| d.data[1]).collect();
            assert!(seq.windows(2).all(|p| p[0] < p[1]));
        }
    }
}
