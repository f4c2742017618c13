//! A FIFO backed by a vector and a consumed-prefix cursor.
//!
//! Popping advances the cursor instead of shifting the vector; the consumed
//! prefix is dropped once it makes up half of the storage. Reordering compacts
//! first, so it only ever sees live items.

/// Consumed-prefix length below which compaction is skipped.
const COMPACT_THRESHOLD: usize = 64;

#[derive(Debug)]
pub struct WorkQueue<T> {
    items: Vec<Option<T>>,
    head: usize,
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        WorkQueue {
            items: Vec::new(),
            head: 0,
        }
    }
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: T) {
        self.items.push(Some(item));
    }

    pub fn pop(&mut self) -> Option<T> {
        while self.head < self.items.len() {
            let item = self.items[self.head].take();
            self.head += 1;
            if item.is_some() {
                self.maybe_compact();
                return item;
            }
        }
        self.items.clear();
        self.head = 0;
        None
    }

    pub fn len(&self) -> usize {
        self.items.len() - self.head
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items[self.head..].iter().filter_map(Option::as_ref)
    }

    fn maybe_compact(&mut self) {
        if self.head >= COMPACT_THRESHOLD && self.head * 2 >= self.items.len() {
            self.compact();
        }
    }

    fn compact(&mut self) {
        self.items.drain(..self.head);
        self.head = 0;
    }

    /// Stable sort of the pending items; equal keys keep their FIFO order.
    pub fn sort_by_key<K, F>(&mut self, mut key: F)
    where
        K: Ord,
        F: FnMut(&T) -> K,
    {
        self.compact();
        self.items.sort_by_key(|item| item.as_ref().map(&mut key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut queue = WorkQueue::new();
        for n in 0..5 {
            queue.push(n);
        }
        assert_eq!(queue.pop(), Some(0));
        assert_eq!(queue.pop(), Some(1));
        queue.push(5);
        assert_eq!(queue.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4, 5]);
        assert_eq!(queue.len(), 4);
    }

    #[test]
    fn test_prefix_is_compacted() {
        let mut queue = WorkQueue::new();
        for n in 0..200 {
            queue.push(n);
        }
        for n in 0..150 {
            assert_eq!(queue.pop(), Some(n));
        }
        assert!(queue.items.len() < 200);
        assert_eq!(queue.len(), 50);
        assert_eq!(queue.iter().next(), Some(&150));
    }

    #[test]
    fn test_drained_queue_resets() {
        let mut queue = WorkQueue::new();
        queue.push('a');
        assert_eq!(queue.pop(), Some('a'));
        assert_eq!(queue.pop(), None);
        assert!(queue.is_empty());
        assert_eq!(queue.items.len(), 0);
    }

    #[test]
    fn test_sort_is_stable() {
        let mut queue = WorkQueue::new();
        for item in [(3, 'a'), (1, 'b'), (3, 'c'), (0, 'd')] {
            queue.push(item);
        }
        queue.pop();
        queue.sort_by_key(|&(distance, _)| distance);
        assert_eq!(
            queue.iter().map(|&(_, tag)| tag).collect::<String>(),
            "dbc"
        );
        assert_eq!(queue.pop(), Some((0, 'd')));
        assert_eq!(queue.pop(), Some((1, 'b')));
        assert_eq!(queue.pop(), Some((3, 'c')));
        assert_eq!(queue.pop(), None);
    }
}
