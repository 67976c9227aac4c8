use super::BitSet;
use std::collections::VecDeque;

/// First in first out queue of indexes in which every index can be present at most once.
///
/// Pushing an index that is already queued does nothing, popping an index allows it to be pushed again.
///
/// # Example
/// ```
/// # use synclogic::data_structures::WorkQueue;
/// let mut queue = WorkQueue::new();
///
/// queue.seed(3);
/// assert_eq!(queue.push(1), false);
///
/// assert_eq!(queue.pop(), Some(0));
/// assert_eq!(queue.push(0), true);
///
/// assert_eq!(queue.pop(), Some(1));
/// assert_eq!(queue.pop(), Some(2));
/// assert_eq!(queue.pop(), Some(0));
/// assert_eq!(queue.pop(), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct WorkQueue {
    queue: VecDeque<usize>,
    queued: BitSet,
}

impl WorkQueue {
    /// Returns an empty [WorkQueue].
    pub fn new() -> Self {
        Self {
            queue: Default::default(),
            queued: Default::default(),
        }
    }

    /// Replaces the contents of the queue with `0..n` in ascending order.
    pub fn seed(&mut self, n: usize) {
        self.queue.clear();
        self.queued.clear();
        self.queue.extend(0..n);
        self.queued.fill(n);
    }

    /// Pops the index at the front of the queue.
    #[inline(always)]
    pub fn pop(&mut self) -> Option<usize> {
        let index = self.queue.pop_front()?;
        self.queued.remove(index);
        Some(index)
    }

    /// Pushes `index` to the back of the queue unless it is already queued.
    ///
    /// Returns true if the index was added.
    #[inline(always)]
    pub fn push(&mut self, index: usize) -> bool {
        self.queued.grow(index + 1);
        if self.queued.insert(index) {
            self.queue.push_back(index);
            true
        } else {
            false
        }
    }

    /// Pushes all the indexes in the iterator, skipping the ones already queued.
    pub fn extend<I: IntoIterator<Item = usize>>(&mut self, iter: I) {
        for index in iter {
            self.push(index);
        }
    }

    /// Returns true if `index` is waiting in the queue.
    pub fn contains(&self, index: usize) -> bool {
        index < self.queued.capacity() && self.queued.contains(index)
    }

    /// Removes every index from the queue.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.queued.clear();
    }

    /// Returns the number of queued indexes.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns true if no index is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut q = WorkQueue::new();

        q.extend(vec![5, 3, 9]);
        assert_eq!(q.pop(), Some(5));
        assert_eq!(q.pop(), Some(3));
        assert_eq!(q.pop(), Some(9));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn test_no_duplicates() {
        let mut q = WorkQueue::new();

        assert!(q.push(7));
        assert!(!q.push(7));
        assert_eq!(q.len(), 1);
        assert!(q.contains(7));

        assert_eq!(q.pop(), Some(7));
        assert!(!q.contains(7));
        assert!(q.push(7));
    }

    #[test]
    fn test_seed_replaces() {
        let mut q = WorkQueue::new();
        q.push(100);

        q.seed(2);
        assert!(!q.contains(100));
        assert_eq!(q.pop(), Some(0));
        assert_eq!(q.pop(), Some(1));
        assert!(q.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut q = WorkQueue::new();
        q.seed(10);
        q.clear();

        assert!(q.is_empty());
        assert!(!q.contains(3));
        assert!(q.push(3));
    }
}
