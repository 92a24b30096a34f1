use std::collections::VecDeque;

/// A first-in-first-out lane of effects. Only the head runs; the owner calls
/// [`EffectQueue::advance`] when it has finished.
#[derive(Debug)]
pub struct EffectQueue<T> {
    items: VecDeque<T>,
}

impl<T> Default for EffectQueue<T> {
    fn default() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }
}

impl<T> EffectQueue<T> {
    /// Appends an item. Returns it when it landed at the head, meaning the
    /// caller should start it right away.
    pub fn push(&mut self, item: T) -> Option<&T> {
        let was_idle = self.is_empty();
        self.items.push_back(item);
        if was_idle {
            self.items.front()
        } else {
            None
        }
    }

    /// Drops the finished head and returns the next item to start, if any.
    pub fn advance(&mut self) -> Option<&T> {
        self.items.pop_front();
        self.items.front()
    }

    pub fn current(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_first_push_starts() {
        let mut queue = EffectQueue::default();
        assert_eq!(queue.push("a"), Some(&"a"));
        assert_eq!(queue.push("b"), None);
        assert_eq!(queue.push("c"), None);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.current(), Some(&"a"));
    }

    #[test]
    fn advance_is_fifo() {
        let mut queue = EffectQueue::default();
        queue.push(1);
        queue.push(2);
        queue.push(3);
        assert_eq!(queue.advance(), Some(&2));
        assert_eq!(queue.advance(), Some(&3));
        assert_eq!(queue.advance(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn advancing_an_empty_queue_is_a_no_op() {
        let mut queue: EffectQueue<u8> = EffectQueue::default();
        assert_eq!(queue.advance(), None);
        assert_eq!(queue.push(9), Some(&9));
    }
}
