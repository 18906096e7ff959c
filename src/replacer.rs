use hashlink::LinkedHashMap;
use parking_lot::Mutex;

use crate::page::FrameId;

/// Tracks the frames that are candidates for eviction. The buffer pool moves
/// a frame out of the candidate set the instant it is pinned and back in only
/// when its pin count returns to zero; the replacer itself never consults pin
/// counts. All methods are internally synchronized.
pub trait Replacer: Send + Sync {
    /// Adds `frame_id` at the most-recently-marked end of the recency order.
    /// No-op if the frame is already a candidate.
    fn mark_evictable(&self, frame_id: FrameId);

    /// Removes `frame_id` from the candidate set regardless of its position.
    /// No-op if absent.
    fn pin(&self, frame_id: FrameId);

    /// Removes and returns the least-recently-marked candidate, or `None`
    /// when the set is empty.
    fn victim(&self) -> Option<FrameId>;

    /// Number of current candidates.
    fn size(&self) -> usize;
}

/// Eviction policy selected when a buffer pool instance is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacerPolicy {
    Lru,
}

impl ReplacerPolicy {
    pub(crate) fn build(self, capacity: usize) -> Box<dyn Replacer> {
        match self {
            ReplacerPolicy::Lru => Box::new(LruReplacer::new(capacity)),
        }
    }
}

/// Least-recently-used policy: victims come out in the order the frames were
/// marked evictable. The linked hash map gives O(1) membership, removal and
/// oldest-first pop.
pub struct LruReplacer {
    capacity: usize,
    // front = least recently marked evictable
    queue: Mutex<LinkedHashMap<FrameId, ()>>,
}

impl LruReplacer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            queue: Mutex::new(LinkedHashMap::with_capacity(capacity)),
        }
    }
}

impl Replacer for LruReplacer {
    fn mark_evictable(&self, frame_id: FrameId) {
        let mut queue = self.queue.lock();
        if queue.contains_key(&frame_id) || queue.len() >= self.capacity {
            return;
        }
        queue.insert(frame_id, ());
    }

    fn pin(&self, frame_id: FrameId) {
        self.queue.lock().remove(&frame_id);
    }

    fn victim(&self) -> Option<FrameId> {
        self.queue.lock().pop_front().map(|(frame_id, ())| frame_id)
    }

    fn size(&self) -> usize {
        self.queue.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_replacer() {
        let replacer = LruReplacer::new(10);

        assert_eq!(replacer.size(), 0);
        assert_eq!(replacer.victim(), None);
    }

    #[test]
    fn test_victim_in_mark_order() {
        let replacer = LruReplacer::new(10);
        replacer.mark_evictable(3);
        replacer.mark_evictable(1);
        replacer.mark_evictable(2);

        assert_eq!(replacer.size(), 3);
        assert_eq!(replacer.victim(), Some(3));
        assert_eq!(replacer.victim(), Some(1));
        assert_eq!(replacer.victim(), Some(2));
        assert_eq!(replacer.victim(), None);
    }

    #[test]
    fn test_pin_removes_candidate() {
        let replacer = LruReplacer::new(10);
        replacer.mark_evictable(0);
        replacer.mark_evictable(1);
        replacer.mark_evictable(2);

        replacer.pin(1);

        assert_eq!(replacer.size(), 2);
        assert_eq!(replacer.victim(), Some(0));
        assert_eq!(replacer.victim(), Some(2));
    }

    #[test]
    fn test_pin_absent_is_noop() {
        let replacer = LruReplacer::new(10);
        replacer.mark_evictable(0);

        replacer.pin(42);

        assert_eq!(replacer.size(), 1);
    }

    #[test]
    fn test_remark_keeps_position() {
        let replacer = LruReplacer::new(10);
        replacer.mark_evictable(1);
        replacer.mark_evictable(2);
        // already a candidate, must not move to the back
        replacer.mark_evictable(1);

        assert_eq!(replacer.size(), 2);
        assert_eq!(replacer.victim(), Some(1));
        assert_eq!(replacer.victim(), Some(2));
    }

    #[test]
    fn test_capacity_is_never_exceeded() {
        let replacer = LruReplacer::new(2);
        replacer.mark_evictable(0);
        replacer.mark_evictable(1);
        replacer.mark_evictable(2);

        assert_eq!(replacer.size(), 2);
    }

    #[test]
    fn test_pin_then_remark_moves_to_back() {
        let replacer = LruReplacer::new(10);
        replacer.mark_evictable(1);
        replacer.mark_evictable(2);

        replacer.pin(1);
        replacer.mark_evictable(1);

        assert_eq!(replacer.victim(), Some(2));
        assert_eq!(replacer.victim(), Some(1));
    }

    #[test]
    fn test_policy_builds_lru() {
        let replacer = ReplacerPolicy::Lru.build(4);
        replacer.mark_evictable(0);
        replacer.mark_evictable(1);

        assert_eq!(replacer.victim(), Some(0));
    }
}
