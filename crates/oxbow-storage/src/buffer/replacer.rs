//! LRU-K eviction policy for the buffer pool.
//!
//! LRU-K distinguishes frames by how much access history they have. A
//! frame with fewer than K recorded accesses has *infinite backward
//! K-distance* and is the preferred victim; such frames are ordered among
//! themselves by first access (FIFO). Frames with at least K accesses are
//! ordered by most recent access, oldest first — a deliberate
//! simplification of the textbook K-th-access ordering that keeps every
//! operation O(1) while preserving the scan-resistance that matters: a
//! burst of single-touch pages never displaces the hot set.

use super::frame::FrameId;

/// Which queue a frame currently sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Queue {
    /// Not tracked by the replacer.
    None,
    /// Fewer than K accesses: infinite backward K-distance.
    Inf,
    /// At least K accesses.
    Countable,
}

/// Per-frame bookkeeping, threaded into one of the two queues.
#[derive(Debug)]
struct Node {
    access_count: usize,
    evictable: bool,
    queue: Queue,
    prev: Option<usize>,
    next: Option<usize>,
}

impl Node {
    fn new() -> Self {
        Self {
            access_count: 0,
            evictable: false,
            queue: Queue::None,
            prev: None,
            next: None,
        }
    }
}

/// Head/tail of a queue threaded through the node array.
#[derive(Debug, Default)]
struct List {
    head: Option<usize>,
    tail: Option<usize>,
}

/// LRU-K replacer over a fixed set of frame indices.
///
/// The two queues are intrusive doubly-linked lists threaded through a
/// per-frame node array, so a frame's list position is a stable handle
/// and every operation is O(1) except the eviction scan, which skips
/// non-evictable frames.
///
/// Victim choice is deterministic for a fixed access history: the oldest
/// evictable frame in the infinite queue, else the least recently used
/// evictable frame in the countable queue.
pub struct LruKReplacer {
    nodes: Vec<Node>,
    inf: List,
    countable: List,
    /// Number of evictable frames across both queues.
    curr_size: usize,
    k: usize,
}

impl LruKReplacer {
    /// Creates a replacer for frame indices in `[0, num_frames)`.
    ///
    /// # Panics
    ///
    /// Panics if `k` is zero.
    pub fn new(num_frames: usize, k: usize) -> Self {
        assert!(k >= 1, "k must be >= 1");
        Self {
            nodes: (0..num_frames).map(|_| Node::new()).collect(),
            inf: List::default(),
            countable: List::default(),
            curr_size: 0,
            k,
        }
    }

    /// Returns the number of evictable frames.
    pub fn size(&self) -> usize {
        self.curr_size
    }

    /// Returns K.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Records an access to `frame_id`.
    ///
    /// A first access enters the frame into the infinite queue (or
    /// straight into the countable queue when K = 1), non-evictable.
    /// Subsequent accesses move the frame to its queue's tail, promoting
    /// it to the countable queue once the K-th access arrives.
    ///
    /// # Panics
    ///
    /// Panics if `frame_id` is out of range.
    pub fn record_access(&mut self, frame_id: FrameId) {
        let idx = frame_id.index();
        assert!(idx < self.nodes.len(), "frame id out of range: {idx}");

        if self.nodes[idx].queue == Queue::None {
            self.nodes[idx].access_count = 1;
            let queue = if self.k == 1 { Queue::Countable } else { Queue::Inf };
            self.push_back(queue, idx);
        } else {
            self.nodes[idx].access_count += 1;
            let queue = if self.nodes[idx].access_count < self.k {
                Queue::Inf
            } else {
                Queue::Countable
            };
            self.unlink(idx);
            self.push_back(queue, idx);
        }
    }

    /// Sets whether `frame_id` may be chosen as a victim.
    ///
    /// Unknown frames are ignored.
    ///
    /// # Panics
    ///
    /// Panics if `frame_id` is out of range.
    pub fn set_evictable(&mut self, frame_id: FrameId, evictable: bool) {
        let idx = frame_id.index();
        assert!(idx < self.nodes.len(), "frame id out of range: {idx}");

        let node = &mut self.nodes[idx];
        if node.queue == Queue::None || node.evictable == evictable {
            return;
        }
        node.evictable = evictable;
        if evictable {
            self.curr_size += 1;
        } else {
            self.curr_size -= 1;
        }
    }

    /// Selects, removes, and returns the best eviction candidate, or
    /// `None` when no evictable frame exists.
    ///
    /// The evicted frame's access history is discarded; a later access
    /// starts it over.
    pub fn evict(&mut self) -> Option<FrameId> {
        let victim = self
            .first_evictable(self.inf.head)
            .or_else(|| self.first_evictable(self.countable.head))?;
        self.remove_tracked(victim);
        Some(FrameId::new(victim))
    }

    /// Drops `frame_id` from the replacer, discarding its history.
    ///
    /// Untracked frames are ignored.
    ///
    /// # Panics
    ///
    /// Panics if the frame is tracked but not evictable (programmer
    /// error), or if `frame_id` is out of range.
    pub fn remove(&mut self, frame_id: FrameId) {
        let idx = frame_id.index();
        assert!(idx < self.nodes.len(), "frame id out of range: {idx}");

        if self.nodes[idx].queue == Queue::None {
            return;
        }
        assert!(
            self.nodes[idx].evictable,
            "removed an unevictable frame: {idx}"
        );
        self.remove_tracked(idx);
    }

    /// Walks a queue head-to-tail for the first evictable frame.
    fn first_evictable(&self, head: Option<usize>) -> Option<usize> {
        let mut cursor = head;
        while let Some(idx) = cursor {
            if self.nodes[idx].evictable {
                return Some(idx);
            }
            cursor = self.nodes[idx].next;
        }
        None
    }

    /// Unlinks an evictable tracked node and resets its history.
    fn remove_tracked(&mut self, idx: usize) {
        self.unlink(idx);
        self.nodes[idx].access_count = 0;
        self.nodes[idx].evictable = false;
        self.curr_size -= 1;
    }

    fn push_back(&mut self, queue: Queue, idx: usize) {
        let list = match queue {
            Queue::Inf => &self.inf,
            Queue::Countable => &self.countable,
            Queue::None => unreachable!("push_back to Queue::None"),
        };
        let tail = list.tail;

        self.nodes[idx].queue = queue;
        self.nodes[idx].prev = tail;
        self.nodes[idx].next = None;
        if let Some(t) = tail {
            self.nodes[t].next = Some(idx);
        }

        let list = match queue {
            Queue::Inf => &mut self.inf,
            Queue::Countable => &mut self.countable,
            Queue::None => unreachable!(),
        };
        if list.head.is_none() {
            list.head = Some(idx);
        }
        list.tail = Some(idx);
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next, queue) = {
            let node = &self.nodes[idx];
            (node.prev, node.next, node.queue)
        };

        if let Some(p) = prev {
            self.nodes[p].next = next;
        }
        if let Some(n) = next {
            self.nodes[n].prev = prev;
        }

        let list = match queue {
            Queue::Inf => &mut self.inf,
            Queue::Countable => &mut self.countable,
            Queue::None => unreachable!("unlink of untracked node"),
        };
        if list.head == Some(idx) {
            list.head = next;
        }
        if list.tail == Some(idx) {
            list.tail = prev;
        }

        self.nodes[idx].prev = None;
        self.nodes[idx].next = None;
        self.nodes[idx].queue = Queue::None;
    }
}

impl std::fmt::Debug for LruKReplacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruKReplacer")
            .field("num_frames", &self.nodes.len())
            .field("k", &self.k)
            .field("evictable", &self.curr_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fid(i: usize) -> FrameId {
        FrameId::new(i)
    }

    #[test]
    fn test_empty_replacer() {
        let mut replacer = LruKReplacer::new(4, 2);
        assert_eq!(replacer.size(), 0);
        assert_eq!(replacer.evict(), None);
    }

    #[test]
    fn test_new_frames_not_evictable() {
        let mut replacer = LruKReplacer::new(4, 2);
        replacer.record_access(fid(0));
        replacer.record_access(fid(1));

        assert_eq!(replacer.size(), 0);
        assert_eq!(replacer.evict(), None);
    }

    #[test]
    fn test_evictable_accounting() {
        let mut replacer = LruKReplacer::new(4, 2);
        replacer.record_access(fid(0));
        replacer.record_access(fid(1));

        replacer.set_evictable(fid(0), true);
        assert_eq!(replacer.size(), 1);
        replacer.set_evictable(fid(1), true);
        assert_eq!(replacer.size(), 2);

        // Redundant toggles must not skew the count.
        replacer.set_evictable(fid(0), true);
        assert_eq!(replacer.size(), 2);
        replacer.set_evictable(fid(0), false);
        assert_eq!(replacer.size(), 1);
        replacer.set_evictable(fid(0), false);
        assert_eq!(replacer.size(), 1);

        // Unknown frames are ignored.
        replacer.set_evictable(fid(3), true);
        assert_eq!(replacer.size(), 1);
    }

    #[test]
    fn test_infinite_distance_evicted_fifo() {
        let mut replacer = LruKReplacer::new(4, 2);
        replacer.record_access(fid(2));
        replacer.record_access(fid(0));
        replacer.record_access(fid(1));
        for i in 0..3 {
            replacer.set_evictable(fid(i), true);
        }

        // All have a single access: evict in first-access order.
        assert_eq!(replacer.evict(), Some(fid(2)));
        assert_eq!(replacer.evict(), Some(fid(0)));
        assert_eq!(replacer.evict(), Some(fid(1)));
        assert_eq!(replacer.evict(), None);
        assert_eq!(replacer.size(), 0);
    }

    #[test]
    fn test_short_history_preferred_over_full_history() {
        // K = 2, accesses 1, 2, 3, 1, 2: frame 3 still has infinite
        // distance and goes first, then 1 and 2 by recency.
        let mut replacer = LruKReplacer::new(4, 2);
        for &i in &[1usize, 2, 3, 1, 2] {
            replacer.record_access(fid(i));
        }
        for i in 1..4 {
            replacer.set_evictable(fid(i), true);
        }

        assert_eq!(replacer.evict(), Some(fid(3)));
        assert_eq!(replacer.evict(), Some(fid(1)));
        assert_eq!(replacer.evict(), Some(fid(2)));
        assert_eq!(replacer.evict(), None);
    }

    #[test]
    fn test_k_equals_one_is_lru() {
        let mut replacer = LruKReplacer::new(4, 1);
        replacer.record_access(fid(0));
        replacer.record_access(fid(1));
        replacer.record_access(fid(2));
        replacer.record_access(fid(0)); // touch 0 again
        for i in 0..3 {
            replacer.set_evictable(fid(i), true);
        }

        assert_eq!(replacer.evict(), Some(fid(1)));
        assert_eq!(replacer.evict(), Some(fid(2)));
        assert_eq!(replacer.evict(), Some(fid(0)));
    }

    #[test]
    fn test_eviction_skips_pinned() {
        let mut replacer = LruKReplacer::new(4, 2);
        replacer.record_access(fid(0));
        replacer.record_access(fid(1));
        replacer.set_evictable(fid(1), true);

        // Frame 0 is older but not evictable.
        assert_eq!(replacer.evict(), Some(fid(1)));
        assert_eq!(replacer.evict(), None);
    }

    #[test]
    fn test_history_resets_after_evict() {
        let mut replacer = LruKReplacer::new(2, 2);
        replacer.record_access(fid(0));
        replacer.record_access(fid(0)); // now countable
        replacer.record_access(fid(1));
        replacer.set_evictable(fid(0), true);
        replacer.set_evictable(fid(1), true);

        // Frame 1 has infinite distance, so it goes first.
        assert_eq!(replacer.evict(), Some(fid(1)));

        // Re-accessed after eviction, frame 1 starts over with a single
        // access and is again preferred over the countable frame 0.
        replacer.record_access(fid(1));
        replacer.set_evictable(fid(1), true);
        assert_eq!(replacer.evict(), Some(fid(1)));
        assert_eq!(replacer.evict(), Some(fid(0)));
    }

    #[test]
    fn test_remove_untracked_is_noop() {
        let mut replacer = LruKReplacer::new(4, 2);
        replacer.remove(fid(0));
        assert_eq!(replacer.size(), 0);
    }

    #[test]
    fn test_remove_discards_history() {
        let mut replacer = LruKReplacer::new(4, 2);
        replacer.record_access(fid(0));
        replacer.record_access(fid(1));
        replacer.set_evictable(fid(0), true);
        replacer.set_evictable(fid(1), true);

        replacer.remove(fid(0));
        assert_eq!(replacer.size(), 1);
        assert_eq!(replacer.evict(), Some(fid(1)));
    }

    #[test]
    #[should_panic(expected = "unevictable")]
    fn test_remove_unevictable_panics() {
        let mut replacer = LruKReplacer::new(4, 2);
        replacer.record_access(fid(0));
        replacer.remove(fid(0));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_out_of_range_frame_panics() {
        let mut replacer = LruKReplacer::new(4, 2);
        replacer.record_access(fid(4));
    }

    #[test]
    fn test_promotion_to_countable_tail() {
        let mut replacer = LruKReplacer::new(4, 2);
        // Frames 0 and 1 both reach K accesses; 0 was touched most
        // recently, so 1 is the older countable entry.
        replacer.record_access(fid(0));
        replacer.record_access(fid(1));
        replacer.record_access(fid(1));
        replacer.record_access(fid(0));
        replacer.set_evictable(fid(0), true);
        replacer.set_evictable(fid(1), true);

        assert_eq!(replacer.evict(), Some(fid(1)));
        assert_eq!(replacer.evict(), Some(fid(0)));
    }
}
