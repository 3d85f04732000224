use crate::model::{CrawlURI, SchedulingDirective};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tokio::time::Instant;

/// Heap wrapper ordering pending URIs by directive, then ordinal
///
/// Comparisons are reversed so the lowest (directive, ordinal) pair pops
/// first from the max-heap: high-directive items run before normal ones, and
/// within a directive the smallest ordinal (earliest discovered) wins,
/// biasing the crawl toward breadth-first order.
#[derive(Debug)]
struct PendingUri(CrawlURI);

impl PendingUri {
    fn sort_key(&self) -> (SchedulingDirective, u64) {
        (self.0.scheduling_directive, self.0.ordinal())
    }
}

impl Ord for PendingUri {
    fn cmp(&self, other: &Self) -> Ordering {
        other.sort_key().cmp(&self.sort_key())
    }
}

impl PartialOrd for PendingUri {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PendingUri {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}

impl Eq for PendingUri {}

/// Pending CrawlURIs for one class key, plus the queue's scheduling state
///
/// A queue is in exactly one scheduling condition at a time: ready (may
/// dispatch), snoozed (wake-time not yet passed), or busy (its emitted URI
/// has not been reported finished). The topology tracks which; the queue
/// itself just holds the data.
#[derive(Debug)]
pub struct WorkQueue {
    key: String,

    /// Tie-breaking priority among ready queues (lower dispatches first)
    pub precedence: i32,

    /// Absolute time after which the queue may again be considered ready;
    /// None = ready now
    pub wake: Option<Instant>,

    /// URIs emitted from this queue and not yet reported finished
    pub in_flight: u32,

    pending: BinaryHeap<PendingUri>,
}

impl WorkQueue {
    pub fn new(key: impl Into<String>, precedence: i32) -> Self {
        Self {
            key: key.into(),
            precedence,
            wake: None,
            in_flight: 0,
            pending: BinaryHeap::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Adds a pending URI
    pub fn enqueue(&mut self, curi: CrawlURI) {
        self.pending.push(PendingUri(curi));
    }

    /// Removes and returns the highest-priority pending URI
    pub fn pop(&mut self) -> Option<CrawlURI> {
        self.pending.pop().map(|p| p.0)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Whether the wake-time gate currently blocks dispatch
    pub fn is_snoozed(&self, now: Instant) -> bool {
        matches!(self.wake, Some(wake) if wake > now)
    }

    /// Snoozes the queue until `wake`
    pub fn snooze_until(&mut self, wake: Instant) {
        self.wake = Some(wake);
    }

    /// Clears the wake-time gate
    pub fn clear_snooze(&mut self) {
        self.wake = None;
    }

    /// Clones the resident items, ordered by ordinal, for checkpointing
    pub fn items(&self) -> Vec<CrawlURI> {
        let mut items: Vec<CrawlURI> = self.pending.iter().map(|p| p.0.clone()).collect();
        items.sort_by_key(|c| c.ordinal());
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SchedulingDirective;

    fn curi(uri: &str, ordinal: u64) -> CrawlURI {
        let mut c = CrawlURI::parse(uri).unwrap();
        c.assign_ordinal(ordinal);
        c
    }

    #[test]
    fn test_pop_in_ordinal_order() {
        let mut queue = WorkQueue::new("com,example,", 3);
        queue.enqueue(curi("https://example.com/c", 3));
        queue.enqueue(curi("https://example.com/a", 1));
        queue.enqueue(curi("https://example.com/b", 2));

        assert_eq!(queue.pop().unwrap().ordinal(), 1);
        assert_eq!(queue.pop().unwrap().ordinal(), 2);
        assert_eq!(queue.pop().unwrap().ordinal(), 3);
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_directive_beats_ordinal() {
        let mut queue = WorkQueue::new("com,example,", 3);
        queue.enqueue(curi("https://example.com/early", 1));

        let mut urgent = curi("https://example.com/urgent", 9);
        urgent.scheduling_directive = SchedulingDirective::High;
        queue.enqueue(urgent);

        assert_eq!(queue.pop().unwrap().ordinal(), 9);
        assert_eq!(queue.pop().unwrap().ordinal(), 1);
    }

    #[test]
    fn test_snooze_state() {
        let mut queue = WorkQueue::new("com,example,", 3);
        let now = Instant::now();
        assert!(!queue.is_snoozed(now));

        queue.snooze_until(now + std::time::Duration::from_secs(5));
        assert!(queue.is_snoozed(now));
        assert!(!queue.is_snoozed(now + std::time::Duration::from_secs(6)));

        queue.clear_snooze();
        assert!(!queue.is_snoozed(now));
    }

    #[test]
    fn test_items_sorted_by_ordinal() {
        let mut queue = WorkQueue::new("com,example,", 3);
        queue.enqueue(curi("https://example.com/b", 5));
        queue.enqueue(curi("https://example.com/a", 2));

        let items = queue.items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].ordinal(), 2);
        assert_eq!(items[1].ordinal(), 5);
        // Non-destructive
        assert_eq!(queue.len(), 2);
    }
}
