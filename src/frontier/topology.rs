use crate::frontier::precedence::PrecedencePolicy;
use crate::frontier::work_queue::WorkQueue;
use crate::model::CrawlURI;
use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap, HashSet};
use tokio::time::Instant;

/// One queue's resident contents, exported for checkpointing
#[derive(Debug)]
pub struct QueueExport {
    pub key: String,
    pub precedence: i32,
    pub items: Vec<CrawlURI>,
}

/// Point-in-time queue population counts for reports
#[derive(Debug, Clone, Copy, Default)]
pub struct TopologyStats {
    pub queues: usize,
    pub ready: usize,
    pub snoozed: usize,
    pub busy: usize,
    pub pending_uris: u64,
    pub in_flight_uris: u64,
}

/// Queue-topology strategy: how work queues are organized and selected
///
/// The manager depends only on this interface; the default implementation is
/// [`ReadySnoozedTopology`]. Every CrawlURI handed to `enqueue` must already
/// carry its class key.
pub trait QueueTopology: Send {
    /// Adds a URI to its queue, creating the queue with the given precedence
    /// on first sight of the class key
    fn enqueue(&mut self, curi: CrawlURI, precedence: i32);

    /// Returns the next eligible URI: the head of the best-precedence ready
    /// queue whose wake-time has passed. The chosen queue becomes busy until
    /// the matching [`finish`](QueueTopology::finish).
    fn find_eligible(&mut self, now: Instant) -> Option<CrawlURI>;

    /// Reports the in-flight URI for `class_key` done. `retry` re-enqueues
    /// the URI for another attempt; `snooze_until` keeps the queue
    /// ineligible until that time (politeness or retry delay).
    fn finish(
        &mut self,
        class_key: &str,
        retry: Option<CrawlURI>,
        snooze_until: Option<Instant>,
        now: Instant,
    );

    /// Soonest wake-time among snoozed queues
    fn next_wake(&mut self, now: Instant) -> Option<Instant>;

    /// URIs resident in queues (excludes in-flight)
    fn pending_count(&self) -> u64;

    /// URIs emitted and not yet finished
    fn in_flight_count(&self) -> u64;

    /// Re-applies the precedence policy to every live queue
    fn reevaluate(&mut self, policy: &dyn PrecedencePolicy);

    fn stats(&self) -> TopologyStats;

    /// Clones all resident queue contents for checkpointing
    fn export(&self) -> Vec<QueueExport>;
}

/// Default two-set topology: ready queues ordered by precedence, snoozed
/// queues in a wake-time min-heap
///
/// Every live queue is in exactly one of three places: the ready set, the
/// snoozed heap, or the busy set (one URI in flight). Queues that go empty
/// while unsnoozed are retired from memory and recreated on demand, keeping
/// the resident footprint proportional to active hosts rather than all hosts
/// ever seen.
pub struct ReadySnoozedTopology {
    queues: HashMap<String, WorkQueue>,

    /// (precedence, key) pairs eligible for dispatch; lowest first
    ready: BTreeSet<(i32, String)>,

    /// Min-heap of (wake, key) for snoozed queues
    snoozed: BinaryHeap<Reverse<(Instant, String)>>,

    /// Keys with a URI in flight
    busy: HashSet<String>,

    pending: u64,
    in_flight: u64,
}

impl ReadySnoozedTopology {
    pub fn new() -> Self {
        Self {
            queues: HashMap::new(),
            ready: BTreeSet::new(),
            snoozed: BinaryHeap::new(),
            busy: HashSet::new(),
            pending: 0,
            in_flight: 0,
        }
    }

    /// Moves queues whose wake-time has passed back to the ready set,
    /// retiring any that woke up empty
    fn wake_due(&mut self, now: Instant) {
        while let Some(Reverse((wake, _))) = self.snoozed.peek() {
            if *wake > now {
                break;
            }
            let Reverse((_, key)) = self.snoozed.pop().unwrap();

            let Some(queue) = self.queues.get_mut(&key) else {
                continue;
            };
            queue.clear_snooze();

            if self.busy.contains(&key) {
                continue;
            }
            if queue.is_empty() {
                self.queues.remove(&key);
            } else {
                self.ready.insert((queue.precedence, key));
            }
        }
    }
}

impl Default for ReadySnoozedTopology {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueTopology for ReadySnoozedTopology {
    fn enqueue(&mut self, curi: CrawlURI, precedence: i32) {
        let Some(key) = curi.class_key().map(str::to_owned) else {
            tracing::warn!("dropping CrawlURI without class key: {}", curi);
            return;
        };

        let queue = self
            .queues
            .entry(key.clone())
            .or_insert_with(|| WorkQueue::new(key.clone(), precedence));
        queue.enqueue(curi);
        self.pending += 1;

        // Snoozed or busy queues get re-readied by wake_due/finish
        if !self.busy.contains(&key) && queue.wake.is_none() {
            self.ready.insert((queue.precedence, key));
        }
    }

    fn find_eligible(&mut self, now: Instant) -> Option<CrawlURI> {
        self.wake_due(now);

        while let Some(entry) = self.ready.iter().next().cloned() {
            self.ready.remove(&entry);
            let (_, key) = entry;

            let Some(queue) = self.queues.get_mut(&key) else {
                continue;
            };
            let Some(curi) = queue.pop() else {
                // Ready entry for a drained queue; retire it
                self.queues.remove(&key);
                continue;
            };

            queue.in_flight += 1;
            self.in_flight += 1;
            self.pending -= 1;
            self.busy.insert(key);
            return Some(curi);
        }

        None
    }

    fn finish(
        &mut self,
        class_key: &str,
        retry: Option<CrawlURI>,
        snooze_until: Option<Instant>,
        now: Instant,
    ) {
        if !self.busy.remove(class_key) {
            tracing::warn!(key = class_key, "finish for a queue with nothing in flight");
            return;
        }
        self.in_flight = self.in_flight.saturating_sub(1);

        let Some(queue) = self.queues.get_mut(class_key) else {
            return;
        };
        queue.in_flight = queue.in_flight.saturating_sub(1);

        if let Some(curi) = retry {
            queue.enqueue(curi);
            self.pending += 1;
        }

        match snooze_until.filter(|wake| *wake > now) {
            Some(wake) => {
                queue.snooze_until(wake);
                self.snoozed.push(Reverse((wake, class_key.to_string())));
            }
            None => {
                if queue.is_empty() {
                    self.queues.remove(class_key);
                } else {
                    self.ready.insert((queue.precedence, class_key.to_string()));
                }
            }
        }
    }

    fn next_wake(&mut self, now: Instant) -> Option<Instant> {
        self.wake_due(now);
        self.snoozed.peek().map(|Reverse((wake, _))| *wake)
    }

    fn pending_count(&self) -> u64 {
        self.pending
    }

    fn in_flight_count(&self) -> u64 {
        self.in_flight
    }

    fn reevaluate(&mut self, policy: &dyn PrecedencePolicy) {
        for (key, queue) in &mut self.queues {
            let updated = policy.queue_reevaluate(key, queue.precedence);
            if updated == queue.precedence {
                continue;
            }
            if self.ready.remove(&(queue.precedence, key.clone())) {
                self.ready.insert((updated, key.clone()));
            }
            queue.precedence = updated;
        }
    }

    fn stats(&self) -> TopologyStats {
        TopologyStats {
            queues: self.queues.len(),
            ready: self.ready.len(),
            snoozed: self.snoozed.len(),
            busy: self.busy.len(),
            pending_uris: self.pending,
            in_flight_uris: self.in_flight,
        }
    }

    fn export(&self) -> Vec<QueueExport> {
        let mut exports: Vec<QueueExport> = self
            .queues
            .values()
            .map(|queue| QueueExport {
                key: queue.key().to_string(),
                precedence: queue.precedence,
                items: queue.items(),
            })
            .collect();
        exports.sort_by(|a, b| a.key.cmp(&b.key));
        exports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontier::precedence::BasePrecedencePolicy;
    use std::time::Duration;

    fn curi(uri: &str, key: &str, ordinal: u64) -> CrawlURI {
        let mut c = CrawlURI::parse(uri).unwrap();
        c.set_class_key(key.to_string());
        c.assign_ordinal(ordinal);
        c
    }

    #[tokio::test]
    async fn test_enqueue_and_find_eligible() {
        let mut topo = ReadySnoozedTopology::new();
        topo.enqueue(curi("https://example.com/a", "com,example,", 1), 3);

        let now = Instant::now();
        let found = topo.find_eligible(now).unwrap();
        assert_eq!(found.ordinal(), 1);
        assert_eq!(topo.pending_count(), 0);
        assert_eq!(topo.in_flight_count(), 1);

        // Queue is busy; nothing else eligible
        assert!(topo.find_eligible(now).is_none());
    }

    #[tokio::test]
    async fn test_one_in_flight_per_queue() {
        let mut topo = ReadySnoozedTopology::new();
        topo.enqueue(curi("https://example.com/a", "com,example,", 1), 3);
        topo.enqueue(curi("https://example.com/b", "com,example,", 2), 3);

        let now = Instant::now();
        assert!(topo.find_eligible(now).is_some());
        // Second item same queue: blocked until finish
        assert!(topo.find_eligible(now).is_none());

        topo.finish("com,example,", None, None, now);
        let second = topo.find_eligible(now).unwrap();
        assert_eq!(second.ordinal(), 2);
    }

    #[tokio::test]
    async fn test_precedence_breaks_ties() {
        let mut topo = ReadySnoozedTopology::new();
        topo.enqueue(curi("https://slow.org/a", "org,slow,", 1), 5);
        topo.enqueue(curi("https://fast.org/a", "org,fast,", 2), 1);

        let now = Instant::now();
        let first = topo.find_eligible(now).unwrap();
        assert_eq!(first.class_key(), Some("org,fast,"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_snooze_gates_dispatch() {
        let mut topo = ReadySnoozedTopology::new();
        topo.enqueue(curi("https://example.com/a", "com,example,", 1), 3);
        topo.enqueue(curi("https://example.com/b", "com,example,", 2), 3);

        let now = Instant::now();
        assert!(topo.find_eligible(now).is_some());
        topo.finish(
            "com,example,",
            None,
            Some(now + Duration::from_secs(3)),
            now,
        );

        // Still snoozed
        assert!(topo.find_eligible(now + Duration::from_secs(1)).is_none());
        assert_eq!(
            topo.next_wake(now + Duration::from_secs(1)),
            Some(now + Duration::from_secs(3))
        );

        // Wake-time passed
        let later = now + Duration::from_secs(3);
        let found = topo.find_eligible(later).unwrap();
        assert_eq!(found.ordinal(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_snoozed_queue_retired_on_wake() {
        let mut topo = ReadySnoozedTopology::new();
        topo.enqueue(curi("https://example.com/a", "com,example,", 1), 3);

        let now = Instant::now();
        assert!(topo.find_eligible(now).is_some());
        topo.finish(
            "com,example,",
            None,
            Some(now + Duration::from_secs(3)),
            now,
        );
        assert_eq!(topo.stats().snoozed, 1);

        // Nothing pending when the snooze expires; the queue goes away
        assert!(topo.find_eligible(now + Duration::from_secs(4)).is_none());
        assert_eq!(topo.stats().queues, 0);
    }

    #[tokio::test]
    async fn test_empty_queue_retired_on_finish() {
        let mut topo = ReadySnoozedTopology::new();
        topo.enqueue(curi("https://example.com/a", "com,example,", 1), 3);

        let now = Instant::now();
        assert!(topo.find_eligible(now).is_some());
        topo.finish("com,example,", None, None, now);
        assert_eq!(topo.stats().queues, 0);

        // Recreated on demand
        topo.enqueue(curi("https://example.com/b", "com,example,", 2), 3);
        assert_eq!(topo.stats().queues, 1);
    }

    #[tokio::test]
    async fn test_retry_requeues() {
        let mut topo = ReadySnoozedTopology::new();
        topo.enqueue(curi("https://example.com/a", "com,example,", 1), 3);

        let now = Instant::now();
        let taken = topo.find_eligible(now).unwrap();
        topo.finish("com,example,", Some(taken), None, now);

        assert_eq!(topo.pending_count(), 1);
        let again = topo.find_eligible(now).unwrap();
        assert_eq!(again.ordinal(), 1);
    }

    #[tokio::test]
    async fn test_enqueue_while_busy_stays_pending() {
        let mut topo = ReadySnoozedTopology::new();
        topo.enqueue(curi("https://example.com/a", "com,example,", 1), 3);

        let now = Instant::now();
        assert!(topo.find_eligible(now).is_some());

        // Discovered while the queue's head is in flight
        topo.enqueue(curi("https://example.com/b", "com,example,", 2), 3);
        assert!(topo.find_eligible(now).is_none());

        topo.finish("com,example,", None, None, now);
        assert!(topo.find_eligible(now).is_some());
    }

    #[tokio::test]
    async fn test_reevaluate_moves_ready_entries() {
        let mut topo = ReadySnoozedTopology::new();
        topo.enqueue(curi("https://a.org/x", "org,a,", 5), 5);
        topo.enqueue(curi("https://b.org/x", "org,b,", 6), 5);

        // Promote org,b, above org,a,
        let config = crate::config::QueueConfig {
            base_precedence: 5,
            force_class_key: None,
            precedence_overrides: vec![crate::config::PrecedenceOverride {
                authority: "org,b,".to_string(),
                precedence: 1,
            }],
        };
        let policy = BasePrecedencePolicy::from_config(&config);
        topo.reevaluate(&policy);

        let now = Instant::now();
        let first = topo.find_eligible(now).unwrap();
        assert_eq!(first.class_key(), Some("org,b,"));
    }

    #[tokio::test]
    async fn test_export_sorted_and_nondestructive() {
        let mut topo = ReadySnoozedTopology::new();
        topo.enqueue(curi("https://b.org/x", "org,b,", 2), 3);
        topo.enqueue(curi("https://a.org/x", "org,a,", 1), 3);

        let exports = topo.export();
        assert_eq!(exports.len(), 2);
        assert_eq!(exports[0].key, "org,a,");
        assert_eq!(exports[1].key, "org,b,");
        assert_eq!(topo.pending_count(), 2);
    }
}
