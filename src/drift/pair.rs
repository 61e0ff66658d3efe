//! # Repository Pairs
//!
//! The watcher's schedule: one entry per watched Pattern, ordered by the time
//! its next drift check is due. The head of the queue is always the next pair
//! to check.

use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Identity of a watched Pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatternKey {
    pub name: String,
    pub namespace: String,
}

impl PatternKey {
    #[must_use]
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}

impl fmt::Display for PatternKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// One watched origin/target relationship and its polling schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryPair {
    key: PatternKey,
    interval: Duration,
    last_check: Option<Instant>,
    next_check: Instant,
}

impl RepositoryPair {
    fn new(key: PatternKey, interval: Duration, now: Instant) -> Self {
        Self {
            key,
            interval,
            last_check: None,
            next_check: now + interval,
        }
    }

    #[must_use]
    pub fn key(&self) -> &PatternKey {
        &self.key
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[must_use]
    pub fn last_check(&self) -> Option<Instant> {
        self.last_check
    }

    #[must_use]
    pub fn next_check(&self) -> Instant {
        self.next_check
    }
}

/// Repository pairs kept sorted ascending by `next_check`.
///
/// Pairs with equal `next_check` keep their insertion order. At most one pair
/// exists per [`PatternKey`].
#[derive(Debug, Default)]
pub struct RepositoryPairQueue {
    pairs: Vec<RepositoryPair>,
}

impl RepositoryPairQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The pair due soonest
    #[must_use]
    pub fn head(&self) -> Option<&RepositoryPair> {
        self.pairs.first()
    }

    #[must_use]
    pub fn get(&self, key: &PatternKey) -> Option<&RepositoryPair> {
        self.pairs.iter().find(|p| &p.key == key)
    }

    #[must_use]
    pub fn contains(&self, key: &PatternKey) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RepositoryPair> {
        self.pairs.iter()
    }

    /// Schedule `key` for `now + interval`, replacing any existing entry.
    /// Returns `true` when the key was not queued before.
    pub fn upsert(&mut self, key: PatternKey, interval: Duration, now: Instant) -> bool {
        let existed = self.take(&key).is_some();
        self.insert_sorted(RepositoryPair::new(key, interval, now));
        !existed
    }

    pub fn remove(&mut self, key: &PatternKey) -> Option<RepositoryPair> {
        self.take(key)
    }

    /// Record a finished check: `last_check = at`, `next_check = at + interval`.
    ///
    /// Does nothing if the pair is gone or was rescheduled past `at` while the
    /// check was running.
    pub fn complete_check(&mut self, key: &PatternKey, at: Instant) -> bool {
        let Some(index) = self.position(key) else {
            return false;
        };
        if self.pairs[index].next_check > at {
            return false;
        }
        let mut pair = self.pairs.remove(index);
        pair.last_check = Some(at);
        pair.next_check = at + pair.interval;
        self.insert_sorted(pair);
        true
    }

    fn position(&self, key: &PatternKey) -> Option<usize> {
        self.pairs.iter().position(|p| &p.key == key)
    }

    fn take(&mut self, key: &PatternKey) -> Option<RepositoryPair> {
        self.position(key).map(|index| self.pairs.remove(index))
    }

    fn insert_sorted(&mut self, pair: RepositoryPair) {
        let index = self
            .pairs
            .partition_point(|p| p.next_check <= pair.next_check);
        self.pairs.insert(index, pair);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    fn names(queue: &RepositoryPairQueue) -> Vec<&str> {
        queue.iter().map(|p| p.key().name.as_str()).collect()
    }

    #[test]
    fn test_queue_orders_by_next_check() {
        let now = Instant::now();
        let mut queue = RepositoryPairQueue::new();
        queue.upsert(PatternKey::new("four", "ns"), secs(4), now);
        queue.upsert(PatternKey::new("one", "ns"), secs(1), now);
        queue.upsert(PatternKey::new("five", "ns"), secs(5), now);
        queue.upsert(PatternKey::new("three", "ns"), secs(3), now);

        assert_eq!(names(&queue), ["one", "three", "four", "five"]);
        assert_eq!(queue.head().unwrap().key().name, "one");

        queue.remove(&PatternKey::new("one", "ns"));
        assert_eq!(queue.head().unwrap().key().name, "three");
    }

    #[test]
    fn test_equal_deadlines_keep_insertion_order() {
        let now = Instant::now();
        let mut queue = RepositoryPairQueue::new();
        queue.upsert(PatternKey::new("a", "ns"), secs(2), now);
        queue.upsert(PatternKey::new("b", "ns"), secs(2), now);
        queue.upsert(PatternKey::new("c", "ns"), secs(2), now);
        assert_eq!(names(&queue), ["a", "b", "c"]);
    }

    #[test]
    fn test_upsert_replaces_existing_entry() {
        let now = Instant::now();
        let mut queue = RepositoryPairQueue::new();
        assert!(queue.upsert(PatternKey::new("a", "ns"), secs(10), now));
        assert!(queue.upsert(PatternKey::new("b", "ns"), secs(5), now));
        assert!(!queue.upsert(PatternKey::new("a", "ns"), secs(1), now));

        assert_eq!(queue.len(), 2);
        assert_eq!(names(&queue), ["a", "b"]);
        assert_eq!(queue.head().unwrap().interval(), secs(1));
    }

    #[test]
    fn test_same_name_in_different_namespaces() {
        let now = Instant::now();
        let mut queue = RepositoryPairQueue::new();
        queue.upsert(PatternKey::new("p", "one"), secs(1), now);
        queue.upsert(PatternKey::new("p", "two"), secs(1), now);
        assert_eq!(queue.len(), 2);
        assert!(queue.remove(&PatternKey::new("p", "one")).is_some());
        assert!(queue.contains(&PatternKey::new("p", "two")));
    }

    #[test]
    fn test_complete_check_advances_schedule() {
        let now = Instant::now();
        let mut queue = RepositoryPairQueue::new();
        queue.upsert(PatternKey::new("fast", "ns"), secs(1), now);
        queue.upsert(PatternKey::new("slow", "ns"), secs(5), now);

        let fired_at = now + secs(1);
        assert!(queue.complete_check(&PatternKey::new("fast", "ns"), fired_at));
        let fast = queue.get(&PatternKey::new("fast", "ns")).unwrap();
        assert_eq!(fast.last_check(), Some(fired_at));
        assert_eq!(fast.next_check(), fired_at + secs(1));
        assert_eq!(queue.head().unwrap().key().name, "fast");
    }

    #[test]
    fn test_complete_check_keeps_newer_schedule() {
        let now = Instant::now();
        let mut queue = RepositoryPairQueue::new();
        let key = PatternKey::new("p", "ns");
        queue.upsert(key.clone(), secs(1), now);

        // Interval changed while the check was in flight
        queue.upsert(key.clone(), secs(30), now + secs(1));
        assert!(!queue.complete_check(&key, now + secs(2)));
        assert_eq!(queue.get(&key).unwrap().next_check(), now + secs(31));

        assert!(!queue.complete_check(&PatternKey::new("gone", "ns"), now));
    }

    #[test]
    fn test_pattern_key_display() {
        assert_eq!(PatternKey::new("mcg", "openshift-operators").to_string(), "openshift-operators/mcg");
    }
}
