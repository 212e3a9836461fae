//! Score-ordered candidate queues.

use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// An item tagged with the priority it was queued under.
#[derive(Debug, Clone)]
pub struct Prioritized<T> {
    pub priority: f64,
    pub item: T,
    seq: u64,
}

impl<T> PartialEq for Prioritized<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Prioritized<T> {}

impl<T> PartialOrd for Prioritized<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Prioritized<T> {
    // Max-heap on priority; equal priorities come out in insertion order.
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .total_cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Debug)]
struct FrontierState<T> {
    heap: BinaryHeap<Prioritized<T>>,
    next_seq: u64,
    rejected: u64,
}

/// Thread-safe max-priority queue of candidates.
///
/// With a capacity set, pushes into a full frontier are dropped and counted.
#[derive(Debug)]
pub struct Frontier<T> {
    state: Mutex<FrontierState<T>>,
    capacity: Option<usize>,
}

impl<T> Default for Frontier<T> {
    fn default() -> Self {
        Self::with_capacity(None)
    }
}

impl<T> Frontier<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            state: Mutex::new(FrontierState {
                heap: BinaryHeap::new(),
                next_seq: 0,
                rejected: 0,
            }),
            capacity,
        }
    }

    /// Queue `item`. Returns `false` if the frontier is full.
    pub fn push(&self, item: T, priority: f64) -> bool {
        let mut state = self.state.lock();
        if self.capacity.is_some_and(|cap| state.heap.len() >= cap) {
            state.rejected += 1;
            return false;
        }
        let seq = state.next_seq;
        state.next_seq += 1;
        state.heap.push(Prioritized {
            priority,
            item,
            seq,
        });
        true
    }

    /// Remove the highest-priority item.
    pub fn pop(&self) -> Option<Prioritized<T>> {
        self.state.lock().heap.pop()
    }

    pub fn len(&self) -> usize {
        self.state.lock().heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().heap.is_empty()
    }

    /// Pushes dropped because the frontier was full.
    pub fn rejected(&self) -> u64 {
        self.state.lock().rejected
    }

    /// Drop everything still queued; returns how many items were discarded.
    pub fn clear(&self) -> usize {
        let mut state = self.state.lock();
        let discarded = state.heap.len();
        state.heap.clear();
        discarded
    }
}
