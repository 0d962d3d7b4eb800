//! Indexed binary heap with in-place priority updates.
//!
//! [`IndexedPriorityQueue`] is a min-heap or a max-heap (fixed at
//! construction) of distinct values, each carrying a mutable priority.
//!
//! Invariants, for an instance holding `n` entries:
//!
//! 1. `entries[0..n]` is a complete binary tree rooted at `entries[0]`; the
//!    parent of slot `k > 0` is `(k - 1) / 2`, its children are `2k + 1` and
//!    `2k + 2`.
//! 2. No entry belongs above its parent: in a min-heap a child's priority is
//!    never below its parent's, in a max-heap never above.
//! 3. Values are distinct, and `index` maps every value to its slot. Every
//!    swap rewrites both moved values' slots so membership checks and
//!    [`change_priority`] stay O(1).
//!
//! [`change_priority`]: IndexedPriorityQueue::change_priority

use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;

use crate::error::QueueError;

/// Backing capacity reserved by [`IndexedPriorityQueue::new`].
const INITIAL_CAPACITY: usize = 10;

/// Which end of the priority range sits at the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeapOrder {
    /// The lowest priority is extracted first.
    Min,
    /// The highest priority is extracted first.
    Max,
}

#[derive(Debug, Clone)]
struct Entry<V, P> {
    value: V,
    priority: P,
}

/// A min- or max-heap of distinct values with O(1) membership lookup.
#[derive(Debug, Clone)]
pub struct IndexedPriorityQueue<V, P> {
    order: HeapOrder,
    entries: Vec<Entry<V, P>>,
    index: HashMap<V, usize>,
}

impl<V, P> IndexedPriorityQueue<V, P>
where
    V: Clone + Eq + Hash,
    P: PartialOrd + Copy,
{
    /// Create an empty queue with the given ordering.
    pub fn new(order: HeapOrder) -> Self {
        Self {
            order,
            entries: Vec::with_capacity(INITIAL_CAPACITY),
            index: HashMap::with_capacity(INITIAL_CAPACITY),
        }
    }

    /// Create an empty min-ordered queue.
    pub fn min() -> Self {
        Self::new(HeapOrder::Min)
    }

    /// Create an empty max-ordered queue.
    pub fn max() -> Self {
        Self::new(HeapOrder::Max)
    }

    /// The ordering this queue was built with.
    pub const fn order(&self) -> HeapOrder {
        self.order
    }

    /// Number of values in the queue.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the queue holds no values.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `value` is in the queue.
    pub fn contains(&self, value: &V) -> bool {
        self.index.contains_key(value)
    }

    /// Current priority of `value`, if present.
    pub fn priority(&self, value: &V) -> Option<P> {
        let slot = *self.index.get(value)?;
        self.entries.get(slot).map(|entry| entry.priority)
    }

    /// Add `value` with `priority`.
    ///
    /// Expected time is logarithmic; worst case is linear when the backing
    /// storage has to grow.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::DuplicateKey`] if `value` is already present.
    pub fn insert(&mut self, value: V, priority: P) -> Result<(), QueueError> {
        if self.index.contains_key(&value) {
            return Err(QueueError::DuplicateKey);
        }
        let slot = self.entries.len();
        self.index.insert(value.clone(), slot);
        self.entries.push(Entry { value, priority });
        self.sift_up(slot);
        Ok(())
    }

    /// The value at the root without removing it.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::EmptyContainer`] if the queue is empty.
    pub fn peek(&self) -> Result<&V, QueueError> {
        self.entries
            .first()
            .map(|entry| &entry.value)
            .ok_or(QueueError::EmptyContainer)
    }

    /// Remove and return the value at the root.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::EmptyContainer`] if the queue is empty.
    pub fn poll(&mut self) -> Result<V, QueueError> {
        let last = self
            .entries
            .len()
            .checked_sub(1)
            .ok_or(QueueError::EmptyContainer)?;
        self.swap(0, last);
        let entry = self.entries.pop().ok_or(QueueError::EmptyContainer)?;
        self.index.remove(&entry.value);
        self.sift_down(0);
        Ok(entry.value)
    }

    /// Replace the priority of `value` and restore heap order.
    ///
    /// Nothing moves when the new priority compares equal to the old one.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::KeyNotFound`] if `value` is not present.
    pub fn change_priority(&mut self, value: &V, priority: P) -> Result<(), QueueError> {
        let slot = *self.index.get(value).ok_or(QueueError::KeyNotFound)?;
        let entry = self.entries.get_mut(slot).ok_or(QueueError::KeyNotFound)?;
        let old = entry.priority;
        entry.priority = priority;
        match self.outranks(priority, old) {
            Ordering::Equal => {}
            Ordering::Less => self.sift_down(slot),
            Ordering::Greater => self.sift_up(slot),
        }
        Ok(())
    }

    /// Three-way comparison of two priorities under this queue's ordering.
    ///
    /// `Greater` means a value with priority `a` belongs above one with
    /// priority `b`; `Equal` means the priorities are the same.
    fn outranks(&self, a: P, b: P) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        let above = match self.order {
            HeapOrder::Min => a < b,
            HeapOrder::Max => a > b,
        };
        if above {
            Ordering::Greater
        } else {
            Ordering::Less
        }
    }

    fn compare_slots(&self, h: usize, k: usize) -> Ordering {
        match (self.entries.get(h), self.entries.get(k)) {
            (Some(a), Some(b)) => self.outranks(a.priority, b.priority),
            _ => Ordering::Equal,
        }
    }

    fn swap(&mut self, h: usize, k: usize) {
        let len = self.entries.len();
        if h == k || h >= len || k >= len {
            return;
        }
        self.entries.swap(h, k);
        for slot in [h, k] {
            if let Some(entry) = self.entries.get(slot) {
                if let Some(position) = self.index.get_mut(&entry.value) {
                    *position = slot;
                }
            }
        }
    }

    /// Move the entry at `h` up while it strictly outranks its parent.
    fn sift_up(&mut self, mut h: usize) {
        while let Some(parent) = h.checked_sub(1).map(|above| above / 2) {
            if self.compare_slots(h, parent) != Ordering::Greater {
                return;
            }
            self.swap(h, parent);
            h = parent;
        }
    }

    /// Move the entry at `h` down while a child strictly outranks it.
    ///
    /// The left child is preferred when both children compare equal.
    fn sift_down(&mut self, mut h: usize) {
        let len = self.entries.len();
        loop {
            let Some(left) = h.checked_mul(2).and_then(|twice| twice.checked_add(1)) else {
                return;
            };
            if left >= len {
                return;
            }
            let right = left.saturating_add(1);
            let child = if right >= len || self.compare_slots(left, right) != Ordering::Less {
                left
            } else {
                right
            };
            if self.compare_slots(h, child) != Ordering::Less {
                return;
            }
            self.swap(h, child);
            h = child;
        }
    }
}
