//! Insertion Order Module
//!
//! Tracks key insertion order for FIFO eviction.

use std::collections::VecDeque;

// == Insertion Order ==
/// Tracks the order in which keys were first inserted.
///
/// Keys are stored in a VecDeque where:
/// - Front = Oldest insertion
/// - Back = Newest insertion
///
/// Reads never reorder keys, and re-inserting a tracked key keeps its
/// original position.
#[derive(Debug, Default)]
pub struct InsertionOrder {
    order: VecDeque<String>,
}

impl InsertionOrder {
    // == Constructor ==
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Push ==
    /// Records a newly inserted key at the back.
    ///
    /// Callers only push keys that are not already tracked.
    pub fn push(&mut self, key: &str) {
        self.order.push_back(key.to_string());
    }

    // == Remove ==
    /// Removes a key from the tracker.
    pub fn remove(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
    }

    // == Evict Oldest ==
    /// Returns and removes the earliest inserted key.
    ///
    /// Returns None if tracker is empty.
    pub fn evict_oldest(&mut self) -> Option<String> {
        self.order.pop_front()
    }

    // == Peek Oldest ==
    /// Returns the earliest inserted key without removing it.
    #[cfg(test)]
    pub fn peek_oldest(&self) -> Option<&String> {
        self.order.front()
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
