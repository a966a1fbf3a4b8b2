use std::{collections::HashSet, hash::Hash};

use super::MtResource;

/// A thread-safe set with an atomic "insert if absent" operation.
///
/// `ConcurrentSet` is used to coalesce background work: a chunk position is only
/// published to the task manager when `add` reports that it was newly inserted, so
/// repeated requests against a chunk that is already queued collapse into one task.
///
/// Clones share the same underlying set.
///
/// # Examples
/// ```
/// use curved_voxel_engine::core::ConcurrentSet;
///
/// let queued = ConcurrentSet::new();
/// assert!(queued.add(7));
/// assert!(!queued.add(7));
/// assert!(queued.contains(&7));
/// assert!(queued.remove(&7));
/// assert!(!queued.contains(&7));
/// ```
pub struct ConcurrentSet<T: Eq + Hash + Send + Sync> {
    items: MtResource<HashSet<T>>,
}

impl<T: Eq + Hash + Send + Sync + 'static> ConcurrentSet<T> {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self {
            items: MtResource::new(HashSet::new()),
        }
    }

    /// Inserts `item` if it is not already present.
    ///
    /// The membership test and the insertion happen under one write lock.
    ///
    /// # Returns
    /// `true` if the item was inserted, `false` if it was already present
    pub fn add(&self, item: T) -> bool {
        self.items.get_mut().insert(item)
    }

    /// Returns whether `item` is currently in the set.
    pub fn contains(&self, item: &T) -> bool {
        self.items.get().contains(item)
    }

    /// Removes `item` from the set.
    ///
    /// # Returns
    /// `true` if the item was present
    pub fn remove(&self, item: &T) -> bool {
        self.items.get_mut().remove(item)
    }

    /// Number of items currently in the set.
    pub fn len(&self) -> usize {
        self.items.get().len()
    }

    /// Returns `true` if the set holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.get().is_empty()
    }

    /// Keeps only the items for which `keep` returns `true`, under one write lock.
    ///
    /// # Returns
    /// The number of items removed
    pub fn retain(&self, mut keep: impl FnMut(&T) -> bool) -> usize {
        let mut items = self.items.get_mut();
        let before = items.len();
        items.retain(|item| keep(item));
        before - items.len()
    }

    /// Removes every item.
    pub fn clear(&self) {
        self.items.get_mut().clear();
    }
}

impl<T: Eq + Hash + Send + Sync + 'static> Default for ConcurrentSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Eq + Hash + Send + Sync> Clone for ConcurrentSet<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Barrier},
        thread,
    };

    use super::*;

    #[test]
    fn racing_adds_insert_exactly_once() {
        for _ in 0..64 {
            let set = ConcurrentSet::new();
            let barrier = Arc::new(Barrier::new(2));

            let handles: Vec<_> = (0..2)
                .map(|_| {
                    let set = set.clone();
                    let barrier = barrier.clone();
                    thread::spawn(move || {
                        barrier.wait();
                        set.add((1, 2, 3))
                    })
                })
                .collect();

            let inserted: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
            assert_eq!(inserted.iter().filter(|was| **was).count(), 1);
            assert!(set.contains(&(1, 2, 3)));
        }
    }

    #[test]
    fn remove_then_contains_is_false() {
        let set = ConcurrentSet::new();
        assert!(set.add("chunk"));
        assert_eq!(set.len(), 1);
        assert!(set.remove(&"chunk"));
        assert!(!set.contains(&"chunk"));
        assert!(!set.remove(&"chunk"));
        assert!(set.is_empty());
    }

    #[test]
    fn retain_reports_removed_items() {
        let set = ConcurrentSet::new();
        for value in 0..10 {
            set.add(value);
        }
        assert_eq!(set.retain(|value| value % 2 == 0), 5);
        assert!(set.contains(&4));
        assert!(!set.contains(&3));
    }

    #[test]
    fn clones_share_membership() {
        let set = ConcurrentSet::new();
        let other = set.clone();
        set.add(5u32);
        assert!(other.contains(&5));
        other.clear();
        assert!(!set.contains(&5));
    }
}
