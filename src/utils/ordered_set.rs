//! Insertion-ordered set with first-seen semantics.

use std::collections::HashSet;
use std::hash::Hash;

/// Keeps the first occurrence of every key and remembers insertion order.
///
/// Used wherever duplicates must be dropped while the original order still
/// matters (bill titles from the API, bills queued for one batch).
#[derive(Debug, Clone)]
pub struct OrderedSet<T> {
    seen: HashSet<T>,
    order: Vec<T>,
}

impl<T: Eq + Hash + Clone> OrderedSet<T> {
    pub fn new() -> Self {
        Self {
            seen: HashSet::new(),
            order: Vec::new(),
        }
    }

    /// Returns `true` if the value was not present before.
    pub fn insert(&mut self, value: T) -> bool {
        if self.seen.contains(&value) {
            return false;
        }
        self.seen.insert(value.clone());
        self.order.push(value);
        true
    }

    pub fn contains(&self, value: &T) -> bool {
        self.seen.contains(value)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.order.iter()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.order
    }
}

impl<T: Eq + Hash + Clone> Default for OrderedSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Eq + Hash + Clone> FromIterator<T> for OrderedSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}
