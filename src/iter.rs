//! Guarded iteration.
//!
//! An iterator walks slot positions. It records the table's live count and
//! generation when created and checks both before every step; a mismatch
//! means entries may have moved, so it reports
//! [`DictError::IterationInvalidated`] once and then stays exhausted.

use core::iter::FusedIterator;

use crate::dict::Dict;
use crate::error::DictError;
use crate::error::Result;
use crate::key::DictKey;

/// Iterator over the `(key, value)` pairs of a [`Dict`].
///
/// This struct is created by [`Dict::iter`].
pub struct Iter<'a, K, V> {
    dict: &'a Dict<K, V>,
    pos: usize,
    used: usize,
    generation: u64,
    done: bool,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(dict: &'a Dict<K, V>) -> Self {
        Self {
            dict,
            pos: 0,
            used: dict.len(),
            generation: dict.generation(),
            done: false,
        }
    }
}

impl<K: DictKey, V: Clone> Iterator for Iter<'_, K, V> {
    type Item = Result<(K, V)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if self.dict.len() != self.used || self.dict.generation() != self.generation {
            self.done = true;
            return Some(Err(DictError::IterationInvalidated));
        }

        match self.dict.next_entry(&mut self.pos) {
            Some(pair) => Some(Ok(pair)),
            None => {
                self.done = true;
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            (0, Some(0))
        } else {
            (0, Some(self.used + 1))
        }
    }
}

impl<K: DictKey, V: Clone> FusedIterator for Iter<'_, K, V> {}

/// Iterator over the keys of a [`Dict`].
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Keys<'a, K, V> {
    pub(crate) fn new(inner: Iter<'a, K, V>) -> Self {
        Self { inner }
    }
}

impl<K: DictKey, V: Clone> Iterator for Keys<'_, K, V> {
    type Item = Result<K>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|r| r.map(|(k, _)| k))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K: DictKey, V: Clone> FusedIterator for Keys<'_, K, V> {}

/// Iterator over the values of a [`Dict`].
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Values<'a, K, V> {
    pub(crate) fn new(inner: Iter<'a, K, V>) -> Self {
        Self { inner }
    }
}

impl<K: DictKey, V: Clone> Iterator for Values<'_, K, V> {
    type Item = Result<V>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|r| r.map(|(_, v)| v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K: DictKey, V: Clone> FusedIterator for Values<'_, K, V> {}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    #[test]
    fn test_sticky_after_invalidation() {
        let dict: Dict<i64, i64> = Dict::new();
        for i in 0..5 {
            dict.set(i, i as u64, i).unwrap();
        }

        let mut keys = dict.keys();
        keys.next().unwrap().unwrap();
        dict.delete(&4, 4).unwrap();
        assert!(matches!(keys.next(), Some(Err(DictError::IterationInvalidated))));

        // Restoring the count does not revive the iterator.
        dict.set(4, 4, 4).unwrap();
        assert!(keys.next().is_none());
        assert_eq!(keys.size_hint(), (0, Some(0)));
    }

    #[test]
    fn test_delete_then_insert_still_detected() {
        let dict: Dict<i64, i64> = Dict::new();
        for i in 0..5 {
            dict.set(i, i as u64, i).unwrap();
        }
        let mut iter = dict.iter();
        iter.next().unwrap().unwrap();
        dict.delete(&0, 0).unwrap();
        dict.set(40, 40, 40).unwrap();
        assert_eq!(dict.len(), 5);
        assert!(matches!(iter.next(), Some(Err(DictError::IterationInvalidated))));
    }

    #[test]
    fn test_empty_dict() {
        let dict: Dict<i64, i64> = Dict::new();
        let items: Vec<_> = dict.iter().collect();
        assert!(items.is_empty());
    }

    #[test]
    fn test_values_in_slot_order() {
        let dict: Dict<i64, &str> = Dict::new();
        dict.set(6, 6, "six").unwrap();
        dict.set(1, 1, "one").unwrap();
        dict.set(3, 3, "three").unwrap();
        let values: Vec<&str> = dict.values().map(|v| v.unwrap()).collect();
        assert_eq!(values, ["one", "three", "six"]);
    }
}
