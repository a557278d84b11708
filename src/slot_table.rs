//! Slot array and its bookkeeping.
//!
//! A table is a power-of-two array of [`Slot`]s. `used` counts live entries,
//! `fill` counts live entries plus tombstones. Tombstones are only dropped by
//! a rebuild, so `used <= fill`, and the insert path keeps `fill < size` so a
//! probe always has an empty slot to stop at.

use alloc::boxed::Box;
use core::mem;

use crate::config::MIN_SIZE;
use crate::error::DictError;
use crate::error::Result;
use crate::probe::ProbeStrategy;

/// A stored key, its value, and the key's cached hash.
#[derive(Debug, Clone)]
pub(crate) struct Entry<K, V> {
    pub(crate) hash: u64,
    pub(crate) key: K,
    pub(crate) value: V,
}

/// State of one slot.
#[derive(Debug, Clone, Default)]
pub(crate) enum Slot<K, V> {
    /// Never used since the last rebuild. Terminates probes.
    #[default]
    Empty,
    /// Previously occupied. Probes continue past it.
    Tombstone,
    Occupied(Entry<K, V>),
}

impl<K, V> Slot<K, V> {
    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }
}

/// Backing slots: the embedded minimum-size buffer or a heap array.
#[derive(Debug)]
pub(crate) enum Storage<K, V> {
    Inline([Slot<K, V>; MIN_SIZE]),
    Heap(Box<[Slot<K, V>]>),
}

impl<K, V> Storage<K, V> {
    pub(crate) fn inline() -> Self {
        Storage::Inline(core::array::from_fn(|_| Slot::Empty))
    }

    #[inline]
    pub(crate) fn slots(&self) -> &[Slot<K, V>] {
        match self {
            Storage::Inline(slots) => slots,
            Storage::Heap(slots) => slots,
        }
    }

    #[inline]
    pub(crate) fn slots_mut(&mut self) -> &mut [Slot<K, V>] {
        match self {
            Storage::Inline(slots) => slots,
            Storage::Heap(slots) => slots,
        }
    }
}

/// Which lookup routine a table currently runs.
///
/// Tables start on [`LookupKind::Bytes`] and move to
/// [`LookupKind::General`] the first time they see a key without exact bytes.
/// The switch never reverts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookupKind {
    /// Raw byte comparison; comparisons cannot fail or re-enter.
    #[default]
    Bytes,
    /// Identity, then [`DictKey::key_eq`](crate::DictKey::key_eq), with
    /// restart on concurrent mutation.
    General,
}

#[derive(Debug)]
pub(crate) struct SlotTable<K, V> {
    storage: Storage<K, V>,
    mask: usize,
    fill: usize,
    used: usize,
    lookup: LookupKind,
}

impl<K, V> SlotTable<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            storage: Storage::inline(),
            mask: MIN_SIZE - 1,
            fill: 0,
            used: 0,
            lookup: LookupKind::Bytes,
        }
    }

    #[inline]
    pub(crate) fn slots(&self) -> &[Slot<K, V>] {
        self.storage.slots()
    }

    #[inline]
    pub(crate) fn slots_mut(&mut self) -> &mut [Slot<K, V>] {
        self.storage.slots_mut()
    }

    #[inline]
    pub(crate) fn mask(&self) -> usize {
        self.mask
    }

    #[inline]
    pub(crate) fn size(&self) -> usize {
        self.mask + 1
    }

    #[inline]
    pub(crate) fn fill(&self) -> usize {
        self.fill
    }

    #[inline]
    pub(crate) fn used(&self) -> usize {
        self.used
    }

    #[inline]
    pub(crate) fn lookup_kind(&self) -> LookupKind {
        self.lookup
    }

    pub(crate) fn downgrade(&mut self) {
        self.lookup = LookupKind::General;
    }

    #[cfg(test)]
    pub(crate) fn is_inline(&self) -> bool {
        matches!(self.storage, Storage::Inline(_))
    }

    /// Whether writing into an empty slot would leave none behind.
    #[inline]
    pub(crate) fn last_empty(&self) -> bool {
        self.fill + 1 >= self.size()
    }

    /// Store a new entry at `index`, which the lookup returned as vacant.
    pub(crate) fn occupy(&mut self, index: usize, entry: Entry<K, V>) {
        let slot = &mut self.slots_mut()[index];
        debug_assert!(!matches!(slot, Slot::Occupied(_)));

        let was_empty = slot.is_empty();
        *slot = Slot::Occupied(entry);
        if was_empty {
            self.fill += 1;
        }
        self.used += 1;
    }

    /// Replace the live entry at `index` with a tombstone.
    pub(crate) fn vacate(&mut self, index: usize) -> Option<Entry<K, V>> {
        match mem::replace(&mut self.slots_mut()[index], Slot::Tombstone) {
            Slot::Occupied(entry) => {
                self.used -= 1;
                Some(entry)
            }
            other => {
                self.slots_mut()[index] = other;
                None
            }
        }
    }

    pub(crate) fn value(&self, index: usize) -> Option<&V> {
        match &self.slots()[index] {
            Slot::Occupied(entry) => Some(&entry.value),
            _ => None,
        }
    }

    pub(crate) fn value_mut(&mut self, index: usize) -> Option<&mut V> {
        match &mut self.slots_mut()[index] {
            Slot::Occupied(entry) => Some(&mut entry.value),
            _ => None,
        }
    }

    /// Swap in fresh storage of `size` empty slots, returning the old one.
    pub(crate) fn replace_storage(&mut self, storage: Storage<K, V>) -> Storage<K, V> {
        let size = storage.slots().len();
        debug_assert!(size.is_power_of_two() && size >= MIN_SIZE);
        debug_assert!(storage.slots().iter().all(Slot::is_empty));

        self.mask = size - 1;
        self.fill = 0;
        self.used = 0;
        mem::replace(&mut self.storage, storage)
    }

    /// Insert into a table known to hold no tombstones and no equal key.
    ///
    /// Walks to the first empty slot without comparing anything.
    pub(crate) fn insert_clean(&mut self, probe: &ProbeStrategy, entry: Entry<K, V>) -> Result<()> {
        let mask = self.mask;
        for index in probe.sequence(entry.hash, mask) {
            if self.slots()[index].is_empty() {
                self.slots_mut()[index] = Slot::Occupied(entry);
                self.fill += 1;
                self.used += 1;
                return Ok(());
            }
        }
        Err(DictError::ProbeExhausted { size: mask + 1 })
    }

    /// Next live entry at or after `*pos`, advancing `*pos` past it.
    pub(crate) fn next_occupied(&self, pos: &mut usize) -> Option<&Entry<K, V>> {
        let slots = self.slots();
        while *pos < slots.len() {
            let index = *pos;
            *pos += 1;
            if let Slot::Occupied(entry) = &slots[index] {
                return Some(entry);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(hash: u64) -> Entry<u64, u64> {
        Entry {
            hash,
            key: hash,
            value: hash * 10,
        }
    }

    #[test]
    fn fresh_table_is_inline() {
        let table: SlotTable<u64, u64> = SlotTable::new();
        assert!(table.is_inline());
        assert_eq!(table.size(), MIN_SIZE);
        assert_eq!(table.mask(), MIN_SIZE - 1);
        assert_eq!(table.fill(), 0);
        assert_eq!(table.used(), 0);
        assert_eq!(table.lookup_kind(), LookupKind::Bytes);
    }

    #[test]
    fn occupy_and_vacate_bookkeeping() {
        let mut table = SlotTable::new();
        table.occupy(3, entry(3));
        assert_eq!((table.fill(), table.used()), (1, 1));

        let removed = table.vacate(3).unwrap();
        assert_eq!(removed.value, 30);
        assert_eq!((table.fill(), table.used()), (1, 0));
        assert!(matches!(table.slots()[3], Slot::Tombstone));

        // Reusing the tombstone does not grow fill.
        table.occupy(3, entry(11));
        assert_eq!((table.fill(), table.used()), (1, 1));

        assert!(table.vacate(4).is_none());
        assert!(table.slots()[4].is_empty());
    }

    #[test]
    fn clean_insert_walks_to_empty() {
        let probe = ProbeStrategy::linear();
        let mut table = SlotTable::new();
        table.insert_clean(&probe, entry(2)).unwrap();
        table.insert_clean(&probe, entry(10)).unwrap();
        table.insert_clean(&probe, entry(18)).unwrap();

        let hashes: alloc::vec::Vec<u64> = table.slots()[2..5]
            .iter()
            .map(|slot| match slot {
                Slot::Occupied(e) => e.hash,
                _ => u64::MAX,
            })
            .collect();
        assert_eq!(hashes, [2, 10, 18]);
        assert_eq!((table.fill(), table.used()), (3, 3));
    }

    #[test]
    fn clean_insert_reports_full_table() {
        let probe = ProbeStrategy::linear();
        let mut table = SlotTable::new();
        for h in 0..MIN_SIZE as u64 {
            table.insert_clean(&probe, entry(h)).unwrap();
        }
        assert!(matches!(
            table.insert_clean(&probe, entry(99)),
            Err(DictError::ProbeExhausted { size: MIN_SIZE })
        ));
    }

    #[test]
    fn cursor_skips_holes() {
        let mut table = SlotTable::new();
        table.occupy(1, entry(1));
        table.occupy(5, entry(5));
        table.occupy(6, entry(6));
        table.vacate(5);

        let mut pos = 0;
        assert_eq!(table.next_occupied(&mut pos).map(|e| e.key), Some(1));
        assert_eq!(table.next_occupied(&mut pos).map(|e| e.key), Some(6));
        assert_eq!(pos, 7);
        assert!(table.next_occupied(&mut pos).is_none());
    }

    #[test]
    fn replace_storage_resets_counts() {
        let mut table = SlotTable::new();
        table.occupy(0, entry(0));
        let mut slots = alloc::vec::Vec::new();
        slots.resize_with(32, Slot::default);
        let old = table.replace_storage(Storage::Heap(slots.into_boxed_slice()));
        assert!(matches!(old, Storage::Inline(_)));
        assert_eq!(table.size(), 32);
        assert_eq!((table.fill(), table.used()), (0, 0));
        assert!(!table.is_inline());
    }
}
