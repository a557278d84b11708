//! The open-addressing dictionary.
//!
//! [`Dict`] stores `(key, value)` pairs keyed by a caller-supplied hash. It
//! never hashes keys itself; [`HashMap`](crate::HashMap) is the wrapper that
//! does. Every operation takes `&self`: a key comparison is allowed to call
//! back into the same dictionary, and the table detects when that happens
//! instead of forbidding it.
//!
//! # Layout
//!
//! The table is a power-of-two array of slots, each empty, a tombstone, or
//! occupied. Fresh tables use an 8-slot buffer embedded in the dictionary;
//! larger tables live on the heap. Arrays released by a rebuild are kept in a
//! small per-dictionary pool and reused for the next rebuild of the same
//! size.
//!
//! # Growth
//!
//! After an insert brings `fill` (live entries plus tombstones) to 2/3 of
//! the table, the table is rebuilt at four times its live entry count, or
//! twice once it holds more than the configured quadruple limit. A rebuild
//! drops every tombstone. Deletes never rebuild.

use core::cell::Cell;
use core::cell::RefCell;
use core::fmt::Debug;
use core::mem;

use tracing::debug;

use crate::config::Config;
use crate::config::MIN_SIZE;
use crate::error::DictError;
use crate::error::Result;
use crate::iter::Iter;
use crate::iter::Keys;
use crate::iter::Values;
use crate::key::DictKey;
use crate::lookup::Probe;
use crate::pool::SlotPool;
use crate::probe::ProbeStrategy;
use crate::resize::ResizePolicy;
use crate::slot_table::Entry;
use crate::slot_table::LookupKind;
use crate::slot_table::Slot;
use crate::slot_table::SlotTable;
use crate::slot_table::Storage;
use crate::stats::Counters;
use crate::stats::StatsSnapshot;

/// Open-addressing dictionary with explicit hashes.
///
/// Values are returned by clone so that no borrow of the table outlives a
/// call. Keys and values should be cheap handles (`Rc`, integers, short
/// strings) and their `Clone` impls must not touch the dictionary. Their
/// `Debug` impls may: formatting works on a copy of the entries.
///
/// # Examples
///
/// ```rust
/// use tabdict::Config;
/// use tabdict::Dict;
/// use tabdict::HashKind;
/// use tabdict::KeyHasher;
///
/// let config = Config::default().hash(HashKind::Tabulation).seed(1);
/// let hasher = KeyHasher::new(&config).unwrap();
/// let dict: Dict<String, u32> = Dict::with_config(&config).unwrap();
///
/// let key = "6.851".to_string();
/// let hash = hasher.hash_bytes(key.as_bytes());
/// assert_eq!(dict.set(key.clone(), hash, 1).unwrap(), None);
/// assert_eq!(dict.get(&key, hash).unwrap(), Some(1));
/// dict.delete(&key, hash).unwrap();
/// assert_eq!(dict.get(&key, hash).unwrap(), None);
/// ```
pub struct Dict<K, V> {
    pub(crate) table: RefCell<SlotTable<K, V>>,
    pub(crate) generation: Cell<u64>,
    pool: RefCell<SlotPool<K, V>>,
    pub(crate) probe: ProbeStrategy,
    policy: ResizePolicy,
    pub(crate) counters: Counters,
}

impl<K, V> Debug for Dict<K, V>
where
    K: Clone + Debug,
    V: Clone + Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        // Formatting runs user code, so it must not hold the table borrow.
        let entries: alloc::vec::Vec<(K, V)> = {
            let table = self.table.borrow();
            table
                .slots()
                .iter()
                .filter_map(|slot| match slot {
                    Slot::Occupied(entry) => Some((entry.key.clone(), entry.value.clone())),
                    _ => None,
                })
                .collect()
        };
        f.debug_map()
            .entries(entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

impl<K, V> Default for Dict<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Dict<K, V> {
    /// Creates an empty dictionary with the default configuration.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tabdict::Dict;
    ///
    /// let dict: Dict<i64, &str> = Dict::new();
    /// assert!(dict.is_empty());
    /// assert_eq!(dict.size(), 8);
    /// ```
    pub fn new() -> Self {
        Self::from_parts(&Config::default())
    }

    /// Creates an empty dictionary using the probe sequence, growth rule,
    /// and instrumentation switch of `config`.
    pub fn with_config(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(config))
    }

    /// Creates a dictionary that holds `capacity` entries without growing.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tabdict::Dict;
    ///
    /// let dict: Dict<i64, i64> = Dict::with_capacity(100).unwrap();
    /// assert_eq!(dict.size(), 256);
    /// for i in 0..100 {
    ///     dict.set(i, i as u64, i).unwrap();
    /// }
    /// assert_eq!(dict.size(), 256);
    /// ```
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Self::with_capacity_and_config(capacity, &Config::default())
    }

    /// [`with_capacity`](Dict::with_capacity) with an explicit configuration.
    pub fn with_capacity_and_config(capacity: usize, config: &Config) -> Result<Self> {
        let dict = Self::with_config(config)?;
        dict.reserve(capacity)?;
        Ok(dict)
    }

    fn from_parts(config: &Config) -> Self {
        Self {
            table: RefCell::new(SlotTable::new()),
            generation: Cell::new(0),
            pool: RefCell::new(SlotPool::default()),
            probe: ProbeStrategy::from_validated(
                config.probe_kind(),
                config.perturb_shift_amount(),
            ),
            policy: ResizePolicy::new(config),
            counters: Counters::new(config.is_instrumented()),
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.table.borrow().used()
    }

    /// Returns `true` if the dictionary holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of slots in the table. Always a power of two, at least 8.
    pub fn size(&self) -> usize {
        self.table.borrow().size()
    }

    /// Live entries plus tombstones.
    pub fn fill(&self) -> usize {
        self.table.borrow().fill()
    }

    /// Lookup routine currently in use.
    pub fn lookup_kind(&self) -> LookupKind {
        self.table.borrow().lookup_kind()
    }

    /// Probe strategy fixed at construction.
    pub fn probe_strategy(&self) -> ProbeStrategy {
        self.probe
    }

    /// Copy of the lookup counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.counters.snapshot()
    }

    /// Zero the lookup counters.
    pub fn reset_stats(&self) {
        self.counters.reset();
    }

    #[inline]
    pub(crate) fn generation(&self) -> u64 {
        self.generation.get()
    }

    #[inline]
    fn bump_generation(&self) {
        self.generation.set(self.generation.get().wrapping_add(1));
    }

    /// Removes every entry and returns the table to its inline buffer.
    ///
    /// The table is emptied before any entry is dropped, so a `Drop` impl
    /// that reads the dictionary sees it empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tabdict::Dict;
    ///
    /// let dict: Dict<i64, i64> = Dict::new();
    /// for i in 0..50 {
    ///     dict.set(i, i as u64, i).unwrap();
    /// }
    /// dict.clear();
    /// assert!(dict.is_empty());
    /// assert_eq!(dict.size(), 8);
    /// ```
    pub fn clear(&self) {
        let mut old = self.table.borrow_mut().replace_storage(Storage::inline());
        self.bump_generation();

        for slot in old.slots_mut() {
            drop(mem::take(slot));
        }
        if let Storage::Heap(slots) = old {
            self.pool.borrow_mut().give(slots);
        }
    }

    /// Drops the arrays kept for reuse by later rebuilds.
    pub fn release_pool(&self) {
        self.pool.borrow_mut().clear();
    }

    /// Grows the table so that `additional` more entries fit without a
    /// rebuild.
    pub fn reserve(&self, additional: usize) -> Result<()> {
        let target = self
            .policy
            .fit_target(self.len().saturating_add(additional));
        if target > self.size() {
            self.rebuild(target)?;
        }
        Ok(())
    }

    /// Rebuilds at the current size, dropping every tombstone.
    ///
    /// Does nothing if the table holds no tombstones.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tabdict::Dict;
    ///
    /// let dict: Dict<i64, i64> = Dict::new();
    /// for i in 0..5 {
    ///     dict.set(i, i as u64, i).unwrap();
    /// }
    /// dict.delete(&0, 0).unwrap();
    /// assert_eq!(dict.fill(), 5);
    /// dict.compact().unwrap();
    /// assert_eq!(dict.fill(), 4);
    /// assert_eq!(dict.size(), 8);
    /// ```
    pub fn compact(&self) -> Result<()> {
        let (size, fill, used) = {
            let table = self.table.borrow();
            (table.size(), table.fill(), table.used())
        };
        if fill == used {
            return Ok(());
        }
        self.rebuild(size)
    }

    /// Rebuilds into the smallest table that holds the live entries below
    /// the load factor.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tabdict::Dict;
    ///
    /// let dict: Dict<i64, i64> = Dict::new();
    /// for i in 0..1000 {
    ///     dict.set(i, i as u64, i).unwrap();
    /// }
    /// for i in 3..1000 {
    ///     dict.delete(&i, i as u64).unwrap();
    /// }
    /// dict.shrink_to_fit().unwrap();
    /// assert_eq!(dict.size(), 8);
    /// assert_eq!(dict.get(&2, 2).unwrap(), Some(2));
    /// ```
    pub fn shrink_to_fit(&self) -> Result<()> {
        let (size, fill, used) = {
            let table = self.table.borrow();
            (table.size(), table.fill(), table.used())
        };
        let target = self.policy.fit_target(used);
        if target == size && fill == used {
            return Ok(());
        }
        self.rebuild(target)
    }

    /// Moves every live entry into a fresh table of `size` slots.
    ///
    /// The new array is obtained before anything is moved, so an allocation
    /// failure leaves the table untouched.
    fn rebuild(&self, size: usize) -> Result<()> {
        let fresh = if size == MIN_SIZE {
            Storage::inline()
        } else {
            Storage::Heap(self.pool.borrow_mut().take(size)?)
        };

        let mut table = self.table.borrow_mut();
        let old_size = table.size();
        let tombstones = table.fill() - table.used();
        let mut old = table.replace_storage(fresh);
        self.bump_generation();

        for slot in old.slots_mut() {
            if let Slot::Occupied(entry) = mem::take(slot) {
                table.insert_clean(&self.probe, entry)?;
            }
        }

        debug!(
            old_size,
            new_size = size,
            used = table.used(),
            tombstones,
            "rebuilt dictionary table"
        );
        drop(table);

        // Arrays outgrown by a growing table are not worth keeping.
        if let Storage::Heap(slots) = old
            && old_size >= size
        {
            self.pool.borrow_mut().give(slots);
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn pooled_arrays(&self) -> usize {
        self.pool.borrow().len()
    }

    #[cfg(test)]
    pub(crate) fn is_inline(&self) -> bool {
        self.table.borrow().is_inline()
    }
}

impl<K: DictKey, V> Dict<K, V> {
    /// Inserts `value` under `key`, returning the value it replaced.
    ///
    /// Replacing the value of a present key is not a structural change: it
    /// keeps iterators valid and never rebuilds.
    ///
    /// If inserting a new key crosses the load factor and the rebuild cannot
    /// allocate, the entry stays inserted and the allocation error is
    /// returned. The table remains valid and the rebuild is retried on the
    /// next insert.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tabdict::Dict;
    ///
    /// let dict: Dict<&'static str, i32> = Dict::new();
    /// assert_eq!(dict.set("a", 97, 1).unwrap(), None);
    /// assert_eq!(dict.set("a", 97, 2).unwrap(), Some(1));
    /// assert_eq!(dict.len(), 1);
    /// ```
    pub fn set(&self, key: K, hash: u64, value: V) -> Result<Option<V>> {
        let mut probe = self.lookup(&key, hash)?;

        if let Probe::Vacant(index) = probe {
            let needs_room = {
                let table = self.table.borrow();
                table.slots()[index].is_empty() && table.last_empty()
            };
            if needs_room {
                self.rebuild(self.policy.grow_target(self.len() + 1))?;
                probe = self.lookup(&key, hash)?;
            }
        }

        let old = match probe {
            Probe::Found(index) => {
                let mut table = self.table.borrow_mut();
                table
                    .value_mut(index)
                    .map(|slot| mem::replace(slot, value))
            }
            Probe::Vacant(index) => {
                self.table
                    .borrow_mut()
                    .occupy(index, Entry { hash, key, value });
                self.bump_generation();

                let (fill, size, used) = {
                    let table = self.table.borrow();
                    (table.fill(), table.size(), table.used())
                };
                if self.policy.needs_grow(fill, size) {
                    self.rebuild(self.policy.grow_target(used))?;
                }
                None
            }
        };

        Ok(old)
    }

    /// Returns `true` if `key` is present.
    pub fn contains(&self, key: &K, hash: u64) -> Result<bool> {
        Ok(matches!(self.lookup(key, hash)?, Probe::Found(_)))
    }

    /// Removes `key`.
    ///
    /// Fails with [`DictError::KeyNotFound`] if it is absent.
    pub fn delete(&self, key: &K, hash: u64) -> Result<()> {
        self.remove_entry(key, hash).map(drop)
    }

    /// Removes `key` and returns the stored key and value.
    ///
    /// The slot becomes a tombstone: `len` drops by one and `fill` is
    /// unchanged.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tabdict::Dict;
    /// use tabdict::DictError;
    ///
    /// let dict: Dict<i64, &str> = Dict::new();
    /// dict.set(4, 4, "four").unwrap();
    /// assert_eq!(dict.remove_entry(&4, 4).unwrap(), (4, "four"));
    /// assert!(matches!(dict.remove_entry(&4, 4), Err(DictError::KeyNotFound)));
    /// ```
    pub fn remove_entry(&self, key: &K, hash: u64) -> Result<(K, V)> {
        let Probe::Found(index) = self.lookup(key, hash)? else {
            return Err(DictError::KeyNotFound);
        };

        let entry = self
            .table
            .borrow_mut()
            .vacate(index)
            .ok_or(DictError::KeyNotFound)?;
        self.bump_generation();
        Ok((entry.key, entry.value))
    }

    /// Removes `key`, returning its value if it was present.
    pub fn remove(&self, key: &K, hash: u64) -> Result<Option<V>> {
        match self.remove_entry(key, hash) {
            Ok((_, value)) => Ok(Some(value)),
            Err(DictError::KeyNotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl<K: DictKey, V: Clone> Dict<K, V> {
    /// Returns a clone of the value stored under `key`.
    pub fn get(&self, key: &K, hash: u64) -> Result<Option<V>> {
        match self.lookup(key, hash)? {
            Probe::Found(index) => Ok(self.table.borrow().value(index).cloned()),
            Probe::Vacant(_) => Ok(None),
        }
    }

    /// Like [`get`](Dict::get), but an absent key is an error.
    pub fn get_required(&self, key: &K, hash: u64) -> Result<V> {
        self.get(key, hash)?.ok_or(DictError::KeyNotFound)
    }

    /// Returns the first live entry at or after slot `*pos` and moves `*pos`
    /// past it.
    ///
    /// Start from `0` and call until `None`. The cursor is only meaningful
    /// while the table is not structurally modified.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tabdict::Dict;
    ///
    /// let dict: Dict<i64, i64> = Dict::new();
    /// dict.set(1, 1, 10).unwrap();
    /// dict.set(2, 2, 20).unwrap();
    ///
    /// let mut pos = 0;
    /// let mut total = 0;
    /// while let Some((_, value)) = dict.next_entry(&mut pos) {
    ///     total += value;
    /// }
    /// assert_eq!(total, 30);
    /// ```
    pub fn next_entry(&self, pos: &mut usize) -> Option<(K, V)> {
        let table = self.table.borrow();
        table
            .next_occupied(pos)
            .map(|entry| (entry.key.clone(), entry.value.clone()))
    }

    /// Iterates over `(key, value)` pairs in slot order.
    ///
    /// The iterator yields [`DictError::IterationInvalidated`] once if the
    /// table is structurally modified while it is live, and nothing after
    /// that. Replacing values of existing keys is allowed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tabdict::Dict;
    /// use tabdict::DictError;
    ///
    /// let dict: Dict<i64, i64> = Dict::new();
    /// for i in 0..4 {
    ///     dict.set(i, i as u64, i).unwrap();
    /// }
    ///
    /// let mut iter = dict.iter();
    /// assert!(iter.next().unwrap().is_ok());
    /// dict.delete(&3, 3).unwrap();
    /// assert!(matches!(iter.next(), Some(Err(DictError::IterationInvalidated))));
    /// assert!(iter.next().is_none());
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self)
    }

    /// Iterates over keys. Same invalidation rules as [`iter`](Dict::iter).
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys::new(self.iter())
    }

    /// Iterates over values. Same invalidation rules as [`iter`](Dict::iter).
    pub fn values(&self) -> Values<'_, K, V> {
        Values::new(self.iter())
    }
}

impl<'a, K: DictKey, V: Clone> IntoIterator for &'a Dict<K, V> {
    type Item = Result<(K, V)>;
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(feature = "stats")]
impl<K, V> Dict<K, V> {
    /// Number of probe steps needed to reach each live entry, as a histogram:
    /// index `n` counts entries found on step `n + 1`.
    pub fn probe_length_histogram(&self) -> alloc::vec::Vec<usize> {
        let table = self.table.borrow();
        let mut hist = alloc::vec::Vec::new();
        for (index, slot) in table.slots().iter().enumerate() {
            let Slot::Occupied(entry) = slot else {
                continue;
            };
            let Some(step) = self
                .probe
                .sequence(entry.hash, table.mask())
                .position(|candidate| candidate == index)
            else {
                continue;
            };
            if hist.len() <= step {
                hist.resize(step + 1, 0);
            }
            hist[step] += 1;
        }
        hist
    }

    /// Slot-level counts and probe length summary.
    pub fn layout_stats(&self) -> crate::stats::LayoutStats {
        let hist = self.probe_length_histogram();
        let (size, used, fill) = {
            let table = self.table.borrow();
            (table.size(), table.used(), table.fill())
        };

        let total: usize = hist
            .iter()
            .enumerate()
            .map(|(step, &count)| (step + 1) * count)
            .sum();

        crate::stats::LayoutStats {
            size,
            used,
            fill,
            tombstones: fill - used,
            empty: size - fill,
            load_factor: used as f64 / size as f64,
            fill_factor: fill as f64 / size as f64,
            max_probe_length: hist.len(),
            mean_probe_length: if used == 0 {
                0.0
            } else {
                total as f64 / used as f64
            },
        }
    }

    /// One character per slot: `1` live, `x` tombstone, `0` empty.
    pub fn occupancy_map(&self) -> alloc::string::String {
        self.table
            .borrow()
            .slots()
            .iter()
            .map(|slot| match slot {
                Slot::Empty => '0',
                Slot::Tombstone => 'x',
                Slot::Occupied(_) => '1',
            })
            .collect()
    }
}
