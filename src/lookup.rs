//! Finding a key's slot.
//!
//! Both routines walk the table's probe sequence and stop at the first empty
//! slot. A tombstone seen on the way is remembered and returned in place of
//! the empty slot, so inserts reuse it.
//!
//! The general routine never holds a borrow of the table while user code
//! runs. It clones the candidate key, releases the table, and compares. If
//! the generation moved while the comparison ran, the slot indices it was
//! holding are stale and the walk starts over.

use tracing::trace;

use crate::dict::Dict;
use crate::error::DictError;
use crate::error::Result;
use crate::key::DictKey;
use crate::slot_table::LookupKind;
use crate::slot_table::Slot;

/// Outcome of a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Probe {
    /// The key lives at this index.
    Found(usize),
    /// The key is absent; this is where it would go.
    Vacant(usize),
}

impl<K: DictKey, V> Dict<K, V> {
    /// Locate `key`, switching the table to the general routine if the key
    /// cannot use the byte-string fast path.
    pub(crate) fn lookup(&self, key: &K, hash: u64) -> Result<Probe> {
        let kind = self.table.borrow().lookup_kind();
        match (kind, key.exact_bytes()) {
            (LookupKind::Bytes, Some(bytes)) => self.lookup_bytes(key, bytes, hash),
            (LookupKind::Bytes, None) => {
                self.table.borrow_mut().downgrade();
                self.counters.conversion();
                trace!(hash, "non byte-string key, switching to general lookup");
                self.lookup_general(key, hash)
            }
            (LookupKind::General, _) => self.lookup_general(key, hash),
        }
    }

    fn lookup_bytes(&self, key: &K, bytes: &[u8], hash: u64) -> Result<Probe> {
        self.counters.fast_lookup();

        let table = self.table.borrow();
        let mut freeslot = None;
        for (step, index) in self.probe.sequence(hash, table.mask()).enumerate() {
            self.counters.fast_probe(step);
            match &table.slots()[index] {
                Slot::Empty => return Ok(Probe::Vacant(freeslot.unwrap_or(index))),
                Slot::Tombstone => {
                    if freeslot.is_none() {
                        freeslot = Some(index);
                    }
                }
                Slot::Occupied(entry) => {
                    if entry.hash == hash
                        && (entry.key.is_same(key) || entry.key.exact_bytes() == Some(bytes))
                    {
                        return Ok(Probe::Found(index));
                    }
                }
            }
        }

        Err(DictError::ProbeExhausted {
            size: table.size(),
        })
    }

    fn lookup_general(&self, key: &K, hash: u64) -> Result<Probe> {
        self.counters.general_lookup();

        'restart: loop {
            let generation = self.generation.get();
            let mask = self.table.borrow().mask();
            let mut freeslot = None;

            for (step, index) in self.probe.sequence(hash, mask).enumerate() {
                self.counters.general_probe(step);

                let candidate = {
                    let table = self.table.borrow();
                    match &table.slots()[index] {
                        Slot::Empty => return Ok(Probe::Vacant(freeslot.unwrap_or(index))),
                        Slot::Tombstone => {
                            if freeslot.is_none() {
                                freeslot = Some(index);
                            }
                            continue;
                        }
                        Slot::Occupied(entry) if entry.hash != hash => continue,
                        Slot::Occupied(entry) => {
                            if entry.key.is_same(key) {
                                return Ok(Probe::Found(index));
                            }
                            // Byte equality runs no user code.
                            if let (Some(stored), Some(probed)) =
                                (entry.key.exact_bytes(), key.exact_bytes())
                            {
                                if stored == probed {
                                    return Ok(Probe::Found(index));
                                }
                                continue;
                            }
                            entry.key.clone()
                        }
                    }
                };

                let equal = candidate.key_eq(key).map_err(DictError::Comparator)?;
                drop(candidate);

                if self.generation.get() != generation {
                    trace!(hash, index, "table mutated during key comparison, restarting lookup");
                    continue 'restart;
                }
                if equal {
                    return Ok(Probe::Found(index));
                }
            }

            return Err(DictError::ProbeExhausted { size: mask + 1 });
        }
    }
}
