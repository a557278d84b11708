//! Recycling of heap slot arrays.
//!
//! A rebuild releases the array it moved out of. Instead of freeing it, the
//! dictionary parks it here and hands it out again the next time it needs an
//! array of that exact size. Only fully empty arrays are parked.

use alloc::boxed::Box;
use alloc::vec::Vec;

use tracing::warn;

use crate::error::Result;
use crate::slot_table::Slot;

/// Most arrays kept for reuse.
pub(crate) const POOL_CAPACITY: usize = 8;

#[derive(Debug)]
pub(crate) struct SlotPool<K, V> {
    free: Vec<Box<[Slot<K, V>]>>,
}

impl<K, V> Default for SlotPool<K, V> {
    fn default() -> Self {
        Self { free: Vec::new() }
    }
}

impl<K, V> SlotPool<K, V> {
    /// An array of `size` empty slots, recycled when possible.
    pub(crate) fn take(&mut self, size: usize) -> Result<Box<[Slot<K, V>]>> {
        if let Some(pos) = self.free.iter().position(|slots| slots.len() == size) {
            return Ok(self.free.swap_remove(pos));
        }

        let mut slots = Vec::new();
        if let Err(e) = slots.try_reserve_exact(size) {
            warn!(size, "slot array allocation failed");
            return Err(e.into());
        }
        slots.resize_with(size, Slot::default);
        Ok(slots.into_boxed_slice())
    }

    /// Park an emptied array, or free it if the pool is full.
    pub(crate) fn give(&mut self, slots: Box<[Slot<K, V>]>) {
        debug_assert!(slots.iter().all(Slot::is_empty));

        if self.free.len() < POOL_CAPACITY && self.free.try_reserve(1).is_ok() {
            self.free.push(slots);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.free.len()
    }

    pub(crate) fn clear(&mut self) {
        self.free.clear();
    }
}
