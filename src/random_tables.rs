//! Random lookup tables for simple tabulation hashing.
//!
//! The tables are filled once and never written again. A
//! [`KeyHasher`](crate::KeyHasher) owns them behind an `Arc`, so every hash
//! computation reads the same immutable words without any global state.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt::Debug;

use rand::RngCore;
use rand::SeedableRng;
use rand::TryRngCore;
use rand::rngs::OsRng;
use rand_chacha::ChaCha20Rng;

use crate::config::IndexWidth;
use crate::config::TabulationLayout;
use crate::error::DictError;
use crate::error::Result;

/// `tables` independent arrays of random 64-bit words, stored contiguously.
pub struct RandomTables {
    tables: usize,
    width: IndexWidth,
    words: Box<[u64]>,
}

impl Debug for RandomTables {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RandomTables")
            .field("tables", &self.tables)
            .field("width", &self.width)
            .field("words", &self.words.len())
            .finish()
    }
}

impl RandomTables {
    /// Fill the tables from the operating system's entropy source.
    pub fn from_os_rng(layout: &TabulationLayout) -> Result<Self> {
        let mut rng = OsRng;
        Self::generate(layout, || {
            rng.try_next_u64().map_err(|_| DictError::Entropy)
        })
    }

    /// Fill the tables from a ChaCha20 stream keyed by `seed`.
    ///
    /// The same seed and layout always produce the same tables, across runs
    /// and platforms.
    pub fn from_seed(layout: &TabulationLayout, seed: u64) -> Result<Self> {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        Self::generate(layout, || Ok(rng.next_u64()))
    }

    fn generate(
        layout: &TabulationLayout,
        mut next: impl FnMut() -> Result<u64>,
    ) -> Result<Self> {
        layout.validate()?;

        let len = layout.tables * layout.index_width.entries();
        let mut words = Vec::new();
        words.try_reserve_exact(len)?;
        for _ in 0..len {
            words.push(next()?);
        }

        Ok(Self {
            tables: layout.tables,
            width: layout.index_width,
            words: words.into_boxed_slice(),
        })
    }

    /// Number of tables.
    pub fn tables(&self) -> usize {
        self.tables
    }

    /// Index width of each round.
    pub fn index_width(&self) -> IndexWidth {
        self.width
    }

    /// Word at `index` of table `table`.
    ///
    /// `table` is reduced modulo the table count and `index` modulo the
    /// table length, both with a mask.
    #[inline(always)]
    pub fn word(&self, table: usize, index: usize) -> u64 {
        let entries = self.width.entries();
        let table = table & (self.tables - 1);
        let index = index & (entries - 1);
        self.words[table * entries + index]
    }
}
