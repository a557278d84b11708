//! Construction-time configuration.
//!
//! Every knob here is fixed when a [`KeyHasher`](crate::KeyHasher) or
//! [`Dict`](crate::Dict) is built; nothing is selectable per call.

use crate::error::DictError;
use crate::error::Result;
use crate::probe::ProbeStrategy;

/// Smallest table size. Fresh and shrunk tables use the inline buffer of this
/// many slots.
pub const MIN_SIZE: usize = 8;

/// Default number of bits shifted out of `perturb` on each perturbation step.
pub const DEFAULT_PERTURB_SHIFT: u32 = 5;

/// Default population at or below which a growing table quadruples instead of
/// doubling.
pub const DEFAULT_QUADRUPLE_LIMIT: usize = 50_000;

/// Byte-string hash function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashKind {
    /// Rolling multiply/xor hash with a secret prefix and suffix.
    #[default]
    Polynomial,
    /// Simple tabulation over random lookup tables.
    Tabulation,
}

/// Probe sequence used to resolve collisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeKind {
    /// `i = 5i + 1 + perturb`, folding in the high hash bits.
    #[default]
    Perturbation,
    /// `i = i + 1`.
    Linear,
}

/// Width of the index extracted from the input for each tabulation round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexWidth {
    /// 8-bit index, 256 entries per table.
    #[default]
    One,
    /// 16-bit index, 65 536 entries per table.
    Two,
}

impl IndexWidth {
    /// Number of input bytes consumed per round.
    pub const fn bytes(self) -> usize {
        match self {
            IndexWidth::One => 1,
            IndexWidth::Two => 2,
        }
    }

    /// Number of entries in each random table.
    pub const fn entries(self) -> usize {
        1 << (8 * self.bytes())
    }
}

/// What the tabulation rounds consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TabulationInput {
    /// Tabulate the 64-bit polynomial accumulator.
    #[default]
    Accumulated,
    /// Tabulate the raw key bytes, cycling the tables by position.
    RawBytes,
}

/// Shape of the random tables behind [`HashKind::Tabulation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabulationLayout {
    /// Number of independent tables. Must be a power of two, at most 16.
    pub tables: usize,
    /// Index width per round.
    pub index_width: IndexWidth,
    /// Input fed to the rounds.
    pub input: TabulationInput,
}

impl Default for TabulationLayout {
    fn default() -> Self {
        Self {
            tables: 8,
            index_width: IndexWidth::One,
            input: TabulationInput::Accumulated,
        }
    }
}

impl TabulationLayout {
    pub(crate) fn validate(&self) -> Result<()> {
        if !self.tables.is_power_of_two() || self.tables > 16 {
            return Err(DictError::InvalidConfig(
                "tabulation table count must be a power of two no larger than 16",
            ));
        }
        Ok(())
    }
}

/// Dictionary configuration.
///
/// # Examples
///
/// ```rust
/// use tabdict::Config;
/// use tabdict::HashKind;
/// use tabdict::ProbeKind;
///
/// let config = Config::default()
///     .hash(HashKind::Tabulation)
///     .probe(ProbeKind::Linear)
///     .seed(7);
/// assert_eq!(config.probe_kind(), ProbeKind::Linear);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    hash: HashKind,
    tabulation: TabulationLayout,
    probe: ProbeKind,
    perturb_shift: u32,
    quadruple_limit: usize,
    seed: Option<u64>,
    mix_object_hashes: bool,
    instrumented: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hash: HashKind::Polynomial,
            tabulation: TabulationLayout::default(),
            probe: ProbeKind::Perturbation,
            perturb_shift: DEFAULT_PERTURB_SHIFT,
            quadruple_limit: DEFAULT_QUADRUPLE_LIMIT,
            seed: None,
            mix_object_hashes: false,
            instrumented: false,
        }
    }
}

impl Config {
    /// Select the byte-string hash function.
    pub fn hash(mut self, hash: HashKind) -> Self {
        self.hash = hash;
        self
    }

    /// Set the random table layout used by tabulation hashing.
    pub fn tabulation(mut self, layout: TabulationLayout) -> Self {
        self.tabulation = layout;
        self
    }

    /// Select the probe sequence.
    pub fn probe(mut self, probe: ProbeKind) -> Self {
        self.probe = probe;
        self
    }

    /// Set the perturbation shift. Must be in `1..64`.
    pub fn perturb_shift(mut self, shift: u32) -> Self {
        self.perturb_shift = shift;
        self
    }

    /// Set the population up to which growth quadruples the table.
    pub fn quadruple_limit(mut self, limit: usize) -> Self {
        self.quadruple_limit = limit;
        self
    }

    /// Derive random tables and hash secrets from `seed` instead of the OS.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Pass non-string key hashes through the tabulation mixer.
    pub fn mix_object_hashes(mut self, enabled: bool) -> Self {
        self.mix_object_hashes = enabled;
        self
    }

    /// Turn lookup counters on. Counting only happens when the `stats`
    /// feature is compiled in.
    pub fn instrumented(mut self, enabled: bool) -> Self {
        self.instrumented = enabled;
        self
    }

    /// Check the configuration for values the table cannot honour.
    pub fn validate(&self) -> Result<()> {
        ProbeStrategy::perturbation(self.perturb_shift)?;
        self.tabulation.validate()
    }

    /// Byte-string hash function.
    pub fn hash_kind(&self) -> HashKind {
        self.hash
    }

    /// Random table layout.
    pub fn tabulation_layout(&self) -> TabulationLayout {
        self.tabulation
    }

    /// Probe sequence.
    pub fn probe_kind(&self) -> ProbeKind {
        self.probe
    }

    /// Perturbation shift.
    pub fn perturb_shift_amount(&self) -> u32 {
        self.perturb_shift
    }

    /// Growth factor switch point.
    pub fn quadruple_limit_amount(&self) -> usize {
        self.quadruple_limit
    }

    /// Fixed seed, if any.
    pub fn seed_value(&self) -> Option<u64> {
        self.seed
    }

    /// Whether non-string hashes are mixed.
    pub fn mixes_object_hashes(&self) -> bool {
        self.mix_object_hashes
    }

    /// Whether counters are requested.
    pub fn is_instrumented(&self) -> bool {
        self.instrumented
    }
}
