//! Byte-string hash functions and the hashing context handed to keys.
//!
//! Two interchangeable functions are provided:
//!
//! - [`polynomial`]: `acc = acc * 1000003 ^ byte` seeded from a secret prefix,
//!   finished with the length and a secret suffix. Adjacent inputs differ
//!   mostly in their low bits, which keeps runs of numeric strings spread over
//!   consecutive slots.
//! - [`tabulation`]: simple tabulation hashing. Either the polynomial
//!   accumulator or the raw key bytes are cut into 8 or 16 bit indices, each
//!   index selects a word from one of the random tables (round robin by
//!   position), and the selected words are XORed together.
//!
//! Both functions are deterministic for a fixed secret and table set and
//! never return [`INVALID_HASH`].

use alloc::sync::Arc;
use core::hash::Hash;
use core::hash::Hasher;

use rand::RngCore;
use rand::SeedableRng;
use rand::TryRngCore;
use rand::rngs::OsRng;
use rand_chacha::ChaCha20Rng;

use crate::config::Config;
use crate::config::HashKind;
use crate::config::TabulationInput;
use crate::error::DictError;
use crate::error::Result;
use crate::random_tables::RandomTables;

/// Multiplier of the polynomial recurrence.
pub const POLYNOMIAL_MULTIPLIER: u64 = 1_000_003;

/// Reserved hash value meaning "no hash". Equal to `-1` as a signed word.
pub const INVALID_HASH: u64 = u64::MAX;

/// Value substituted whenever a computation lands on [`INVALID_HASH`].
pub const INVALID_HASH_PLACEHOLDER: u64 = u64::MAX - 1;

/// Map the reserved sentinel onto its fixed placeholder.
#[inline(always)]
pub const fn fix_sentinel(hash: u64) -> u64 {
    if hash == INVALID_HASH {
        INVALID_HASH_PLACEHOLDER
    } else {
        hash
    }
}

/// Per-context secret mixed into string hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HashSecret {
    /// Seeds the accumulator.
    pub prefix: u64,
    /// XORed into the finished hash.
    pub suffix: u64,
}

impl HashSecret {
    fn from_seed(seed: u64) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        // Stream 0 fills the random tables for the same seed.
        rng.set_stream(1);
        Self {
            prefix: rng.next_u64(),
            suffix: rng.next_u64(),
        }
    }

    fn from_os_rng() -> Result<Self> {
        let mut rng = OsRng;
        Ok(Self {
            prefix: rng.try_next_u64().map_err(|_| DictError::Entropy)?,
            suffix: rng.try_next_u64().map_err(|_| DictError::Entropy)?,
        })
    }
}

/// Run the polynomial recurrence over a non-empty byte string.
#[inline]
pub fn polynomial_accumulate(bytes: &[u8], prefix: u64) -> u64 {
    debug_assert!(!bytes.is_empty());

    let mut acc = prefix ^ ((bytes[0] as u64) << 7);
    for &b in bytes {
        acc = acc.wrapping_mul(POLYNOMIAL_MULTIPLIER) ^ b as u64;
    }
    acc
}

/// Polynomial string hash. The empty string hashes to `0` so the secret is
/// not exposed by a trivial input.
///
/// # Examples
///
/// ```rust
/// use tabdict::hashing::HashSecret;
/// use tabdict::hashing::polynomial;
///
/// let secret = HashSecret { prefix: 0, suffix: 0 };
/// assert_eq!(polynomial(b"", &secret), 0);
/// assert_eq!(polynomial(b"ab", &secret), polynomial(b"ab", &secret));
/// assert_ne!(polynomial(b"ab", &secret), polynomial(b"ba", &secret));
/// ```
pub fn polynomial(bytes: &[u8], secret: &HashSecret) -> u64 {
    if bytes.is_empty() {
        return 0;
    }

    let mut x = polynomial_accumulate(bytes, secret.prefix);
    x ^= bytes.len() as u64;
    x ^= secret.suffix;
    fix_sentinel(x)
}

/// XOR one table word per index extracted from `word`, low bits first.
#[inline]
pub fn tabulate_word(word: u64, tables: &RandomTables) -> u64 {
    let bits = 8 * tables.index_width().bytes();
    let mask = (1u64 << bits) - 1;

    let mut h = 0;
    for round in 0..(64 / bits) {
        let index = (word >> (round * bits)) & mask;
        h ^= tables.word(round, index as usize);
    }
    h
}

/// XOR one table word per index cut from `bytes`; table selection cycles with
/// the chunk position.
#[inline]
pub fn tabulate_bytes(bytes: &[u8], tables: &RandomTables) -> u64 {
    let width = tables.index_width().bytes();

    let mut h = 0;
    for (position, chunk) in bytes.chunks(width).enumerate() {
        let index = chunk
            .iter()
            .rev()
            .fold(0usize, |acc, &b| (acc << 8) | b as usize);
        h ^= tables.word(position, index);
    }
    h
}

/// Simple tabulation string hash.
pub fn tabulation(
    bytes: &[u8],
    secret: &HashSecret,
    tables: &RandomTables,
    input: TabulationInput,
) -> u64 {
    if bytes.is_empty() {
        return 0;
    }

    let mut x = match input {
        TabulationInput::Accumulated => {
            tabulate_word(polynomial_accumulate(bytes, secret.prefix), tables)
        }
        TabulationInput::RawBytes => tabulate_bytes(bytes, tables),
    };
    x ^= bytes.len() as u64;
    x ^= secret.suffix;
    fix_sentinel(x)
}

/// [`Hasher`] running the polynomial recurrence over everything written to
/// it. Used for structured keys when foldhash is not compiled in.
#[derive(Debug, Clone)]
pub struct PolynomialHasher {
    acc: u64,
    len: u64,
    suffix: u64,
}

impl PolynomialHasher {
    /// Start a hasher keyed by `secret`.
    pub fn new(secret: &HashSecret) -> Self {
        Self {
            acc: secret.prefix,
            len: 0,
            suffix: secret.suffix,
        }
    }
}

impl Hasher for PolynomialHasher {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.acc = self.acc.wrapping_mul(POLYNOMIAL_MULTIPLIER) ^ b as u64;
        }
        self.len = self.len.wrapping_add(bytes.len() as u64);
    }

    fn finish(&self) -> u64 {
        self.acc ^ self.len ^ self.suffix
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        fn object_hash<T: Hash + ?Sized>(seed: u64, _secret: &HashSecret, value: &T) -> u64 {
            use core::hash::BuildHasher;

            foldhash::fast::FixedState::with_seed(seed).hash_one(value)
        }
    } else {
        fn object_hash<T: Hash + ?Sized>(seed: u64, secret: &HashSecret, value: &T) -> u64 {
            let mut hasher = PolynomialHasher::new(&HashSecret {
                prefix: secret.prefix ^ seed,
                suffix: secret.suffix,
            });
            value.hash(&mut hasher);
            hasher.finish()
        }
    }
}

/// Hashing context: the selected string hash, its secret, and the random
/// tables, built once and shared by reference.
///
/// Keys receive a `&KeyHasher` when asked for their hash, so nothing about
/// hashing is process-global.
///
/// # Examples
///
/// ```rust
/// use tabdict::Config;
/// use tabdict::HashKind;
/// use tabdict::KeyHasher;
///
/// let hasher = KeyHasher::new(&Config::default().hash(HashKind::Tabulation).seed(1)).unwrap();
/// let again = KeyHasher::new(&Config::default().hash(HashKind::Tabulation).seed(1)).unwrap();
/// assert_eq!(hasher.hash_bytes(b"6.851"), again.hash_bytes(b"6.851"));
/// ```
#[derive(Debug, Clone)]
pub struct KeyHasher {
    kind: HashKind,
    input: TabulationInput,
    secret: HashSecret,
    tables: Arc<RandomTables>,
    mix_objects: bool,
    object_seed: u64,
}

impl KeyHasher {
    /// Build the hashing context described by `config`.
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        let layout = config.tabulation_layout();
        let (secret, tables, object_seed) = match config.seed_value() {
            Some(seed) => (
                HashSecret::from_seed(seed),
                RandomTables::from_seed(&layout, seed)?,
                seed,
            ),
            None => (
                HashSecret::from_os_rng()?,
                RandomTables::from_os_rng(&layout)?,
                OsRng.try_next_u64().map_err(|_| DictError::Entropy)?,
            ),
        };

        Ok(Self {
            kind: config.hash_kind(),
            input: layout.input,
            secret,
            tables: Arc::new(tables),
            mix_objects: config.mixes_object_hashes(),
            object_seed,
        })
    }

    /// Selected string hash.
    pub fn kind(&self) -> HashKind {
        self.kind
    }

    /// Secret prefix and suffix.
    pub fn secret(&self) -> HashSecret {
        self.secret
    }

    /// Shared random tables.
    pub fn tables(&self) -> &Arc<RandomTables> {
        &self.tables
    }

    /// Hash an exact byte string with the configured function.
    #[inline]
    pub fn hash_bytes(&self, bytes: &[u8]) -> u64 {
        match self.kind {
            HashKind::Polynomial => polynomial(bytes, &self.secret),
            HashKind::Tabulation => tabulation(bytes, &self.secret, &self.tables, self.input),
        }
    }

    /// Hash an integer key. Integers hash to themselves, which keeps ranges of
    /// small integers collision free, unless object hash mixing is on.
    #[inline]
    pub fn hash_int(&self, value: i64) -> u64 {
        self.finish_object(value as u64)
    }

    /// Hash a structured key through its [`Hash`] implementation.
    pub fn hash_object<T: Hash + ?Sized>(&self, value: &T) -> u64 {
        self.finish_object(object_hash(self.object_seed, &self.secret, value))
    }

    /// Pass a hash through the tabulation mixer.
    #[inline]
    pub fn mix(&self, hash: u64) -> u64 {
        fix_sentinel(tabulate_word(hash, &self.tables))
    }

    #[inline]
    fn finish_object(&self, raw: u64) -> u64 {
        if self.mix_objects {
            self.mix(raw)
        } else {
            fix_sentinel(raw)
        }
    }
}
