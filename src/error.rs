//! Error definitions.
use alloc::boxed::Box;
use alloc::collections::TryReserveError;
use core::fmt;

use thiserror::Error;

/// Boxed error raised by user code (key comparison or key hashing).
pub type BoxError = Box<dyn core::error::Error + Send + Sync + 'static>;

/// Failure reported by a key's own equality or hashing code.
///
/// The dictionary never inspects the wrapped error; it aborts the operation
/// that triggered it and hands the error back to the caller.
#[derive(Debug)]
pub struct KeyError(BoxError);

impl KeyError {
    /// Wrap an arbitrary error produced while comparing or hashing a key.
    pub fn new(source: impl Into<BoxError>) -> Self {
        KeyError(source.into())
    }

    /// Borrow the wrapped error.
    pub fn inner(&self) -> &(dyn core::error::Error + Send + Sync + 'static) {
        &*self.0
    }

    /// Unwrap into the boxed error.
    pub fn into_inner(self) -> BoxError {
        self.0
    }
}

impl fmt::Display for KeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl core::error::Error for KeyError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        Some(&*self.0)
    }
}

/// Crate-wide error type.
#[derive(Error, Debug)]
pub enum DictError {
    /// A key equality comparison failed during lookup. No mutation was
    /// committed.
    #[error("key comparison failed: {0}")]
    Comparator(#[source] KeyError),

    /// Computing the hash of a key failed.
    #[error("key is not hashable: {0}")]
    Unhashable(#[source] KeyError),

    /// The key is not present in the table.
    #[error("key not found")]
    KeyNotFound,

    /// The table changed size while an iterator was walking it.
    #[error("dictionary changed size during iteration")]
    IterationInvalidated,

    /// A slot array could not be allocated. The table keeps its previous
    /// layout.
    #[error("failed to allocate slot array: {0}")]
    Allocation(#[from] TryReserveError),

    /// A probe sequence walked its full bound without meeting an empty slot.
    ///
    /// This is an internal consistency failure: either the probe strategy
    /// lost its full-coverage property or the fill bookkeeping is corrupt.
    #[error("probe sequence exhausted a table of {size} slots without finding an empty slot")]
    ProbeExhausted {
        /// Size of the table being probed.
        size: usize,
    },

    /// A construction-time configuration value was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// The operating system entropy source failed while seeding random
    /// tables.
    #[error("unable to read from the OS entropy source")]
    Entropy,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, DictError>;
