//! Probe sequences.
//!
//! A probe sequence maps `(hash, attempt)` to a slot index in a power-of-two
//! table. Both strategies start at `hash & mask`:
//!
//! - **Perturbation**: `i = (5i + 1 + perturb) & mask`, then
//!   `perturb >>= shift`. The high hash bits steer the first few steps; once
//!   `perturb` reaches zero the recurrence is the full-period generator
//!   `5i + 1 (mod 2^k)` and walks every slot.
//! - **Linear**: `i = (i + 1) & mask`.
//!
//! Either way every slot is reached within [`ProbeStrategy::bound`] steps, which is
//! what lets a lookup stop at the first empty slot with the guarantee that
//! one exists.

use crate::config::ProbeKind;
use crate::error::DictError;
use crate::error::Result;

/// Probe strategy, fixed per table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeStrategy {
    kind: ProbeKind,
    shift: u32,
}

impl ProbeStrategy {
    /// Perturbation probing with the given shift.
    ///
    /// Fails with [`DictError::InvalidConfig`] unless `1 <= shift < 64`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tabdict::ProbeStrategy;
    ///
    /// assert!(ProbeStrategy::perturbation(5).is_ok());
    /// assert!(ProbeStrategy::perturbation(0).is_err());
    /// assert!(ProbeStrategy::perturbation(64).is_err());
    /// ```
    pub fn perturbation(shift: u32) -> Result<Self> {
        if shift == 0 || shift >= 64 {
            return Err(DictError::InvalidConfig(
                "perturb shift must be between 1 and 63",
            ));
        }
        Ok(Self::perturbation_unchecked(shift))
    }

    /// Linear probing.
    pub const fn linear() -> Self {
        Self {
            kind: ProbeKind::Linear,
            shift: 0,
        }
    }

    /// Strategy of the given kind. `shift` is ignored for linear probing.
    pub fn new(kind: ProbeKind, shift: u32) -> Result<Self> {
        match kind {
            ProbeKind::Perturbation => Self::perturbation(shift),
            ProbeKind::Linear => Ok(Self::linear()),
        }
    }

    /// Strategy described by an already validated configuration.
    pub(crate) const fn from_validated(kind: ProbeKind, shift: u32) -> Self {
        match kind {
            ProbeKind::Perturbation => Self::perturbation_unchecked(shift),
            ProbeKind::Linear => Self::linear(),
        }
    }

    const fn perturbation_unchecked(shift: u32) -> Self {
        Self {
            kind: ProbeKind::Perturbation,
            shift,
        }
    }

    /// Which recurrence this strategy runs.
    pub fn kind(&self) -> ProbeKind {
        self.kind
    }

    /// Candidate slots for `hash` in a table with `mask = size - 1`.
    #[inline(always)]
    pub fn sequence(&self, hash: u64, mask: usize) -> ProbeSeq {
        debug_assert!((mask.wrapping_add(1)).is_power_of_two());

        ProbeSeq {
            index: hash as usize & mask,
            perturb: hash,
            mask,
            kind: self.kind,
            shift: self.shift,
            remaining: self.bound(mask),
        }
    }

    /// Number of steps after which every slot has been visited.
    ///
    /// Linear probing needs exactly `size` steps. Perturbation probing needs
    /// `size` steps once `perturb` has drained, which takes at most
    /// `ceil(64 / shift)` steps.
    pub fn bound(&self, mask: usize) -> usize {
        let size = mask.wrapping_add(1);
        match self.kind {
            ProbeKind::Linear => size,
            ProbeKind::Perturbation => size + 64usize.div_ceil(self.shift as usize) + 1,
        }
    }
}

/// Iterator over the candidate slots of one probe.
///
/// Yields the initial slot first and stops after [`ProbeStrategy::bound`]
/// indices.
#[derive(Debug, Clone)]
pub struct ProbeSeq {
    index: usize,
    perturb: u64,
    mask: usize,
    kind: ProbeKind,
    shift: u32,
    remaining: usize,
}

impl Iterator for ProbeSeq {
    type Item = usize;

    #[inline(always)]
    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let current = self.index;
        self.index = match self.kind {
            ProbeKind::Perturbation => {
                let next = self
                    .index
                    .wrapping_mul(5)
                    .wrapping_add(1)
                    .wrapping_add(self.perturb as usize)
                    & self.mask;
                self.perturb >>= self.shift;
                next
            }
            ProbeKind::Linear => self.index.wrapping_add(1) & self.mask,
        };

        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for ProbeSeq {}
