//! When and to what size a table is rebuilt.

use crate::config::Config;
use crate::config::DEFAULT_QUADRUPLE_LIMIT;
use crate::config::MIN_SIZE;

/// Growth rules for one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizePolicy {
    quadruple_limit: usize,
}

impl Default for ResizePolicy {
    fn default() -> Self {
        Self {
            quadruple_limit: DEFAULT_QUADRUPLE_LIMIT,
        }
    }
}

impl ResizePolicy {
    /// Policy using the quadruple limit of `config`.
    pub fn new(config: &Config) -> Self {
        Self {
            quadruple_limit: config.quadruple_limit_amount(),
        }
    }

    /// Whether a table with `fill` non-empty slots out of `size` has reached
    /// the 2/3 load factor.
    #[inline]
    pub fn needs_grow(&self, fill: usize, size: usize) -> bool {
        fill.saturating_mul(3) >= size.saturating_mul(2)
    }

    /// Size to rebuild into after crossing the load factor with `used` live
    /// entries.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tabdict::ResizePolicy;
    ///
    /// let policy = ResizePolicy::default();
    /// assert_eq!(policy.grow_target(6), 32);
    /// assert_eq!(policy.grow_target(60_000), 131_072);
    /// ```
    pub fn grow_target(&self, used: usize) -> usize {
        let factor = if used <= self.quadruple_limit { 4 } else { 2 };
        size_for(used.saturating_mul(factor))
    }

    /// Smallest size holding `used` entries below the load factor.
    pub fn fit_target(&self, used: usize) -> usize {
        size_for(used.saturating_mul(3) / 2 + 1)
    }
}

/// Next power of two at or above `target`, and at least [`MIN_SIZE`].
///
/// Saturates to `usize::MAX` when no such power exists; allocating that many
/// slots always fails, which surfaces as an allocation error.
pub fn size_for(target: usize) -> usize {
    target
        .max(MIN_SIZE)
        .checked_next_power_of_two()
        .unwrap_or(usize::MAX)
}
