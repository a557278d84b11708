//! Lookup instrumentation.
//!
//! Counters are compiled in only with the `stats` feature and only count when
//! the table was built with [`Config::instrumented`](crate::Config::instrumented).
//! Without the feature [`Counters`] is zero-sized and every method is empty,
//! so snapshots read as all zeros.

use core::fmt;

/// Point-in-time copy of a table's lookup counters.
///
/// Probes and collisions are kept per lookup path, so the byte-string fast
/// path can be compared with the general path on the same table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Lookups served by the general path.
    pub general_lookups: u64,
    /// Slots inspected by general lookups.
    pub general_probes: u64,
    /// Slots inspected by general lookups beyond the first of each lookup.
    pub general_collisions: u64,
    /// Lookups served by the byte-string fast path.
    pub fast_lookups: u64,
    /// Slots inspected by fast path lookups.
    pub fast_probes: u64,
    /// Slots inspected by fast path lookups beyond the first of each lookup.
    pub fast_collisions: u64,
    /// Times the table abandoned the fast path. At most one per table.
    pub conversions: u64,
}

fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

impl StatsSnapshot {
    /// Total lookups on either path.
    pub fn lookups(&self) -> u64 {
        self.general_lookups + self.fast_lookups
    }

    /// Slots inspected on either path.
    pub fn probes(&self) -> u64 {
        self.general_probes + self.fast_probes
    }

    /// Collisions on either path.
    pub fn collisions(&self) -> u64 {
        self.general_collisions + self.fast_collisions
    }

    /// Average slots inspected per lookup.
    pub fn mean_probe_length(&self) -> f64 {
        ratio(self.probes(), self.lookups())
    }

    /// Average slots inspected per general lookup.
    pub fn general_mean_probe_length(&self) -> f64 {
        ratio(self.general_probes, self.general_lookups)
    }

    /// Average slots inspected per fast path lookup.
    pub fn fast_mean_probe_length(&self) -> f64 {
        ratio(self.fast_probes, self.fast_lookups)
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Dictionary Lookup Statistics ===")?;
        writeln!(
            f,
            "General: {} lookups, {} probes ({} collisions, {:.3} per lookup)",
            self.general_lookups,
            self.general_probes,
            self.general_collisions,
            self.general_mean_probe_length()
        )?;
        writeln!(
            f,
            "Fast path: {} lookups, {} probes ({} collisions, {:.3} per lookup)",
            self.fast_lookups,
            self.fast_probes,
            self.fast_collisions,
            self.fast_mean_probe_length()
        )?;
        write!(f, "Fast path conversions: {}", self.conversions)
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "stats")] {
        use core::cell::Cell;

        /// Lookup counters owned by one table.
        #[derive(Debug, Default)]
        pub(crate) struct Counters {
            enabled: bool,
            general_lookups: Cell<u64>,
            general_probes: Cell<u64>,
            general_collisions: Cell<u64>,
            fast_lookups: Cell<u64>,
            fast_probes: Cell<u64>,
            fast_collisions: Cell<u64>,
            conversions: Cell<u64>,
        }

        impl Counters {
            pub(crate) fn new(enabled: bool) -> Self {
                Self {
                    enabled,
                    ..Self::default()
                }
            }

            #[inline]
            fn bump(&self, cell: &Cell<u64>) {
                if self.enabled {
                    cell.set(cell.get() + 1);
                }
            }

            #[inline]
            pub(crate) fn general_lookup(&self) {
                self.bump(&self.general_lookups);
            }

            #[inline]
            pub(crate) fn fast_lookup(&self) {
                self.bump(&self.fast_lookups);
            }

            /// Record one slot inspected by a general lookup; `step` is its
            /// position in the probe.
            #[inline]
            pub(crate) fn general_probe(&self, step: usize) {
                self.bump(&self.general_probes);
                if step > 0 {
                    self.bump(&self.general_collisions);
                }
            }

            #[inline]
            pub(crate) fn fast_probe(&self, step: usize) {
                self.bump(&self.fast_probes);
                if step > 0 {
                    self.bump(&self.fast_collisions);
                }
            }

            #[inline]
            pub(crate) fn conversion(&self) {
                self.bump(&self.conversions);
            }

            pub(crate) fn snapshot(&self) -> StatsSnapshot {
                StatsSnapshot {
                    general_lookups: self.general_lookups.get(),
                    general_probes: self.general_probes.get(),
                    general_collisions: self.general_collisions.get(),
                    fast_lookups: self.fast_lookups.get(),
                    fast_probes: self.fast_probes.get(),
                    fast_collisions: self.fast_collisions.get(),
                    conversions: self.conversions.get(),
                }
            }

            pub(crate) fn reset(&self) {
                for cell in [
                    &self.general_lookups,
                    &self.general_probes,
                    &self.general_collisions,
                    &self.fast_lookups,
                    &self.fast_probes,
                    &self.fast_collisions,
                    &self.conversions,
                ] {
                    cell.set(0);
                }
            }
        }
    } else {
        #[derive(Debug, Default)]
        pub(crate) struct Counters;

        impl Counters {
            pub(crate) fn new(_enabled: bool) -> Self {
                Counters
            }

            #[inline(always)]
            pub(crate) fn general_lookup(&self) {}

            #[inline(always)]
            pub(crate) fn fast_lookup(&self) {}

            #[inline(always)]
            pub(crate) fn general_probe(&self, _step: usize) {}

            #[inline(always)]
            pub(crate) fn fast_probe(&self, _step: usize) {}

            #[inline(always)]
            pub(crate) fn conversion(&self) {}

            pub(crate) fn snapshot(&self) -> StatsSnapshot {
                StatsSnapshot::default()
            }

            pub(crate) fn reset(&self) {}
        }
    }
}

/// Slot-level layout of a table at one instant.
#[cfg(feature = "stats")]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutStats {
    /// Total slots.
    pub size: usize,
    /// Live entries.
    pub used: usize,
    /// Live entries plus tombstones.
    pub fill: usize,
    /// Deleted slots still occupying probe paths.
    pub tombstones: usize,
    /// Never-used slots.
    pub empty: usize,
    /// `used / size`
    pub load_factor: f64,
    /// `fill / size`
    pub fill_factor: f64,
    /// Longest probe needed to reach a live entry.
    pub max_probe_length: usize,
    /// Average probe needed to reach a live entry.
    pub mean_probe_length: f64,
}

#[cfg(feature = "stats")]
impl LayoutStats {
    /// Pretty-print the layout.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Dictionary Layout ===");
        println!(
            "Entries: {}/{} ({:.2}% load factor)",
            self.used,
            self.size,
            self.load_factor * 100.0
        );
        println!(
            "Fill: {} ({} tombstones, {} empty, {:.2}% filled)",
            self.fill,
            self.tombstones,
            self.empty,
            self.fill_factor * 100.0
        );
        println!(
            "Probe length: max {}, mean {:.3}",
            self.max_probe_length, self.mean_probe_length
        );
    }
}

/// Print a probe-length histogram as horizontal bars.
#[cfg(all(feature = "stats", feature = "std"))]
pub fn print_histogram(hist: &[usize]) {
    let max = hist.iter().copied().max().unwrap_or(0);
    if max == 0 {
        println!("probe histogram: empty");
        return;
    }

    let max_bar = 60usize;
    let total_units = max_bar * 8;
    println!(
        "probe histogram ({} entries):",
        hist.iter().sum::<usize>()
    );

    for (length, &count) in hist.iter().enumerate() {
        let units = (count * total_units).div_ceil(max);
        let mut bar = "█".repeat(units / 8);
        match units % 8 {
            0 => {}
            1 => bar.push('▏'),
            2 => bar.push('▎'),
            3 => bar.push('▍'),
            4 => bar.push('▌'),
            5 => bar.push('▋'),
            6 => bar.push('▊'),
            _ => bar.push('▉'),
        }
        println!("{:>3} | {} ({})", length + 1, bar, count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_ratios() {
        let snapshot = StatsSnapshot {
            general_lookups: 1,
            general_probes: 4,
            general_collisions: 3,
            fast_lookups: 3,
            fast_probes: 6,
            fast_collisions: 3,
            conversions: 1,
        };
        assert_eq!(snapshot.lookups(), 4);
        assert_eq!(snapshot.probes(), 10);
        assert_eq!(snapshot.collisions(), 6);
        assert_eq!(snapshot.mean_probe_length(), 2.5);
        assert_eq!(snapshot.general_mean_probe_length(), 4.0);
        assert_eq!(snapshot.fast_mean_probe_length(), 2.0);
        assert_eq!(StatsSnapshot::default().mean_probe_length(), 0.0);
        assert_eq!(StatsSnapshot::default().fast_mean_probe_length(), 0.0);
    }

    #[cfg(feature = "stats")]
    #[test]
    fn counters_count_when_enabled() {
        let counters = Counters::new(true);
        counters.fast_lookup();
        counters.fast_probe(0);
        counters.fast_probe(1);
        counters.fast_probe(2);
        counters.general_lookup();
        counters.general_probe(0);
        counters.conversion();

        let snapshot = counters.snapshot();
        assert_eq!(snapshot.fast_lookups, 1);
        assert_eq!(snapshot.fast_probes, 3);
        assert_eq!(snapshot.fast_collisions, 2);
        assert_eq!(snapshot.general_lookups, 1);
        assert_eq!(snapshot.general_probes, 1);
        assert_eq!(snapshot.general_collisions, 0);
        assert_eq!(snapshot.conversions, 1);

        counters.reset();
        assert_eq!(counters.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn disabled_counters_stay_zero() {
        let counters = Counters::new(false);
        counters.fast_lookup();
        counters.fast_probe(4);
        counters.general_probe(4);
        counters.conversion();
        assert_eq!(counters.snapshot(), StatsSnapshot::default());
    }
}
