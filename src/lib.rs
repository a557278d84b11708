#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod config;

mod dict;

pub mod error;

/// A keyed map that hashes its own keys on top of [`Dict`].
pub mod hash_map;

pub mod hashing;

mod iter;

pub mod key;

mod lookup;

mod pool;

pub mod probe;

pub mod random_tables;

mod resize;

mod slot_table;

pub mod stats;

pub use config::Config;
pub use config::HashKind;
pub use config::IndexWidth;
pub use config::MIN_SIZE;
pub use config::ProbeKind;
pub use config::TabulationInput;
pub use config::TabulationLayout;
pub use dict::Dict;
pub use error::DictError;
pub use error::KeyError;
pub use error::Result;
pub use hash_map::HashMap;
pub use hashing::KeyHasher;
pub use iter::Iter;
pub use iter::Keys;
pub use iter::Values;
pub use key::DictKey;
pub use key::Key;
pub use probe::ProbeStrategy;
pub use resize::ResizePolicy;
pub use resize::size_for;
pub use slot_table::LookupKind;
#[cfg(feature = "stats")]
pub use stats::LayoutStats;
pub use stats::StatsSnapshot;
