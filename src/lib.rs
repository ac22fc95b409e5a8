//! # aht-rs
//!
//! A cache-friendly **array hash table**: an associative container mapping
//! arbitrary byte-string keys (embedded zero bytes included) to fixed-width
//! unsigned integer values.
//!
//! Instead of chaining entry objects, each hash bucket is a single contiguous
//! byte buffer of variable-length `[length prefix][key bytes][value]` records
//! terminated by a `0x00` byte. Lookups walk the buffer linearly, skipping
//! keys by length before comparing bytes. The flat layout keeps the table
//! useful at load factors far beyond one record per bucket; the bucket count
//! doubles only once the table holds five records per bucket on average.
//!
//! Designed as the leaf bucket structure of a hat-trie, but standing alone as
//! a compact string-keyed map.
//!
//! ## Example
//!
//! ```rust
//! use aht_rs::ArrayHashTable;
//!
//! let mut table: ArrayHashTable<u64> = ArrayHashTable::new();
//! table.insert(b"hello", 1).unwrap();
//! table.insert(b"world", 2).unwrap();
//!
//! assert_eq!(table.get(b"hello").unwrap(), Some(1));
//! assert_eq!(table.len(), 2);
//!
//! // Values are mutated in place through a handle.
//! table.get_or_insert(b"hello").unwrap().set(10);
//! assert_eq!(table.get(b"hello").unwrap(), Some(10));
//! ```
//!
//! ## Limits
//!
//! Keys must be 1 to 32767 bytes long: the record encoding stores the key
//! length in 15 bits, and a zero-length key would collide with the bucket
//! terminator. Out-of-range keys are rejected with [`KeyError`].

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod bucket;
pub mod codec;
pub mod error;
pub mod hash;
pub mod table;

pub use codec::SlotValue;
pub use error::KeyError;
pub use hash::{Fnv1a, KeyHash};
pub use table::{ArrayHashTable, Iter, ValueMut};

#[cfg(test)]
mod proptests;
