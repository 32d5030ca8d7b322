//! kind-dict: a single-threaded chained hash table whose key representation
//! is chosen from a closed set of kinds, with fixed-width byte values and a
//! pluggable allocator, plus a region bump arena that can back it.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: one table implementation that serves every key kind without
//!   monomorphising the chain logic over key types.
//! - Pieces:
//!   - Arena: region-chained bump allocator. Allocation only; memory comes
//!     back wholesale through `reset`, `rewind` or `release`.
//!   - DictAlloc: the allocate/optional-deallocate capability the table
//!     consumes. `System` reclaims; `&Arena` does not.
//!   - KeyKind + DictKey: the closed set of key representations and their
//!     default copy, hash, equality and release.
//!   - Dict<K, A>: bucket vector of chains over a slot map of entry nodes.
//!
//! Storage
//! - Every key is kept in a word-padded *slot*. Scalars are stored by value,
//!   text as a pointer to an owned NUL-terminated duplicate, records as raw
//!   bytes.
//! - Each entry owns one allocator block: key slot, then value bytes. Chain
//!   links are generational slot map keys, so blocks never move; reshaping
//!   only rewrites links, and value addresses stay valid until that entry is
//!   removed or the table is dropped.
//! - The allocator provides entry blocks, the chain array, the scratch key
//!   buffer, text duplicates and raw key snapshots. Only the slot map that
//!   indexes nodes lives on the global heap.
//!
//! Hashing and growth
//! - Each node stores its hash; reshaping never calls user hooks.
//! - The default hashes are deliberately simple (numeric identity,
//!   polynomial over bytes) and compatible with existing snapshots.
//! - A table starts at 8 chains and grows fourfold when a chain becomes
//!   longer than the number of chains.
//!
//! Reentrancy policy
//! - Every keyed operation encodes the candidate key into one scratch
//!   buffer owned by the table, including `contains_key(&self)`. Hooks run
//!   while it is live, so a hook must not call back into the same table. A
//!   guard catches that in every build and panics with both operation names.
//!
//! Failure tiers
//! - Allocation failure aborts through `handle_alloc_error`.
//! - Broken preconditions (missing record width, record key of the wrong
//!   length, NUL inside a text key, stale arena checkpoint) panic.
//! - Malformed snapshots are the only recoverable error: [`DecodeError`].
//! - Absent keys are ordinary `false`/`None` results.
//!
//! Notes and non-goals
//! - `!Send`/`!Sync`: raw blocks and `Cell`s, no synchronisation.
//! - No ordering guarantee beyond bucket-then-chain.
//! - Snapshots carry widths but no kind tag or checksum.

mod alloc;
mod arena;
mod codec;
mod dict;
#[cfg(test)]
mod dict_proptest;
mod error;
mod key;
mod reentrancy;
mod value;

// Public surface
pub use alloc::{round_to_word, DictAlloc, System, WORD};
pub use arena::{Arena, ArenaConfig, ArenaStats, Checkpoint};
pub use dict::{Dict, Handle, Iter, IterMut, RawKeys, DEFAULT_BUCKETS};
pub use error::DecodeError;
pub use key::{polynomial_hash, CopyFn, DestroyFn, DictKey, EqFn, HashFn, KeyAttr, KeyKind, ValueAttr};
pub use value::Plain;
