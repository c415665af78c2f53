//! # Pending Registry
//!
//! Buffer of admitted, not-yet-drained broadcast messages keyed by identity
//! hash (`keccak(kind_tag ++ epoch ++ sender)`).
//!
//! ## Invariants
//!
//! - No two entries share an identity hash (`try_insert` never overwrites).
//! - `drain` is the only removal path and removes every entry.
//!
//! The registry itself is not synchronized; `BroadcastPoolService` owns it
//! behind a single mutex.

use super::entities::{Hash, Transaction};
use std::collections::HashMap;

/// A buffered entry: the originating transaction plus its arrival sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingEntry {
    pub transaction: Transaction,
    pub sequence: u64,
}

/// Per-transaction outcome of an insert.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InsertReport {
    /// Identities newly buffered by this call.
    pub accepted: Vec<Hash>,
    /// Identities that were already buffered and were skipped.
    pub duplicates: Vec<Hash>,
}

/// Identity-indexed arena of pending broadcast transactions.
#[derive(Debug, Default)]
pub struct PendingRegistry {
    entries: HashMap<Hash, PendingEntry>,
    next_sequence: u64,
}

impl PendingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, identity: &Hash) -> bool {
        self.entries.contains_key(identity)
    }

    /// Inserts `tx` under `identity` unless that identity is already buffered.
    ///
    /// Returns `false` for a duplicate; the existing entry is kept.
    pub fn try_insert(&mut self, identity: Hash, tx: Transaction) -> bool {
        if self.entries.contains_key(&identity) {
            return false;
        }
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.entries.insert(
            identity,
            PendingEntry {
                transaction: tx,
                sequence,
            },
        );
        true
    }

    /// Takes every entry, ordered by arrival, leaving the registry empty.
    pub fn drain(&mut self) -> Vec<(Hash, PendingEntry)> {
        let mut drained: Vec<_> = std::mem::take(&mut self.entries).into_iter().collect();
        drained.sort_by_key(|(_, entry)| entry.sequence);
        drained
    }
}
