//! # Inbound Ports
//!
//! | Method | Caller |
//! |--------|--------|
//! | `BroadcastPoolApi::insert` | Networking ingress |
//! | `BroadcastPoolApi::drain_and_clear` | Block production |
//! | `BroadcastStateApi::extract` | State commit after finalization |
//! | `BroadcastStateApi::lookup` | Later epochs reading committed data |

use crate::domain::{
    Address, BroadcastResult, ControlMessageKind, Extraction, Hash, InsertReport, Transaction,
};
use std::collections::{BTreeMap, HashMap};

/// Pending broadcast transaction pool.
///
/// # Example
///
/// ```rust,ignore
/// use qc_18_broadcast_pool::ports::BroadcastPoolApi;
///
/// fn produce(pool: &impl BroadcastPoolApi) {
///     let by_sender = pool.drain_and_clear();
///     for (sender, txs) in by_sender {
///         // embed txs in the block under construction
///     }
/// }
/// ```
pub trait BroadcastPoolApi: Send + Sync {
    /// Admits every key of a broadcast transaction.
    ///
    /// Structural checks (size, type, body) run before any key is evaluated.
    /// Keys are evaluated in order and processing stops at the first
    /// rejected key; keys admitted before it stay buffered.
    ///
    /// # Errors
    /// - `TransactionTooLarge`, `WrongTransactionType`, `MalformedPayload`
    /// - `InvalidSender` if no sender can be resolved
    /// - `Rejected(..)` for the first key the admission filter refuses
    /// - `ChainHead` / `RoleOracle` if a collaborator query fails
    ///
    /// Duplicates are not errors; they are listed in the report.
    fn insert(&self, tx: Transaction) -> BroadcastResult<InsertReport>;

    /// Removes every buffered entry and returns the transactions grouped by sender.
    fn drain_and_clear(&self) -> HashMap<Address, Vec<Transaction>>;

    /// Number of buffered entries.
    fn pending_count(&self) -> usize;
}

/// Extraction and lookup of committed broadcast state.
pub trait BroadcastStateApi: Send + Sync {
    /// Scans a finalized block. See `StateExtractionScanner::extract`.
    fn extract(&self, block: &crate::domain::Block) -> BroadcastResult<Extraction>;

    /// Reads the committed `sender -> payload` map for `kind` from the state at `root`.
    ///
    /// # Errors
    /// - `State` if the state read fails
    /// - `Encoding` if the stored value does not decode
    /// - `BroadcastKindNotFound` if the stored map has no bucket for `kind`
    fn lookup(
        &self,
        root: &Hash,
        kind: ControlMessageKind,
    ) -> BroadcastResult<BTreeMap<Address, Vec<u8>>>;
}
