//! Outbound (Driven) ports for the Broadcast Pool subsystem.
//!
//! Collaborators the pool queries but does not own: the chain head, the role
//! oracle, signature recovery and the shared consensus state.
//!
//! Implementations must fail fast. The service calls these while an insert
//! is in flight and performs no retries of its own.

use crate::domain::{Address, BroadcastResult, Hash, Transaction};
use std::collections::HashSet;

/// Membership categories an address may hold at a given height.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// Nodes allowed to send roll-call messages.
    Broadcast,
    /// Elected validators (key announcements).
    ElectedValidator,
    /// Every elected node, validators and miners alike (heartbeats).
    ElectedNode,
}

/// Snapshot of the chain head.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ChainHead {
    pub height: u64,
    pub hash: Hash,
}

/// Chain head accessor.
pub trait ChainHeadReader: Send + Sync {
    /// Height and hash of the current head, read together.
    fn current_head(&self) -> BroadcastResult<ChainHead>;

    fn current_height(&self) -> BroadcastResult<u64> {
        self.current_head().map(|head| head.height)
    }

    fn current_hash(&self) -> BroadcastResult<Hash> {
        self.current_head().map(|head| head.hash)
    }
}

/// Answers "who holds role R at height H".
pub trait RoleOracle: Send + Sync {
    fn role_members(&self, height: u64, role: Role) -> BroadcastResult<HashSet<Address>>;
}

/// Signature-based sender derivation.
pub trait SignatureRecovery: Send + Sync {
    /// Recovers the signer of `tx`.
    ///
    /// # Errors
    /// `InvalidSender` if the signature is missing or does not recover.
    fn recover_sender(&self, tx: &Transaction) -> BroadcastResult<Address>;
}

/// Read access to the consensus-wide key-value state.
pub trait StateReader: Send + Sync {
    /// Reads the value stored under `key` in the state at `root`.
    fn read_state(&self, root: &Hash, key: &str) -> BroadcastResult<Vec<u8>>;
}
