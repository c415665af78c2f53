//! In-memory collaborator adapters.
//!
//! Used by tests and single-process simulations in place of the chain, the
//! role service, signature recovery and the state database.

use crate::domain::{Address, BroadcastError, BroadcastResult, Hash, Transaction};
use crate::ports::{ChainHead, ChainHeadReader, Role, RoleOracle, SignatureRecovery, StateReader};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

/// Role oracle backed by fixed member sets, the same at every height.
#[derive(Debug, Default)]
pub struct StaticRoleOracle {
    members: RwLock<HashMap<Role, HashSet<Address>>>,
    failure: Option<String>,
}

impl StaticRoleOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// An oracle whose every query fails with `message`.
    pub fn unavailable(message: &str) -> Self {
        Self {
            members: RwLock::new(HashMap::new()),
            failure: Some(message.to_string()),
        }
    }

    pub fn with_member(self, role: Role, address: Address) -> Self {
        self.add_member(role, address);
        self
    }

    pub fn add_member(&self, role: Role, address: Address) {
        self.members.write().entry(role).or_default().insert(address);
    }

    pub fn remove_member(&self, role: Role, address: &Address) {
        if let Some(set) = self.members.write().get_mut(&role) {
            set.remove(address);
        }
    }
}

impl RoleOracle for StaticRoleOracle {
    fn role_members(&self, _height: u64, role: Role) -> BroadcastResult<HashSet<Address>> {
        if let Some(message) = &self.failure {
            return Err(BroadcastError::RoleOracle(message.clone()));
        }
        Ok(self.members.read().get(&role).cloned().unwrap_or_default())
    }
}

/// Chain head that tests move by hand.
#[derive(Debug, Default)]
pub struct ManualChainHead {
    head: RwLock<ChainHead>,
}

impl ManualChainHead {
    pub fn new(height: u64, hash: Hash) -> Self {
        Self {
            head: RwLock::new(ChainHead { height, hash }),
        }
    }

    pub fn set_head(&self, height: u64, hash: Hash) {
        *self.head.write() = ChainHead { height, hash };
    }
}

impl ChainHeadReader for ManualChainHead {
    fn current_head(&self) -> BroadcastResult<ChainHead> {
        Ok(*self.head.read())
    }
}

/// Signature "recovery" by table lookup of the raw signature bytes.
#[derive(Debug, Default)]
pub struct SignatureTableRecovery {
    signers: HashMap<Vec<u8>, Address>,
}

impl SignatureTableRecovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_signer(mut self, signature: Vec<u8>, signer: Address) -> Self {
        self.signers.insert(signature, signer);
        self
    }
}

impl SignatureRecovery for SignatureTableRecovery {
    fn recover_sender(&self, tx: &Transaction) -> BroadcastResult<Address> {
        if tx.signature.is_empty() {
            return Err(BroadcastError::InvalidSender("missing signature".into()));
        }
        self.signers
            .get(&tx.signature)
            .copied()
            .ok_or_else(|| BroadcastError::InvalidSender("signature does not recover".into()))
    }
}

/// State store keyed by `(root, key)`.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    values: RwLock<HashMap<(Hash, String), Vec<u8>>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, root: Hash, key: &str, value: Vec<u8>) {
        self.values.write().insert((root, key.to_string()), value);
    }
}

impl StateReader for InMemoryStateStore {
    fn read_state(&self, root: &Hash, key: &str) -> BroadcastResult<Vec<u8>> {
        self.values
            .read()
            .get(&(*root, key.to_string()))
            .cloned()
            .ok_or_else(|| BroadcastError::State(format!("no value for {key} at root {root:?}")))
    }
}
