//! Broadcast Pool Service
//!
//! # Architecture
//! - `PendingRegistry` owned by the service behind one `parking_lot::Mutex`
//! - Admission decisions and collaborator queries run before the lock is
//!   taken; only registry mutation happens under it
//! - Drain takes the whole registry in one critical section, so every
//!   concurrent insert lands either in this drain or in the next one

use crate::config::BroadcastPoolConfig;
use crate::domain::{
    resolve_sender, Address, AdmissionFilter, Block, BroadcastError, BroadcastPayload,
    BroadcastResult, BroadcastStateMap, ControlMessage, ControlMessageKind, Extraction, Hash,
    InsertReport, PendingRegistry, StateExtractionScanner, Transaction,
};
use crate::ports::{
    BroadcastPoolApi, BroadcastStateApi, ChainHeadReader, RoleOracle, SignatureRecovery,
    StateReader,
};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Collaborators required by `BroadcastPoolService`.
pub struct BroadcastPoolDependencies<C, R, S>
where
    C: ChainHeadReader,
    R: RoleOracle,
    S: SignatureRecovery,
{
    pub chain: Arc<C>,
    pub roles: Arc<R>,
    pub recovery: Arc<S>,
    pub config: BroadcastPoolConfig,
}

/// Broadcast transaction pool.
pub struct BroadcastPoolService<C, R, S>
where
    C: ChainHeadReader,
    R: RoleOracle,
    S: SignatureRecovery,
{
    chain: Arc<C>,
    recovery: Arc<S>,
    filter: AdmissionFilter<R>,
    config: BroadcastPoolConfig,
    registry: Mutex<PendingRegistry>,
}

impl<C, R, S> BroadcastPoolService<C, R, S>
where
    C: ChainHeadReader,
    R: RoleOracle,
    S: SignatureRecovery,
{
    /// Creates an empty pool.
    ///
    /// # Errors
    /// `InvalidConfig` if the configuration does not validate.
    pub fn new(deps: BroadcastPoolDependencies<C, R, S>) -> BroadcastResult<Self> {
        deps.config.validate()?;
        Ok(Self {
            chain: deps.chain,
            recovery: deps.recovery,
            filter: AdmissionFilter::new(deps.config.epoch_calculator(), deps.roles),
            config: deps.config,
            registry: Mutex::new(PendingRegistry::new()),
        })
    }

    pub fn config(&self) -> &BroadcastPoolConfig {
        &self.config
    }

    /// Index of this pool among the node's transaction pools.
    pub fn pool_type(&self) -> u8 {
        crate::domain::BROADCAST_POOL_TYPE
    }

    /// Size, type and body checks. Nothing is evaluated per key until these pass.
    fn check_structure(&self, tx: &Transaction) -> BroadcastResult<BroadcastPayload> {
        let size = tx.encoded_size();
        if size > self.config.max_tx_size {
            return Err(BroadcastError::TransactionTooLarge {
                size,
                max: self.config.max_tx_size,
            });
        }
        if !tx.is_broadcast() {
            return Err(BroadcastError::WrongTransactionType {
                found: tx.extra.first().map(|extra| extra.tx_type),
            });
        }
        tx.payload()
            .map_err(|e| BroadcastError::MalformedPayload(e.to_string()))
    }

    /// Runs the admission filter over every key, in key order, stopping at the
    /// first failure. Returns the messages admitted before it.
    fn admit_keys(
        &self,
        payload: &BroadcastPayload,
        sender: &Address,
    ) -> BroadcastResult<(Vec<ControlMessage>, Option<BroadcastError>)> {
        let head = self.chain.current_head()?;

        let mut admitted = Vec::with_capacity(payload.len());
        for (key, value) in payload.iter() {
            match self.filter.decide(sender, key, head.height, &head.hash) {
                Ok(admission) => admitted.push(ControlMessage {
                    kind: admission.kind,
                    epoch: admission.epoch,
                    sender: *sender,
                    payload: value.clone(),
                }),
                Err(err) => {
                    if let Some(rejection) = err.rejection() {
                        crate::metrics::record_rejected(rejection.reason());
                        tracing::debug!(
                            reason = rejection.reason(),
                            sender = ?sender,
                            key = %key,
                            height = head.height,
                            "Broadcast key rejected"
                        );
                    }
                    return Ok((admitted, Some(err)));
                }
            }
        }
        Ok((admitted, None))
    }
}

impl<C, R, S> BroadcastPoolApi for BroadcastPoolService<C, R, S>
where
    C: ChainHeadReader,
    R: RoleOracle,
    S: SignatureRecovery,
{
    fn insert(&self, tx: Transaction) -> BroadcastResult<InsertReport> {
        let payload = self.check_structure(&tx)?;
        let tx_hash = tx.hash()?;
        let sender =
            resolve_sender(&tx, self.config.sender_strategy, self.recovery.as_ref())?.address;
        let (admitted, failure) = self.admit_keys(&payload, &sender)?;

        let mut report = InsertReport::default();
        if !admitted.is_empty() {
            let mut registry = self.registry.lock();
            for message in &admitted {
                let identity = message.identity();
                if registry.try_insert(identity, tx.clone()) {
                    report.accepted.push(identity);
                } else {
                    report.duplicates.push(identity);
                }
            }
        }

        for message in &admitted {
            let identity = message.identity();
            if report.accepted.contains(&identity) {
                crate::metrics::record_admitted();
                tracing::info!(
                    identity = ?identity,
                    tx_hash = ?tx_hash,
                    kind = %message.kind,
                    epoch = message.epoch,
                    sender = ?sender,
                    "Broadcast message buffered"
                );
            } else {
                crate::metrics::record_duplicate();
                tracing::trace!(identity = ?identity, "Discarding already known broadcast message");
            }
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(report),
        }
    }

    fn drain_and_clear(&self) -> HashMap<Address, Vec<Transaction>> {
        let drained = self.registry.lock().drain();
        let entry_count = drained.len();

        let mut by_sender: HashMap<Address, Vec<Transaction>> = HashMap::new();
        for (identity, entry) in drained {
            let sender = match resolve_sender(
                &entry.transaction,
                self.config.sender_strategy,
                self.recovery.as_ref(),
            ) {
                Ok(resolved) => resolved.address,
                Err(e) => {
                    tracing::warn!(
                        identity = ?identity,
                        error = %e,
                        "Dropping drained entry without sender"
                    );
                    continue;
                }
            };
            // one item per entry: a tx admitted under several keys appears once per key
            by_sender.entry(sender).or_default().push(entry.transaction);
        }

        crate::metrics::record_drained(entry_count);
        tracing::info!(
            entries = entry_count,
            senders = by_sender.len(),
            "Broadcast pool drained"
        );
        by_sender
    }

    fn pending_count(&self) -> usize {
        self.registry.lock().len()
    }
}

/// Extraction and committed-state lookup.
pub struct BroadcastStateService<S, T>
where
    S: SignatureRecovery,
    T: StateReader,
{
    scanner: StateExtractionScanner<S>,
    state: Arc<T>,
}

impl<S, T> BroadcastStateService<S, T>
where
    S: SignatureRecovery,
    T: StateReader,
{
    pub fn new(
        config: &BroadcastPoolConfig,
        recovery: Arc<S>,
        state: Arc<T>,
    ) -> BroadcastResult<Self> {
        config.validate()?;
        Ok(Self {
            scanner: StateExtractionScanner::new(config.epoch_calculator(), recovery),
            state,
        })
    }
}

impl<S, T> BroadcastStateApi for BroadcastStateService<S, T>
where
    S: SignatureRecovery,
    T: StateReader,
{
    fn extract(&self, block: &Block) -> BroadcastResult<Extraction> {
        self.scanner.extract(block)
    }

    fn lookup(
        &self,
        root: &Hash,
        kind: ControlMessageKind,
    ) -> BroadcastResult<BTreeMap<Address, Vec<u8>>> {
        let bytes = self.state.read_state(root, crate::BROADCAST_STATE_KEY)?;
        let state = BroadcastStateMap::decode(&bytes)?;
        state
            .get(kind)
            .cloned()
            .ok_or(BroadcastError::BroadcastKindNotFound(kind))
    }
}
