//! # State Extraction Scanner
//!
//! Rebuilds the per-kind `sender -> payload` maps from a finalized block so the
//! epoch's control data can be committed into shared state.
//!
//! Only blocks at broadcast heights are scanned. Transactions are not
//! re-admitted: inclusion in a finalized block already implies validity, so
//! keys are classified by tag *containment* rather than the filter's anchored
//! epoch suffix. The scanner never reads the live pending registry; its
//! output is a pure function of the block.

use super::entities::{Address, Block, ControlMessageKind};
use super::epoch::EpochCalculator;
use super::errors::{BroadcastError, BroadcastResult};
use super::sender::{resolve_sender, SenderStrategy};
use crate::ports::SignatureRecovery;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Committed broadcast data: kind -> sender -> payload.
///
/// Ordered maps so the encoding is identical on every node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastStateMap(pub BTreeMap<ControlMessageKind, BTreeMap<Address, Vec<u8>>>);

impl Default for BroadcastStateMap {
    fn default() -> Self {
        Self(
            ControlMessageKind::ALL
                .into_iter()
                .map(|kind| (kind, BTreeMap::new()))
                .collect(),
        )
    }
}

impl BroadcastStateMap {
    /// Map with an empty bucket for every kind.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: ControlMessageKind) -> Option<&BTreeMap<Address, Vec<u8>>> {
        self.0.get(&kind)
    }

    /// Files `payload` from `sender` under `kind`, replacing any earlier value.
    pub fn insert(&mut self, kind: ControlMessageKind, sender: Address, payload: Vec<u8>) {
        self.0.entry(kind).or_default().insert(sender, payload);
    }

    /// Total number of sender entries across all kinds.
    pub fn entry_count(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    pub fn encode(&self) -> BroadcastResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| BroadcastError::Encoding(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> BroadcastResult<Self> {
        bincode::deserialize(bytes).map_err(|e| BroadcastError::Encoding(e.to_string()))
    }
}

/// Result of scanning a boundary block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractionReport {
    pub height: u64,
    pub state: BroadcastStateMap,
    /// Broadcast transactions skipped for an undecodable body or sender.
    pub skipped_transactions: usize,
    /// Keys that matched no kind tag.
    pub unclassified_keys: usize,
}

/// Outcome of `StateExtractionScanner::extract`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Extraction {
    /// The block is not at a broadcast height.
    NotApplicable,
    Extracted(ExtractionReport),
}

/// Stateless block scanner.
pub struct StateExtractionScanner<S: SignatureRecovery> {
    epochs: EpochCalculator,
    recovery: Arc<S>,
}

impl<S: SignatureRecovery> StateExtractionScanner<S> {
    pub fn new(epochs: EpochCalculator, recovery: Arc<S>) -> Self {
        Self { epochs, recovery }
    }

    /// Extracts the broadcast state carried by `block`.
    ///
    /// # Errors
    /// `NoBroadcastData` if the block is at a broadcast height but no key in
    /// any of its transactions matched a kind.
    pub fn extract(&self, block: &Block) -> BroadcastResult<Extraction> {
        let height = block.number();
        // interval is fixed by config, so the parent hash plays no part in the boundary
        if !self.epochs.is_broadcast_height(height) {
            return Ok(Extraction::NotApplicable);
        }

        tracing::info!(
            height,
            block_hash = ?block.header.hash,
            parent_hash = ?block.header.parent_hash,
            "Extracting broadcast state"
        );

        let mut state = BroadcastStateMap::new();
        let mut matched = 0usize;
        let mut skipped_transactions = 0usize;
        let mut unclassified_keys = 0usize;

        for tx in block.transactions.iter().filter(|tx| tx.is_broadcast()) {
            let payload = match tx.payload() {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::warn!(height, error = %e, "Skipping broadcast tx with malformed body");
                    skipped_transactions += 1;
                    continue;
                }
            };

            let sender =
                match resolve_sender(tx, SenderStrategy::RecoveredOnly, self.recovery.as_ref()) {
                    Ok(resolved) => resolved.address,
                    Err(e) => {
                        tracing::warn!(height, error = %e, "Skipping broadcast tx without sender");
                        skipped_transactions += 1;
                        continue;
                    }
                };

            for (key, value) in payload.iter() {
                match ControlMessageKind::classify_loose(key) {
                    Some(kind) => {
                        state.insert(kind, sender, value.clone());
                        matched += 1;
                    }
                    None => unclassified_keys += 1,
                }
            }
        }

        if matched == 0 {
            return Err(BroadcastError::NoBroadcastData { height });
        }

        for kind in ControlMessageKind::ALL {
            let count = state.get(kind).map_or(0, BTreeMap::len);
            crate::metrics::record_extracted(kind.tag(), count);
        }
        tracing::info!(
            height,
            entries = state.entry_count(),
            skipped_transactions,
            unclassified_keys,
            "Broadcast state extracted"
        );

        Ok(Extraction::Extracted(ExtractionReport {
            height,
            state,
            skipped_transactions,
            unclassified_keys,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::SignatureTableRecovery;
    use crate::domain::{BlockHeader, BroadcastPayload, Transaction, TxExtra};

    const INTERVAL: u64 = 100;

    fn signed(payload: BroadcastPayload, signer: u8) -> Transaction {
        Transaction::broadcast(1, signer as u64, &payload).with_signature(vec![signer; 65])
    }

    fn recovery() -> SignatureTableRecovery {
        (1..=4u8).fold(SignatureTableRecovery::new(), |r, i| {
            r.with_signer(vec![i; 65], [i; 20])
        })
    }

    fn scanner() -> StateExtractionScanner<SignatureTableRecovery> {
        StateExtractionScanner::new(EpochCalculator::new(INTERVAL), Arc::new(recovery()))
    }

    fn block(number: u64, transactions: Vec<Transaction>) -> Block {
        Block {
            header: BlockHeader {
                number,
                hash: [0xEE; 32],
                parent_hash: [0xDD; 32],
            },
            transactions,
        }
    }

    fn report(extraction: Extraction) -> ExtractionReport {
        match extraction {
            Extraction::Extracted(report) => report,
            Extraction::NotApplicable => panic!("expected extraction"),
        }
    }

    #[test]
    fn test_non_boundary_block_not_applicable() {
        let tx = signed(BroadcastPayload::new().with_entry("heartbeat3", vec![1]), 1);
        let result = scanner().extract(&block(201, vec![tx])).unwrap();
        assert_eq!(result, Extraction::NotApplicable);
    }

    #[test]
    fn test_boundary_block_without_broadcast_data() {
        let result = scanner().extract(&block(200, vec![]));
        assert_eq!(result, Err(BroadcastError::NoBroadcastData { height: 200 }));
    }

    #[test]
    fn test_boundary_block_with_only_unmatched_keys() {
        let unclassified = signed(
            BroadcastPayload::new()
                .with_entry("foobar3", vec![1])
                .with_entry("attendance3", vec![2]),
            1,
        );
        let mut malformed = signed(BroadcastPayload::new(), 2);
        malformed.data = b"not json".to_vec();

        let result = scanner().extract(&block(200, vec![unclassified, malformed]));
        assert_eq!(result, Err(BroadcastError::NoBroadcastData { height: 200 }));
    }

    #[test]
    fn test_extracts_by_kind_and_sender() {
        let txs = vec![
            signed(
                BroadcastPayload::new()
                    .with_entry("publickey3", vec![0xA1])
                    .with_entry("heartbeat3", vec![0xB1]),
                1,
            ),
            signed(BroadcastPayload::new().with_entry("rollcall3", vec![0xC2]), 2),
            signed(BroadcastPayload::new().with_entry("privatekey3", vec![0xD3]), 3),
        ];

        let report = report(scanner().extract(&block(200, txs)).unwrap());
        let state = &report.state;
        assert_eq!(state.entry_count(), 4);
        assert_eq!(
            state.get(ControlMessageKind::PublicKey).unwrap()[&[1; 20]],
            vec![0xA1]
        );
        assert_eq!(
            state.get(ControlMessageKind::Heartbeat).unwrap()[&[1; 20]],
            vec![0xB1]
        );
        assert_eq!(
            state.get(ControlMessageKind::RollCall).unwrap()[&[2; 20]],
            vec![0xC2]
        );
        assert_eq!(
            state.get(ControlMessageKind::PrivateKey).unwrap()[&[3; 20]],
            vec![0xD3]
        );
    }

    #[test]
    fn test_classification_by_containment_ignores_epoch() {
        // Stale epoch and decorated key still classify once finalized.
        let tx = signed(BroadcastPayload::new().with_entry("x-heartbeat-1", vec![9]), 1);
        let report = report(scanner().extract(&block(300, vec![tx])).unwrap());
        assert_eq!(
            report.state.get(ControlMessageKind::Heartbeat).unwrap()[&[1; 20]],
            vec![9]
        );
    }

    #[test]
    fn test_skips_and_counts_bad_entries() {
        let mut malformed = signed(BroadcastPayload::new(), 1);
        malformed.data = b"not json".to_vec();
        let unsigned = Transaction::broadcast(
            1,
            0,
            &BroadcastPayload::new().with_entry("heartbeat3", vec![1]),
        );
        let mut transfer = signed(BroadcastPayload::new().with_entry("heartbeat3", vec![5]), 4);
        transfer.extra = vec![TxExtra { tx_type: 0 }];
        let good = signed(
            BroadcastPayload::new()
                .with_entry("foobar3", vec![0])
                .with_entry("heartbeat3", vec![2]),
            2,
        );

        let report = report(
            scanner()
                .extract(&block(200, vec![malformed, unsigned, transfer, good]))
                .unwrap(),
        );
        assert_eq!(report.skipped_transactions, 2);
        assert_eq!(report.unclassified_keys, 1);
        assert_eq!(report.state.entry_count(), 1);
        assert!(!report
            .state
            .get(ControlMessageKind::Heartbeat)
            .unwrap()
            .contains_key(&[4; 20]));
    }

    #[test]
    fn test_embedded_sender_not_trusted() {
        let tx = signed(BroadcastPayload::new().with_entry("heartbeat3", vec![1]), 2)
            .with_sender([0x99; 20]);
        let report = report(scanner().extract(&block(200, vec![tx])).unwrap());
        let bucket = report.state.get(ControlMessageKind::Heartbeat).unwrap();
        assert!(bucket.contains_key(&[2; 20]));
        assert!(!bucket.contains_key(&[0x99; 20]));
    }

    #[test]
    fn test_extraction_is_repeatable() {
        let txs = vec![signed(
            BroadcastPayload::new().with_entry("publickey3", vec![1]),
            1,
        )];
        let block = block(200, txs);
        let scanner = scanner();
        assert_eq!(scanner.extract(&block), scanner.extract(&block));
    }

    #[test]
    fn test_state_map_encoding() {
        let mut state = BroadcastStateMap::new();
        state.insert(ControlMessageKind::Heartbeat, [1; 20], vec![1, 2]);
        let decoded = BroadcastStateMap::decode(&state.encode().unwrap()).unwrap();
        assert_eq!(decoded, state);
        assert!(BroadcastStateMap::decode(&[0xFF]).is_err());
    }

    #[test]
    fn test_new_state_map_has_every_bucket() {
        let state = BroadcastStateMap::new();
        for kind in ControlMessageKind::ALL {
            assert!(state.get(kind).unwrap().is_empty());
        }
        assert_eq!(state.entry_count(), 0);
    }
}
