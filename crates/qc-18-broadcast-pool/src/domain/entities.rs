//! Core domain entities for the Broadcast Pool subsystem.
//!
//! Broadcast transactions carry control-plane data (heartbeats, key
//! announcements, roll-call attendance) between consensus roles. Their body is
//! a JSON object mapping `<kind_tag><epoch>` keys to opaque byte payloads.

use super::errors::{BroadcastError, BroadcastResult};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::collections::BTreeMap;
use std::fmt;

pub use primitive_types::U256;

/// A 32-byte hash (Keccak-256).
pub type Hash = [u8; 32];

/// A 20-byte account address.
pub type Address = [u8; 20];

/// `TxExtra::tx_type` value marking a broadcast (special) transaction.
pub const BROADCAST_TX_TYPE: u8 = 1;

/// Index identifying the broadcast pool among the node's transaction pools.
pub const BROADCAST_POOL_TYPE: u8 = 1;

/// Kind of control message carried by a broadcast transaction.
///
/// Closed set: keys whose prefix is not one of these tags are never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ControlMessageKind {
    /// Validator public key announcement.
    PublicKey,
    /// Validator private key reveal.
    PrivateKey,
    /// Per-epoch liveness heartbeat.
    Heartbeat,
    /// Roll-call attendance from broadcast nodes.
    RollCall,
}

impl ControlMessageKind {
    /// All kinds, in the order the extraction scanner classifies keys.
    pub const ALL: [ControlMessageKind; 4] = [
        ControlMessageKind::PublicKey,
        ControlMessageKind::PrivateKey,
        ControlMessageKind::Heartbeat,
        ControlMessageKind::RollCall,
    ];

    /// Key prefix used on the wire.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::PublicKey => "publickey",
            Self::PrivateKey => "privatekey",
            Self::Heartbeat => "heartbeat",
            Self::RollCall => "rollcall",
        }
    }

    /// Parses an exact key prefix.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// Classifies a key by substring containment of a kind tag.
    pub fn classify_loose(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| key.contains(kind.tag()))
    }

    /// Builds the wire key for this kind at `epoch`.
    pub fn key_for_epoch(&self, epoch: u64) -> String {
        format!("{}{}", self.tag(), epoch)
    }
}

impl fmt::Display for ControlMessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Sidecar metadata attached to a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TxExtra {
    /// Special transaction type; `BROADCAST_TX_TYPE` for broadcast transactions.
    pub tx_type: u8,
}

/// A transaction as seen by the broadcast pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Chain identifier used by signature recovery.
    pub chain_id: u64,
    /// Sender's nonce.
    pub nonce: u64,
    /// Sender embedded by the originating node, if any.
    pub from: Option<Address>,
    /// Transaction payload. For broadcast transactions, a JSON object of byte arrays.
    pub data: Vec<u8>,
    /// Sidecar metadata.
    pub extra: Vec<TxExtra>,
    /// Recoverable ECDSA signature (r, s, v).
    pub signature: Vec<u8>,
}

impl Transaction {
    /// Creates an unsigned broadcast transaction carrying `payload`.
    pub fn broadcast(chain_id: u64, nonce: u64, payload: &BroadcastPayload) -> Self {
        Self {
            chain_id,
            nonce,
            from: None,
            data: payload.to_bytes(),
            extra: vec![TxExtra {
                tx_type: BROADCAST_TX_TYPE,
            }],
            signature: Vec::new(),
        }
    }

    /// Sets the embedded sender.
    pub fn with_sender(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    /// Sets the signature bytes.
    pub fn with_signature(mut self, signature: Vec<u8>) -> Self {
        self.signature = signature;
        self
    }

    /// Returns true if the first sidecar entry declares a broadcast transaction.
    pub fn is_broadcast(&self) -> bool {
        self.extra
            .first()
            .is_some_and(|extra| extra.tx_type == BROADCAST_TX_TYPE)
    }

    /// Encoded size in bytes.
    ///
    /// An unmeasurable transaction reports `usize::MAX` so size limits reject it.
    pub fn encoded_size(&self) -> usize {
        bincode::serialized_size(self)
            .map(|size| size as usize)
            .unwrap_or(usize::MAX)
    }

    /// Keccak-256 of the encoded transaction.
    pub fn hash(&self) -> BroadcastResult<Hash> {
        let encoded =
            bincode::serialize(self).map_err(|e| BroadcastError::Encoding(e.to_string()))?;
        Ok(keccak256(&encoded))
    }

    /// Decodes the JSON-object body.
    pub fn payload(&self) -> Result<BroadcastPayload, serde_json::Error> {
        BroadcastPayload::from_bytes(&self.data)
    }
}

/// Decoded body of a broadcast transaction: key string to opaque payload.
///
/// Keys iterate in sorted order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BroadcastPayload(pub BTreeMap<String, Vec<u8>>);

impl BroadcastPayload {
    /// Creates an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry.
    pub fn with_entry(mut self, key: impl Into<String>, value: Vec<u8>) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    /// Parses a JSON object of byte arrays.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Encodes as a JSON object of byte arrays.
    pub fn to_bytes(&self) -> Vec<u8> {
        // string keys and byte arrays have no failing serialization path
        serde_json::to_vec(&self.0).unwrap_or_default()
    }

    /// Iterates over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<u8>)> {
        self.0.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Header fields the broadcast pool needs from a finalized block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BlockHeader {
    /// Block height.
    pub number: u64,
    /// Hash of this block.
    pub hash: Hash,
    /// Hash of the parent block.
    pub parent_hash: Hash,
}

/// A finalized block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Block height.
    pub fn number(&self) -> u64 {
        self.header.number
    }
}

/// A single admitted control message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControlMessage {
    pub kind: ControlMessageKind,
    pub epoch: u64,
    pub sender: Address,
    pub payload: Vec<u8>,
}

impl ControlMessage {
    /// Deduplication identity of this message.
    pub fn identity(&self) -> Hash {
        identity_hash(self.kind, self.epoch, &self.sender)
    }
}

/// Keccak-256 helper.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Renders an address as `0x`-prefixed lowercase hex.
pub fn address_string(address: &Address) -> String {
    format!("0x{}", hex::encode(address))
}

/// Identity hash: at most one message per (kind, epoch, sender).
///
/// `keccak256(kind_tag ++ epoch ++ sender_string)`
pub fn identity_hash(kind: ControlMessageKind, epoch: u64, sender: &Address) -> Hash {
    let preimage = format!("{}{}{}", kind.tag(), epoch, address_string(sender));
    keccak256(preimage.as_bytes())
}

/// Big-endian numeric value of an address.
pub fn address_value(address: &Address) -> U256 {
    U256::from_big_endian(address)
}

/// Big-endian numeric value of a hash.
pub fn hash_value(hash: &Hash) -> U256 {
    U256::from_big_endian(hash)
}
