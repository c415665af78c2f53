//! Network message handler for the Broadcast Pool.
//!
//! Decodes peer messages into transactions and feeds them to the pool.
//! Transport and peer framing live outside this crate.

use crate::domain::{BroadcastError, BroadcastResult, InsertReport, Transaction};
use crate::ports::BroadcastPoolApi;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Type tag of a network message entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    /// Broadcast (control-plane) transaction.
    Broadcast,
    /// Ordinary value-transfer transaction, handled by the normal mempool.
    Normal,
}

/// One entry of a network message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntry {
    pub msg_type: MessageType,
    /// JSON-encoded transaction.
    pub data: Vec<u8>,
}

/// A message received from a peer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkMessage {
    pub entries: Vec<MessageEntry>,
}

impl NetworkMessage {
    /// Wraps a broadcast transaction for sending to a peer.
    pub fn broadcast(tx: &Transaction) -> BroadcastResult<Self> {
        let data = serde_json::to_vec(tx).map_err(|e| BroadcastError::Encoding(e.to_string()))?;
        Ok(Self {
            entries: vec![MessageEntry {
                msg_type: MessageType::Broadcast,
                data,
            }],
        })
    }
}

/// Feeds broadcast transactions received from peers into the pool.
pub struct BroadcastMessageHandler<P: BroadcastPoolApi> {
    pool: Arc<P>,
}

impl<P: BroadcastPoolApi> BroadcastMessageHandler<P> {
    pub fn new(pool: Arc<P>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Arc<P> {
        &self.pool
    }

    /// Handles a peer message.
    ///
    /// Only the first entry is considered. Returns `Ok(None)` if it is not a
    /// broadcast entry.
    ///
    /// # Errors
    /// - `MalformedPayload` for an empty message or an undecodable transaction
    /// - any error from `BroadcastPoolApi::insert`
    pub fn handle(&self, message: &NetworkMessage) -> BroadcastResult<Option<InsertReport>> {
        let Some(entry) = message.entries.first() else {
            tracing::error!("Broadcast network message has no entries");
            return Err(BroadcastError::MalformedPayload(
                "network message has no entries".into(),
            ));
        };

        if entry.msg_type != MessageType::Broadcast {
            return Ok(None);
        }

        let tx: Transaction = serde_json::from_slice(&entry.data).map_err(|e| {
            tracing::error!(error = %e, "Failed to decode broadcast transaction");
            BroadcastError::MalformedPayload(e.to_string())
        })?;

        self.pool.insert(tx).map(Some)
    }
}
