//! Broadcast pool error types.

use super::entities::{Address, ControlMessageKind};

/// Reason the admission filter refused a single key.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AdmissionRejection {
    #[error("Stale or mismatched epoch in key {key:?}: expected suffix {expected_epoch}")]
    StaleOrMismatchedEpoch { key: String, expected_epoch: u64 },

    #[error("Unknown broadcast message type: {prefix:?}")]
    UnknownMessageType { prefix: String },

    #[error("Sender {sender:?} not authorized for {kind} messages")]
    UnauthorizedSender {
        kind: ControlMessageKind,
        sender: Address,
    },

    #[error("Height {height} outside roll-call window (next broadcast at {next_broadcast:?})")]
    HeightWindowViolation {
        height: u64,
        next_broadcast: Option<u64>,
    },

    #[error("Sender {sender:?} not selected for heartbeat at this window")]
    NotSelectedThisWindow { sender: Address },
}

impl AdmissionRejection {
    /// Stable label for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::StaleOrMismatchedEpoch { .. } => "stale_or_mismatched_epoch",
            Self::UnknownMessageType { .. } => "unknown_message_type",
            Self::UnauthorizedSender { .. } => "unauthorized_sender",
            Self::HeightWindowViolation { .. } => "height_window_violation",
            Self::NotSelectedThisWindow { .. } => "not_selected_this_window",
        }
    }
}

/// Broadcast pool error type.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BroadcastError {
    #[error("Admission rejected: {0}")]
    Rejected(#[from] AdmissionRejection),

    #[error("Transaction too large: {size} bytes > {max} bytes")]
    TransactionTooLarge { size: usize, max: usize },

    #[error("Wrong transaction type: {found:?} (expected broadcast)")]
    WrongTransactionType { found: Option<u8> },

    #[error("Malformed broadcast payload: {0}")]
    MalformedPayload(String),

    #[error("Invalid sender: {0}")]
    InvalidSender(String),

    #[error("No broadcast data in block {height}")]
    NoBroadcastData { height: u64 },

    #[error("Role oracle error: {0}")]
    RoleOracle(String),

    #[error("Chain head error: {0}")]
    ChainHead(String),

    #[error("State error: {0}")]
    State(String),

    #[error("No committed broadcast data for {0}")]
    BroadcastKindNotFound(ControlMessageKind),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Encoding error: {0}")]
    Encoding(String),
}

impl BroadcastError {
    /// The admission rejection, if this error is one.
    pub fn rejection(&self) -> Option<&AdmissionRejection> {
        match self {
            Self::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }
}

/// Result type for broadcast pool operations.
pub type BroadcastResult<T> = Result<T, BroadcastError>;
