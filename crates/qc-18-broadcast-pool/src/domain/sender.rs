//! Sender resolution for broadcast transactions.
//!
//! A transaction may carry its sender inline (set by the originating node) or
//! only a signature. Which path applies is an explicit `SenderStrategy`.

use super::entities::{Address, Transaction};
use super::errors::BroadcastResult;
use crate::ports::SignatureRecovery;
use serde::Deserialize;

/// How the sender of a transaction is determined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderStrategy {
    /// Use the embedded sender when present, otherwise recover from the signature.
    #[default]
    EmbeddedFirst,
    /// Always recover from the signature.
    RecoveredOnly,
}

/// Which path produced a resolved sender.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SenderSource {
    Embedded,
    Recovered,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedSender {
    pub address: Address,
    pub source: SenderSource,
}

/// Resolves the sender of `tx` according to `strategy`.
///
/// # Errors
/// Whatever `recovery` returns when the signature path is taken and fails
/// (`InvalidSender` for well-behaved implementations).
pub fn resolve_sender<S: SignatureRecovery + ?Sized>(
    tx: &Transaction,
    strategy: SenderStrategy,
    recovery: &S,
) -> BroadcastResult<ResolvedSender> {
    match (strategy, tx.from) {
        (SenderStrategy::EmbeddedFirst, Some(address)) => Ok(ResolvedSender {
            address,
            source: SenderSource::Embedded,
        }),
        _ => recovery
            .recover_sender(tx)
            .map(|address| ResolvedSender {
                address,
                source: SenderSource::Recovered,
            }),
    }
}
