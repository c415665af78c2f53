//! # Admission Filter
//!
//! Decides whether a single `<kind_tag><epoch>` key sent by `sender` may be
//! buffered for the next block.
//!
//! ## Rules
//!
//! | Kind | Window | Role |
//! |------|--------|------|
//! | `RollCall` | next broadcast height is `h+1` or `h+2` | `Broadcast` |
//! | `Heartbeat` | `sender mod (interval-1) == block_hash mod (interval-1)` | `ElectedNode` |
//! | `PublicKey`, `PrivateKey` | none | `ElectedValidator` |
//!
//! Every key must end with the decimal ordinal of the next epoch
//! (`h / interval + 1`). The filter holds no mutable state; role sets are
//! queried fresh on every decision.

use super::entities::{address_value, hash_value, Address, ControlMessageKind, Hash, U256};
use super::epoch::EpochCalculator;
use super::errors::{AdmissionRejection, BroadcastResult};
use crate::ports::{Role, RoleOracle};
use std::sync::Arc;

/// Outcome of a successful admission decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Admission {
    pub kind: ControlMessageKind,
    pub epoch: u64,
}

/// Epoch/role admission control for broadcast keys.
pub struct AdmissionFilter<R: RoleOracle> {
    epochs: EpochCalculator,
    roles: Arc<R>,
}

impl<R: RoleOracle> AdmissionFilter<R> {
    pub fn new(epochs: EpochCalculator, roles: Arc<R>) -> Self {
        Self { epochs, roles }
    }

    pub fn epochs(&self) -> &EpochCalculator {
        &self.epochs
    }

    /// Decides whether `raw_key` from `sender` is admissible at the head
    /// `(height, block_hash)`.
    ///
    /// # Errors
    /// - `Rejected(..)` with the specific `AdmissionRejection`
    /// - `RoleOracle` if a membership query fails
    pub fn decide(
        &self,
        sender: &Address,
        raw_key: &str,
        height: u64,
        block_hash: &Hash,
    ) -> BroadcastResult<Admission> {
        let epoch = self.epochs.next_epoch(height);
        let prefix = split_epoch_suffix(raw_key, epoch).ok_or_else(|| {
            AdmissionRejection::StaleOrMismatchedEpoch {
                key: raw_key.to_string(),
                expected_epoch: epoch,
            }
        })?;

        let kind = ControlMessageKind::from_tag(prefix).ok_or_else(|| {
            AdmissionRejection::UnknownMessageType {
                prefix: prefix.to_string(),
            }
        })?;

        match kind {
            ControlMessageKind::RollCall => {
                let next_broadcast = self.epochs.next_broadcast_height(height);
                let offset = next_broadcast.map(|next| next - height);
                if !matches!(offset, Some(1 | 2)) {
                    return Err(AdmissionRejection::HeightWindowViolation {
                        height,
                        next_broadcast,
                    }
                    .into());
                }
                self.require_role(kind, sender, height, Role::Broadcast)?;
            }
            ControlMessageKind::Heartbeat => {
                self.require_role(kind, sender, height, Role::ElectedNode)?;
                if !self.heartbeat_selected(sender, block_hash) {
                    return Err(AdmissionRejection::NotSelectedThisWindow { sender: *sender }.into());
                }
            }
            ControlMessageKind::PublicKey | ControlMessageKind::PrivateKey => {
                self.require_role(kind, sender, height, Role::ElectedValidator)?;
            }
        }

        Ok(Admission { kind, epoch })
    }

    /// Deterministic heartbeat selection by block hash.
    pub fn heartbeat_selected(&self, sender: &Address, block_hash: &Hash) -> bool {
        let modulus = U256::from(self.epochs.heartbeat_modulus());
        address_value(sender) % modulus == hash_value(block_hash) % modulus
    }

    fn require_role(
        &self,
        kind: ControlMessageKind,
        sender: &Address,
        height: u64,
        role: Role,
    ) -> BroadcastResult<()> {
        let members = self.roles.role_members(height, role)?;
        if members.contains(sender) {
            Ok(())
        } else {
            Err(AdmissionRejection::UnauthorizedSender {
                kind,
                sender: *sender,
            }
            .into())
        }
    }
}

/// Strips the decimal `epoch` suffix from `raw_key`.
///
/// The suffix is located at its last occurrence and must run exactly to the
/// end of the key.
pub fn split_epoch_suffix(raw_key: &str, epoch: u64) -> Option<&str> {
    let epoch_str = epoch.to_string();
    let index = raw_key.rfind(&epoch_str)?;
    if &raw_key[index..] != epoch_str {
        return None;
    }
    Some(&raw_key[..index])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::StaticRoleOracle;
    use crate::domain::BroadcastError;

    const INTERVAL: u64 = 100;

    fn validator() -> Address {
        [0x11; 20]
    }

    fn broadcaster() -> Address {
        [0x22; 20]
    }

    /// Address whose numeric value is `value`.
    fn numeric_address(value: u8) -> Address {
        let mut addr = [0u8; 20];
        addr[19] = value;
        addr
    }

    /// Hash whose numeric value is `value`.
    fn numeric_hash(value: u8) -> Hash {
        let mut hash = [0u8; 32];
        hash[31] = value;
        hash
    }

    fn oracle() -> StaticRoleOracle {
        StaticRoleOracle::new()
            .with_member(Role::ElectedValidator, validator())
            .with_member(Role::ElectedNode, validator())
            .with_member(Role::ElectedNode, numeric_address(5))
            .with_member(Role::Broadcast, broadcaster())
    }

    fn filter() -> AdmissionFilter<StaticRoleOracle> {
        AdmissionFilter::new(EpochCalculator::new(INTERVAL), Arc::new(oracle()))
    }

    fn rejection(result: BroadcastResult<Admission>) -> AdmissionRejection {
        match result {
            Err(BroadcastError::Rejected(rejection)) => rejection,
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_split_epoch_suffix() {
        assert_eq!(split_epoch_suffix("heartbeat2", 2), Some("heartbeat"));
        assert_eq!(split_epoch_suffix("heartbeat20", 2), None);
        assert_eq!(split_epoch_suffix("heartbeat", 2), None);
        assert_eq!(split_epoch_suffix("publickey12", 12), Some("publickey"));
        assert_eq!(split_epoch_suffix("2", 2), Some(""));
    }

    #[test]
    fn test_public_key_from_validator_accepted() {
        let admission = filter()
            .decide(&validator(), "publickey2", 199, &[0u8; 32])
            .unwrap();
        assert_eq!(admission.kind, ControlMessageKind::PublicKey);
        assert_eq!(admission.epoch, 2);
    }

    #[test]
    fn test_private_key_from_non_validator_rejected() {
        let err = rejection(filter().decide(&broadcaster(), "privatekey2", 150, &[0u8; 32]));
        assert_eq!(err.reason(), "unauthorized_sender");
    }

    #[test]
    fn test_epoch_suffix_mismatch_rejected() {
        let err = rejection(filter().decide(&validator(), "heartbeat20", 199, &[0u8; 32]));
        assert_eq!(
            err,
            AdmissionRejection::StaleOrMismatchedEpoch {
                key: "heartbeat20".into(),
                expected_epoch: 2,
            }
        );
    }

    #[test]
    fn test_stale_epoch_rejected_even_for_authorized_sender() {
        let err = rejection(filter().decide(&validator(), "publickey1", 199, &[0u8; 32]));
        assert_eq!(err.reason(), "stale_or_mismatched_epoch");
    }

    #[test]
    fn test_unknown_prefix_rejected() {
        let err = rejection(filter().decide(&validator(), "foobar2", 199, &[0u8; 32]));
        assert_eq!(
            err,
            AdmissionRejection::UnknownMessageType {
                prefix: "foobar".into()
            }
        );
    }

    #[test]
    fn test_roll_call_window() {
        let filter = filter();
        // next broadcast at 200
        assert!(filter.decide(&broadcaster(), "rollcall2", 198, &[0u8; 32]).is_ok());
        assert!(filter.decide(&broadcaster(), "rollcall2", 199, &[0u8; 32]).is_ok());

        let err = rejection(filter.decide(&broadcaster(), "rollcall2", 197, &[0u8; 32]));
        assert_eq!(
            err,
            AdmissionRejection::HeightWindowViolation {
                height: 197,
                next_broadcast: Some(200),
            }
        );

        // At a boundary the next broadcast height is the boundary itself.
        let err = rejection(filter.decide(&broadcaster(), "rollcall3", 200, &[0u8; 32]));
        assert_eq!(err.reason(), "height_window_violation");
    }

    #[test]
    fn test_roll_call_rejected_when_next_boundary_overflows() {
        let height = u64::MAX - 1;
        let key = ControlMessageKind::RollCall.key_for_epoch(height / INTERVAL + 1);
        let err = rejection(filter().decide(&broadcaster(), &key, height, &[0u8; 32]));
        assert_eq!(
            err,
            AdmissionRejection::HeightWindowViolation {
                height,
                next_broadcast: None,
            }
        );
    }

    #[test]
    fn test_roll_call_window_checked_before_role() {
        let err = rejection(filter().decide(&validator(), "rollcall2", 150, &[0u8; 32]));
        assert_eq!(err.reason(), "height_window_violation");

        let err = rejection(filter().decide(&validator(), "rollcall2", 199, &[0u8; 32]));
        assert_eq!(err.reason(), "unauthorized_sender");
    }

    #[test]
    fn test_heartbeat_residue_selection() {
        let filter = filter();
        let sender = numeric_address(5);

        // 5 mod 99 == 104 mod 99
        assert!(filter
            .decide(&sender, "heartbeat2", 150, &numeric_hash(104))
            .is_ok());

        let err = rejection(filter.decide(&sender, "heartbeat2", 150, &numeric_hash(105)));
        assert_eq!(err, AdmissionRejection::NotSelectedThisWindow { sender });
    }

    #[test]
    fn test_heartbeat_requires_elected_node() {
        let outsider = numeric_address(5 + 99);
        let err = rejection(filter().decide(&outsider, "heartbeat2", 150, &numeric_hash(5)));
        assert_eq!(err.reason(), "unauthorized_sender");
    }

    #[test]
    fn test_role_oracle_failure_propagates() {
        let filter = AdmissionFilter::new(
            EpochCalculator::new(INTERVAL),
            Arc::new(StaticRoleOracle::unavailable("oracle offline")),
        );
        let result = filter.decide(&validator(), "publickey2", 150, &[0u8; 32]);
        assert_eq!(
            result,
            Err(BroadcastError::RoleOracle("oracle offline".into()))
        );
    }

    #[test]
    fn test_role_oracle_not_consulted_for_bad_epoch() {
        let filter = AdmissionFilter::new(
            EpochCalculator::new(INTERVAL),
            Arc::new(StaticRoleOracle::unavailable("oracle offline")),
        );
        let err = rejection(filter.decide(&validator(), "publickey7", 150, &[0u8; 32]));
        assert_eq!(err.reason(), "stale_or_mismatched_epoch");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_heartbeat_accepted_iff_residues_match(
                sender_value in any::<u8>(),
                hash_value in any::<u8>(),
            ) {
                let sender = numeric_address(sender_value);
                let oracle = StaticRoleOracle::new().with_member(Role::ElectedNode, sender);
                let filter = AdmissionFilter::new(EpochCalculator::new(INTERVAL), Arc::new(oracle));

                let result = filter.decide(&sender, "heartbeat2", 150, &numeric_hash(hash_value));
                let m = INTERVAL - 1;
                let selected = (sender_value as u64) % m == (hash_value as u64) % m;
                prop_assert_eq!(result.is_ok(), selected);
            }

            #[test]
            fn prop_wrong_epoch_always_rejected(
                height in 0u64..1_000_000,
                offset in 1u64..1000,
            ) {
                let filter = filter();
                let epoch = height / INTERVAL + 1 + offset;
                let key = ControlMessageKind::PublicKey.key_for_epoch(epoch);
                let result = filter.decide(&validator(), &key, height, &[0u8; 32]);
                prop_assert!(result.is_err());
            }

            #[test]
            fn prop_roll_call_only_one_or_two_blocks_ahead(height in 1u64..1_000_000) {
                let filter = filter();
                let key = ControlMessageKind::RollCall.key_for_epoch(height / INTERVAL + 1);
                let result = filter.decide(&broadcaster(), &key, height, &[0u8; 32]);
                let next = EpochCalculator::new(INTERVAL)
                    .next_broadcast_height(height)
                    .unwrap();
                let offset = next - height;
                prop_assert_eq!(result.is_ok(), offset == 1 || offset == 2);
            }
        }
    }
}
