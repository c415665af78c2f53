//! Adapters layer for the Broadcast Pool subsystem.
//!
//! In-memory implementations of the outbound ports.

pub mod memory;

pub use memory::{InMemoryStateStore, ManualChainHead, SignatureTableRecovery, StaticRoleOracle};
