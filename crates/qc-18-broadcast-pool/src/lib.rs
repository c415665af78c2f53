//! # Broadcast Transaction Pool Subsystem
//!
//! **Subsystem ID:** 18
//!
//! ## Purpose
//!
//! Admits, deduplicates and buffers *broadcast* transactions: control-plane
//! messages (heartbeats, public/private key announcements, roll calls) sent
//! between consensus roles once per epoch. Block production drains the buffer;
//! after finalization the same data is re-extracted from the block and
//! committed to shared state.
//!
//! ```text
//! peer message ──→ [BroadcastMessageHandler] ──→ insert ──→ [PendingRegistry]
//!                                                 │               │
//!                                      [AdmissionFilter]   drain_and_clear
//!                                                                 ↓
//!                                                      block production
//!                                                                 ↓
//! finalized boundary block ──→ [StateExtractionScanner] ──→ shared state
//! ```
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | One message per (kind, epoch, sender) | `PendingRegistry::try_insert` never overwrites |
//! | Only admitted messages are buffered | `BroadcastPoolService::insert` commits after `AdmissionFilter::decide` |
//! | Drain removes everything atomically | single `Mutex<PendingRegistry>` critical section |
//! | Extraction is a pure function of the block | `StateExtractionScanner` holds no state |
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  adapters/ - In-memory chain head, roles, recovery, state       │
//! │  ipc/      - Network message ingress                            │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  ports/inbound.rs  - BroadcastPoolApi, BroadcastStateApi        │
//! │  ports/outbound.rs - ChainHeadReader, RoleOracle,               │
//! │                      SignatureRecovery, StateReader             │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  domain/ - entities, epoch, filter, registry, sender, scanner   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use qc_18_broadcast_pool::{BroadcastPoolConfig, BroadcastPoolDependencies, BroadcastPoolService};
//! use qc_18_broadcast_pool::ports::BroadcastPoolApi;
//!
//! let pool = BroadcastPoolService::new(BroadcastPoolDependencies {
//!     chain,
//!     roles,
//!     recovery,
//!     config: BroadcastPoolConfig::default(),
//! })?;
//!
//! pool.insert(tx)?;
//! let by_sender = pool.drain_and_clear();
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ipc;
pub mod metrics;
pub mod ports;
pub mod service;

pub use config::BroadcastPoolConfig;
pub use domain::{
    Address, AdmissionFilter, AdmissionRejection, Block, BlockHeader, BroadcastError,
    BroadcastPayload, BroadcastResult, BroadcastStateMap, ControlMessage, ControlMessageKind,
    EpochCalculator, Extraction, ExtractionReport, Hash, InsertReport, PendingRegistry,
    SenderStrategy, StateExtractionScanner, Transaction, TxExtra,
};
pub use ipc::{BroadcastMessageHandler, MessageType, NetworkMessage};
pub use ports::{BroadcastPoolApi, BroadcastStateApi};
pub use service::{BroadcastPoolDependencies, BroadcastPoolService, BroadcastStateService};

/// Default epoch length in blocks.
pub const DEFAULT_BROADCAST_INTERVAL: u64 = 100;

/// Default maximum encoded transaction size (32 KiB).
pub const DEFAULT_MAX_TX_SIZE: usize = 32 * 1024;

/// State key under which extracted broadcast data is committed.
pub const BROADCAST_STATE_KEY: &str = "broadcast_tx";
