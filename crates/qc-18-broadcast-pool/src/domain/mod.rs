//! # Domain Layer - Broadcast Pool Subsystem
//!
//! ## Components
//!
//! - `entities`: Transaction, Block, ControlMessageKind, identity hashing
//! - `epoch`: EpochCalculator (broadcast heights and epoch ordinals)
//! - `filter`: AdmissionFilter (epoch/role admission control)
//! - `registry`: PendingRegistry (identity-indexed buffer with drain)
//! - `sender`: SenderStrategy and sender resolution
//! - `scanner`: StateExtractionScanner (finalized block -> broadcast state)
//! - `errors`: AdmissionRejection, BroadcastError

pub mod entities;
pub mod epoch;
pub mod errors;
pub mod filter;
pub mod registry;
pub mod scanner;
pub mod sender;

pub use entities::*;
pub use epoch::*;
pub use errors::*;
pub use filter::*;
pub use registry::*;
pub use scanner::*;
pub use sender::*;
