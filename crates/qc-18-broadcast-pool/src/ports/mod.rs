//! Ports layer for the Broadcast Pool subsystem.
//!
//! - Inbound (Driving) ports: API exposed to networking and block production
//! - Outbound (Driven) ports: chain head, role oracle, signature recovery, state

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
