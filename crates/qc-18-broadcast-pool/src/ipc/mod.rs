//! # IPC Layer - Broadcast Pool Subsystem
//!
//! Network ingress: peer messages carrying broadcast transactions.

pub mod handler;

pub use handler::*;
