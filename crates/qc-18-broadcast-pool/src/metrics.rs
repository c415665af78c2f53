//! # Broadcast Pool Metrics
//!
//! Enable with the `metrics` feature:
//! ```toml
//! qc-18-broadcast-pool = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `broadcast_pool_admitted_total` - Messages buffered
//! - `broadcast_pool_rejected_total` - Keys refused by the admission filter (by reason)
//! - `broadcast_pool_duplicates_total` - Messages skipped as already buffered
//! - `broadcast_pool_drained_total` - Entries handed to block production
//! - `broadcast_pool_extracted_total` - Entries extracted from boundary blocks (by kind)

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref ADMITTED: IntCounter = register_int_counter!(
        "broadcast_pool_admitted_total",
        "Total broadcast messages buffered"
    )
    .expect("Failed to create ADMITTED metric");

    pub static ref REJECTED: IntCounterVec = register_int_counter_vec!(
        "broadcast_pool_rejected_total",
        "Total broadcast keys rejected by admission",
        &["reason"]
    )
    .expect("Failed to create REJECTED metric");

    pub static ref DUPLICATES: IntCounter = register_int_counter!(
        "broadcast_pool_duplicates_total",
        "Total broadcast messages skipped as duplicates"
    )
    .expect("Failed to create DUPLICATES metric");

    pub static ref DRAINED: IntCounter = register_int_counter!(
        "broadcast_pool_drained_total",
        "Total pending entries drained for block production"
    )
    .expect("Failed to create DRAINED metric");

    pub static ref EXTRACTED: IntCounterVec = register_int_counter_vec!(
        "broadcast_pool_extracted_total",
        "Total broadcast entries extracted from boundary blocks",
        &["kind"]
    )
    .expect("Failed to create EXTRACTED metric");
}

#[cfg(feature = "metrics")]
pub fn record_admitted() {
    ADMITTED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_rejected(reason: &str) {
    REJECTED.with_label_values(&[reason]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_duplicate() {
    DUPLICATES.inc();
}

#[cfg(feature = "metrics")]
pub fn record_drained(count: usize) {
    DRAINED.inc_by(count as u64);
}

#[cfg(feature = "metrics")]
pub fn record_extracted(kind: &str, count: usize) {
    EXTRACTED.with_label_values(&[kind]).inc_by(count as u64);
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_admitted() {}

#[cfg(not(feature = "metrics"))]
pub fn record_rejected(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_duplicate() {}

#[cfg(not(feature = "metrics"))]
pub fn record_drained(_count: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn record_extracted(_kind: &str, _count: usize) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_record_without_panic() {
        record_admitted();
        record_rejected("unknown_message_type");
        record_duplicate();
        record_drained(3);
        record_extracted("heartbeat", 2);
    }
}
