//! Configuration types for the broadcast pool

use crate::domain::{BroadcastError, BroadcastResult, EpochCalculator, SenderStrategy};
use serde::Deserialize;

/// Runtime configuration for the broadcast pool
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BroadcastPoolConfig {
    /// Epoch length in blocks (must be at least 2)
    pub broadcast_interval: u64,

    /// Maximum encoded transaction size in bytes
    pub max_tx_size: usize,

    /// How transaction senders are resolved
    pub sender_strategy: SenderStrategy,
}

impl Default for BroadcastPoolConfig {
    fn default() -> Self {
        Self {
            broadcast_interval: crate::DEFAULT_BROADCAST_INTERVAL,
            max_tx_size: crate::DEFAULT_MAX_TX_SIZE,
            sender_strategy: SenderStrategy::EmbeddedFirst,
        }
    }
}

impl BroadcastPoolConfig {
    /// Small interval for tests.
    pub fn for_testing() -> Self {
        Self {
            broadcast_interval: 10,
            ..Default::default()
        }
    }

    /// Parses a TOML document. Missing fields take their defaults.
    pub fn from_toml_str(input: &str) -> BroadcastResult<Self> {
        let config: Self =
            toml::from_str(input).map_err(|e| BroadcastError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> BroadcastResult<()> {
        // heartbeat selection divides by interval - 1
        if self.broadcast_interval < 2 {
            return Err(BroadcastError::InvalidConfig(format!(
                "broadcast_interval must be >= 2, got {}",
                self.broadcast_interval
            )));
        }
        if self.max_tx_size == 0 {
            return Err(BroadcastError::InvalidConfig(
                "max_tx_size must be non-zero".into(),
            ));
        }
        Ok(())
    }

    pub fn epoch_calculator(&self) -> EpochCalculator {
        EpochCalculator::new(self.broadcast_interval)
    }
}
