use alloy_primitives::Address;
use std::time::Duration;

/// Configuration for the batcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatcherConfig {
    /// The address of the sequencer inbox.
    pub inbox_address: Address,
    /// The soft limit on the size of the transactions of a batch, in bytes.
    pub max_batch_size: usize,
    /// The interval between two submissions.
    pub submission_interval: Duration,
}

impl Default for BatcherConfig {
    fn default() -> Self {
        Self {
            inbox_address: Address::ZERO,
            max_batch_size: 100_000,
            submission_interval: Duration::from_secs(12),
        }
    }
}
