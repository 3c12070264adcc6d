use std::time::Duration;

use alloy_primitives::B256;
use rollup_node_primitives::BlockTag;
use rollup_node_providers::L1ProviderError;
use tokio::task::JoinError;

/// An error interrupting a polling subscription.
#[derive(Debug, thiserror::Error)]
pub enum SubscriptionError {
    /// The provider failed to return the header.
    #[error("failed to poll {tag} header: {source}")]
    Provider {
        /// The polled tag.
        tag: BlockTag,
        /// The provider error.
        source: L1ProviderError,
    },
    /// The request did not complete in time.
    #[error("polling {tag} header timed out after {timeout:?}")]
    Timeout {
        /// The polled tag.
        tag: BlockTag,
        /// The request timeout.
        timeout: Duration,
    },
}

/// An error terminating a [`Broker`](crate::Broker).
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    /// The subscription feeding the broker failed.
    #[error(transparent)]
    Subscription(#[from] SubscriptionError),
}

/// An error occurring when updating the [`L1State`](crate::L1State).
#[derive(Debug, thiserror::Error)]
pub enum L1StateError {
    /// Two different blocks were reported for the same number of a committed tag.
    #[error("conflicting {tag} blocks at #{number}: known {known}, got {got}")]
    ConflictingBlock {
        /// The tag.
        tag: BlockTag,
        /// The block number.
        number: u64,
        /// The stored hash.
        known: B256,
        /// The received hash.
        got: B256,
    },
}

/// An error terminating the [`EthSyncer`](crate::EthSyncer).
#[derive(Debug, thiserror::Error)]
pub enum SyncerError {
    /// A broker stopped on error.
    #[error("{tag} broker failed: {source}")]
    Broker {
        /// The tag of the broker.
        tag: BlockTag,
        /// The broker error.
        source: BrokerError,
    },
    /// The handler rejected a header.
    #[error("{tag} handler failed: {source}")]
    Handler {
        /// The tag of the header.
        tag: BlockTag,
        /// The handler error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// A syncer task panicked or was cancelled.
    #[error(transparent)]
    Join(#[from] JoinError),
}
