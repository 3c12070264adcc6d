//! L1 head tracking for the Rollup Node.
//!
//! The [`EthSyncer`] polls the latest, safe and finalized L1 headers and publishes them through
//! one [`Broker`] per tag to a [`L1HeadHandler`], usually the [`L1State`] read by the derivation
//! pipeline.

pub use broker::{BroadcastMode, Broker, BrokerHandle, Subscription, SubscriptionId};
mod broker;

mod error;
pub use error::{BrokerError, L1StateError, SubscriptionError, SyncerError};

mod metrics;
pub use metrics::WatcherMetrics;

pub use polling::HeadPoller;
mod polling;

pub use state::L1State;
mod state;

pub use syncer::{EthSyncer, L1HeadHandler, SyncerConfig};
mod syncer;
