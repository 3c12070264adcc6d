use metrics::{Counter, Gauge};
use metrics_derive::Metrics;

/// The metrics for the [`super::L1State`].
#[derive(Metrics)]
#[metrics(scope = "l1_watcher")]
pub struct WatcherMetrics {
    /// A counter on the latest header updates.
    pub head_updates: Counter,
    /// A counter on the stale updates of the safe and finalized headers.
    pub stale_updates: Counter,
    /// The latest L1 block number.
    pub head_number: Gauge,
    /// The safe L1 block number.
    pub safe_number: Gauge,
    /// The finalized L1 block number.
    pub finalized_number: Gauge,
}
