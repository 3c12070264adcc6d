use metrics::{Counter, Histogram};
use metrics_derive::Metrics;

/// The metrics for the [`super::RpcExecutionBackend`].
#[derive(Metrics, Clone)]
#[metrics(scope = "execution_backend")]
pub struct EngineMetrics {
    /// The duration for a block to be built and imported.
    pub build_payload_duration: Histogram,
    /// The number of built blocks.
    pub built_blocks: Counter,
    /// The number of fork choice updates.
    pub forkchoice_updates: Counter,
}
