use metrics::{Counter, Gauge};
use metrics_derive::Metrics;

/// The metrics for the derivation pipeline.
#[derive(Metrics, Clone)]
#[metrics(scope = "derivation_pipeline")]
pub struct DerivationPipelineMetrics {
    /// A counter on the derived L2 blocks.
    pub derived_blocks: Counter,
    /// A counter on the L1 blocks processed.
    pub processed_l1_blocks: Counter,
    /// A counter on the recoveries after an L1 reorg.
    pub recoveries: Counter,
    /// A counter on the retried steps.
    pub retries: Counter,
    /// A counter on the fork choice updates issued.
    pub forkchoice_updates: Counter,
    /// The current L1 block of the pipeline.
    pub l1_block_number: Gauge,
    /// The L2 safe block number.
    pub l2_safe_number: Gauge,
    /// The L2 finalized block number.
    pub l2_finalized_number: Gauge,
}
