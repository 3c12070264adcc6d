use metrics::{Counter, Histogram};
use metrics_derive::Metrics;

/// The metrics for the [`super::BatchDisseminator`].
#[derive(Metrics, Clone)]
#[metrics(scope = "batcher")]
pub struct BatcherMetrics {
    /// A counter on the L2 blocks appended to the builder.
    pub appended_blocks: Counter,
    /// A counter on the batches submitted to the L1.
    pub submitted_batches: Counter,
    /// The size of the submitted batches calldata.
    pub batch_size: Histogram,
    /// A counter on the detected L2 reorgs.
    pub l2_reorgs: Counter,
}
