//! The batcher posts the L2 blocks produced by the sequencer to the L1 sequencer inbox.

mod builder;
pub use builder::{BatchBuilder, BuiltBatch};

mod config;
pub use config::BatcherConfig;

mod disseminator;
pub use disseminator::BatchDisseminator;

mod error;
pub use error::{BatchBuilderError, BatcherError};

mod metrics;
pub use metrics::BatcherMetrics;
