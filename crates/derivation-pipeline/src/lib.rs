//! The L1 to L2 derivation pipeline of the Rollup Node.
//!
//! The pipeline is a chain of pull based [`Stage`]s:
//! - [`L1HeaderRetrievalStage`] walks the L1 headers and detects reorgs,
//! - [`L1TxRetriever`] fetches the L1 blocks and filters the rollup transactions,
//! - [`L1TxProcessor`] builds the batched L2 blocks and tracks the [`RollupState`],
//! - [`L2ForkchoiceUpdater`] derives the L2 fork choice from the L1 one.
//!
//! The [`Driver`] pulls from the last stage, retrying and recovering as needed.

mod driver;
pub use driver::{Driver, DriverConfig, RetryPolicy, StepOutcome};

mod error;
pub use error::{PipelineError, RollupStateError};
pub use rollup_node_primitives::ErrorKind;

mod metrics;
pub use metrics::DerivationPipelineMetrics;

mod payload;
pub use payload::PayloadBuilder;

mod pipeline;
pub use pipeline::{create_pipeline, DerivationPipeline, PipelineConfig};

mod rollup_state;
pub use rollup_state::{Assertion, AssertionStatus, RollupState};

mod stage;
pub use stage::{ProcessingStage, Processor, Stage};

mod stages;
pub use stages::{
    FilteredBlock, L1HeaderRetrievalStage, L1TxProcessor, L1TxRetriever, L2ForkchoiceUpdater,
};
