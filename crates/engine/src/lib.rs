//! Execution backend of the Rollup Node. The [`ExecutionBackend`] exposes the interface the
//! derivation pipeline uses to build L2 blocks and update the L2 fork choice.

mod api;
pub use api::{ensure_valid, RollupPayloadAttributes};

mod backend;
pub use backend::{ExecutionBackend, RpcExecutionBackend};

mod error;
pub use error::EngineError;

mod fcs;
pub use fcs::ForkchoiceState;

mod metrics;
pub use metrics::EngineMetrics;

#[cfg(any(test, feature = "test-utils"))]
/// Test utilities for the engine crate.
pub mod test_utils;
