use alloy_rpc_types_engine::PayloadStatusEnum;
use alloy_transport::{RpcError, TransportErrorKind};

/// The error type for the execution backend.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The engine is unavailable.
    #[error("engine is unavailable: {0}")]
    EngineUnavailable(#[from] RpcError<TransportErrorKind>),
    /// The engine is syncing and cannot process the request yet.
    #[error("engine is syncing")]
    Syncing,
    /// The engine rejected the request.
    #[error("engine returned status {0:?}")]
    InvalidStatus(PayloadStatusEnum),
    /// The engine did not start building a payload.
    #[error("missing payload id")]
    MissingPayloadId,
    /// The parent of the block to build is unknown to the engine.
    #[error("missing parent block {0}")]
    MissingParent(u64),
    /// The genesis cannot be built.
    #[error("cannot build the genesis block")]
    GenesisBuild,
    /// The engine built a block at an unexpected height.
    #[error("built block {got}, expected {expected}")]
    UnexpectedBlockNumber {
        /// The requested block number.
        expected: u64,
        /// The built block number.
        got: u64,
    },
    /// Other error.
    #[error("{0}")]
    Other(&'static str),
}

impl EngineError {
    /// Returns `true` if the request can be retried as is.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::EngineUnavailable(_) | Self::Syncing | Self::MissingParent(_))
    }
}
