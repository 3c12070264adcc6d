use alloy_primitives::B256;
use rollup_codec::CodecError;
use rollup_engine::EngineError;
use rollup_l1::L1CallError;
use rollup_node_primitives::ErrorKind;
use rollup_node_providers::{L1ProviderError, L2ProviderError};

/// An error occurring in the derivation pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// No L1 header is available yet at the number.
    #[error("no L1 header at #{0}")]
    NoNewL1Header(u64),
    /// The parent hash of the next L1 header does not match the current L1 block.
    #[error("L1 reorg at #{number}: expected parent {expected}, got {got}")]
    L1Reorg {
        /// The number of the header.
        number: u64,
        /// The hash of the current L1 block.
        expected: B256,
        /// The parent hash of the header.
        got: B256,
    },
    /// The L1 block could not be found by hash.
    #[error("missing L1 block {0}")]
    MissingL1Block(B256),
    /// The L2 block could not be found.
    #[error("missing L2 block #{0}")]
    MissingL2Block(u64),
    /// The L1 safe block is unknown.
    #[error("missing L1 safe block")]
    MissingL1SafeBlock,
    /// The terminal stage exhausted its attempts.
    #[error("derivation step failed after {attempts} attempts: {source}")]
    AttemptsExhausted {
        /// The number of attempts.
        attempts: usize,
        /// The last error.
        source: Box<PipelineError>,
    },
    /// An error at the L1 provider.
    #[error(transparent)]
    L1Provider(#[from] L1ProviderError),
    /// An error at the L2 provider.
    #[error(transparent)]
    L2Provider(#[from] L2ProviderError),
    /// An error at the execution backend.
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// An L1 transaction could not be decoded.
    #[error(transparent)]
    L1Call(#[from] L1CallError),
    /// A batch could not be decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// The rollup state rejected a call.
    #[error(transparent)]
    RollupState(#[from] RollupStateError),
}

impl PipelineError {
    /// Returns the [`ErrorKind`] of the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoNewL1Header(_) |
            Self::MissingL1Block(_) |
            Self::MissingL2Block(_) |
            Self::MissingL1SafeBlock |
            Self::L1Provider(_) |
            Self::L2Provider(_) => ErrorKind::Retryable,
            Self::Engine(err) if err.is_retryable() => ErrorKind::Retryable,
            Self::L1Reorg { .. } => ErrorKind::Recoverable,
            Self::AttemptsExhausted { .. } |
            Self::Engine(_) |
            Self::L1Call(_) |
            Self::Codec(_) |
            Self::RollupState(_) => ErrorKind::Fatal,
        }
    }

    /// Returns `true` if the source stage is caught up with the L1.
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::NoNewL1Header(_))
    }
}

/// An error occurring when applying a rollup call to the [`RollupState`](crate::RollupState).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RollupStateError {
    /// There is no unresolved assertion to confirm or reject.
    #[error("no unresolved assertion")]
    NoUnresolvedAssertion,
}
