use alloy_primitives::B256;
use rollup_codec::EncodingError;
use rollup_node_primitives::ErrorKind;
use rollup_node_providers::{L2ProviderError, TxManagerError};

/// An error occurring in the [`BatchBuilder`](crate::BatchBuilder).
#[derive(Debug, thiserror::Error)]
pub enum BatchBuilderError {
    /// The parent hash of the appended block does not match the last appended block.
    #[error("L2 reorg at #{number}: expected parent {expected}, got {got}")]
    L2ReorgDetected {
        /// The number of the appended block.
        number: u64,
        /// The hash of the last appended block.
        expected: B256,
        /// The parent hash of the appended block.
        got: B256,
    },
    /// The appended block does not follow the last appended block.
    #[error("non contiguous L2 block: expected #{expected}, got #{got}")]
    NonContiguousBlock {
        /// The expected block number.
        expected: u64,
        /// The appended block number.
        got: u64,
    },
    /// The batch could not be encoded.
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// An error occurring in the [`BatchDisseminator`](crate::BatchDisseminator).
#[derive(Debug, thiserror::Error)]
pub enum BatcherError {
    /// The L2 safe block is ahead of the blocks appended by the batcher.
    #[error("unexpected system state: L2 safe block #{safe} is ahead of last appended block #{last_appended}")]
    UnexpectedSystemState {
        /// The L2 safe block number.
        safe: u64,
        /// The last appended block number.
        last_appended: u64,
    },
    /// The L2 block could not be found.
    #[error("missing L2 block #{0}")]
    MissingL2Block(u64),
    /// An error in the batch builder.
    #[error(transparent)]
    Builder(#[from] BatchBuilderError),
    /// An error at the L2 provider.
    #[error(transparent)]
    L2Provider(#[from] L2ProviderError),
    /// An error at the transaction manager.
    #[error(transparent)]
    TxManager(#[from] TxManagerError),
}

impl BatcherError {
    /// Returns the [`ErrorKind`] of the error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Builder(BatchBuilderError::L2ReorgDetected { .. }) => ErrorKind::Recoverable,
            Self::MissingL2Block(_) |
            Self::L2Provider(_) |
            Self::TxManager(TxManagerError::Rpc(_) | TxManagerError::Pending(_) | TxManagerError::Other(_)) => {
                ErrorKind::Retryable
            }
            Self::UnexpectedSystemState { .. } |
            Self::Builder(_) |
            Self::TxManager(TxManagerError::Reverted(_)) => ErrorKind::Fatal,
        }
    }
}
