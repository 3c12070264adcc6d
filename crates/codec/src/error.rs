use alloy_primitives::U256;

/// An error occurring during the codec process.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// An error occurring at the decoding stage.
    #[error(transparent)]
    Decoding(#[from] DecodingError),
    /// An error occurring at the encoding stage.
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// An error occurring during the decoding.
#[derive(Debug, thiserror::Error)]
pub enum DecodingError {
    /// The contexts array does not hold whole block contexts.
    #[error("contexts length {0} is not a multiple of 3")]
    MalformedContexts(usize),
    /// The batch holds no block.
    #[error("batch contains no block")]
    EmptyBatch,
    /// A word does not fit in a [`u64`].
    #[error("value {0} overflows u64")]
    Overflow(U256),
    /// The first context does not match `firstL2BlockNumber`.
    #[error("first block number {got} does not match declared first block number {expected}")]
    FirstBlockMismatch {
        /// The declared first block number.
        expected: u64,
        /// The number of the first context.
        got: u64,
    },
    /// The contexts and the transaction lengths disagree on the transaction count.
    #[error("contexts declare {expected} transactions, found {got} transaction lengths")]
    TransactionCountMismatch {
        /// The transaction count declared by the contexts.
        expected: u64,
        /// The count of transaction lengths.
        got: usize,
    },
    /// The transaction batch ends before the declared lengths.
    #[error("transaction batch is shorter than the declared transaction lengths")]
    Eof,
    /// Bytes are left in the transaction batch.
    #[error("{0} trailing bytes in transaction batch")]
    TrailingBytes(usize),
    /// The calldata failed to ABI decode.
    #[error(transparent)]
    Abi(#[from] alloy_sol_types::Error),
}

/// An error occurring during the encoding.
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    /// The batch holds no block.
    #[error("cannot encode an empty batch")]
    EmptyBatch,
}
