use crate::L1Contract;
use alloy_primitives::{Address, Selector, B256};

/// An error occurring when decoding an L1 transaction into an [`L1Call`](crate::L1Call).
#[derive(Debug, thiserror::Error)]
pub enum L1CallError {
    /// The transaction has no recipient.
    #[error("transaction {0} has no recipient")]
    MissingRecipient(B256),
    /// The transaction input is too short to contain a method selector.
    #[error("transaction {0} has no method selector")]
    MissingSelector(B256),
    /// The transaction is not sent to a known contract.
    #[error("unknown contract {0}")]
    UnknownContract(Address),
    /// The method selector is not part of the contract's call table.
    #[error("unknown method {selector} for {contract}")]
    UnknownMethod {
        /// The contract the transaction was sent to.
        contract: L1Contract,
        /// The unknown selector.
        selector: Selector,
    },
    /// The input failed to ABI decode.
    #[error(transparent)]
    Decode(#[from] alloy_sol_types::Error),
}
