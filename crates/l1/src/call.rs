use crate::{
    appendTxBatchCall, confirmFirstUnresolvedAssertionCall, createAssertionCall,
    rejectFirstUnresolvedAssertionCall, L1CallError, L1Contract,
};
use alloy_sol_types::SolCall;

/// A decoded call to one of the L1 contracts.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::From)]
pub enum L1Call {
    /// A batch of L2 blocks appended to the sequencer inbox.
    AppendTxBatch(appendTxBatchCall),
    /// A new assertion created on the rollup.
    CreateAssertion(createAssertionCall),
    /// The first unresolved assertion is confirmed.
    ConfirmFirstUnresolvedAssertion(confirmFirstUnresolvedAssertionCall),
    /// The first unresolved assertion is rejected.
    RejectFirstUnresolvedAssertion(rejectFirstUnresolvedAssertionCall),
}

impl L1Call {
    /// Decodes the calldata sent to the provided contract.
    pub fn decode(contract: L1Contract, calldata: &[u8]) -> Result<Self, L1CallError> {
        let selector: [u8; 4] = calldata
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or(L1CallError::Decode(alloy_sol_types::Error::Overrun))?;

        let call = match (contract, selector) {
            (L1Contract::SequencerInbox, appendTxBatchCall::SELECTOR) => {
                appendTxBatchCall::abi_decode(calldata)?.into()
            }
            (L1Contract::Rollup, createAssertionCall::SELECTOR) => {
                createAssertionCall::abi_decode(calldata)?.into()
            }
            (L1Contract::Rollup, confirmFirstUnresolvedAssertionCall::SELECTOR) => {
                confirmFirstUnresolvedAssertionCall::abi_decode(calldata)?.into()
            }
            (L1Contract::Rollup, rejectFirstUnresolvedAssertionCall::SELECTOR) => {
                rejectFirstUnresolvedAssertionCall::abi_decode(calldata)?.into()
            }
            (contract, selector) => {
                return Err(L1CallError::UnknownMethod { contract, selector: selector.into() })
            }
        };
        Ok(call)
    }

    /// Returns `true` if the call carries L2 data.
    pub const fn is_data_availability(&self) -> bool {
        matches!(self, Self::AppendTxBatch(_))
    }
}
