use crate::{
    appendTxBatchCall, confirmFirstUnresolvedAssertionCall, createAssertionCall,
    rejectFirstUnresolvedAssertionCall, L1Call, L1CallError,
};
use alloy_primitives::Address;
use alloy_sol_types::SolCall;
use rollup_node_primitives::L1Transaction;

/// The L1 contracts the rollup node follows.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum L1Contract {
    /// The inbox receiving the L2 transaction batches.
    #[display("sequencer inbox")]
    SequencerInbox,
    /// The rollup contract tracking assertions.
    #[display("rollup")]
    Rollup,
}

impl L1Contract {
    /// Returns the method selectors the node handles for the contract.
    pub const fn selectors(&self) -> &'static [[u8; 4]] {
        match self {
            Self::SequencerInbox => &[appendTxBatchCall::SELECTOR],
            Self::Rollup => &[
                createAssertionCall::SELECTOR,
                confirmFirstUnresolvedAssertionCall::SELECTOR,
                rejectFirstUnresolvedAssertionCall::SELECTOR,
            ],
        }
    }
}

/// The addresses of the L1 contracts, used to filter and decode L1 transactions.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct L1Contracts {
    /// The sequencer inbox address.
    pub sequencer_inbox: Address,
    /// The rollup address.
    pub rollup: Address,
}

impl L1Contracts {
    /// Returns a new instance of [`L1Contracts`].
    pub const fn new(sequencer_inbox: Address, rollup: Address) -> Self {
        Self { sequencer_inbox, rollup }
    }

    /// Returns the contract deployed at the address, if any.
    pub fn contract(&self, address: Address) -> Option<L1Contract> {
        if address == self.sequencer_inbox {
            Some(L1Contract::SequencerInbox)
        } else if address == self.rollup {
            Some(L1Contract::Rollup)
        } else {
            None
        }
    }

    /// Returns `true` if the transaction calls a known method of one of the contracts.
    pub fn filter(&self, tx: &L1Transaction) -> bool {
        let (Some(to), Some(selector)) = (tx.to, tx.selector()) else { return false };
        self.contract(to).is_some_and(|contract| contract.selectors().contains(&selector))
    }

    /// Decodes the transaction into an [`L1Call`].
    pub fn decode(&self, tx: &L1Transaction) -> Result<L1Call, L1CallError> {
        let to = tx.to.ok_or(L1CallError::MissingRecipient(tx.hash))?;
        let contract = self.contract(to).ok_or(L1CallError::UnknownContract(to))?;
        if tx.selector().is_none() {
            return Err(L1CallError::MissingSelector(tx.hash))
        }
        L1Call::decode(contract, &tx.input)
    }
}
