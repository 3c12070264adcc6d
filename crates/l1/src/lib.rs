//! A library containing the contract calls the rollup node reads from and submits to the L1.

pub use abi::{
    appendTxBatchCall, confirmFirstUnresolvedAssertionCall, createAssertionCall,
    rejectFirstUnresolvedAssertionCall,
};
mod abi;

pub use call::L1Call;
mod call;

pub use contracts::{L1Contract, L1Contracts};
mod contracts;

pub use error::L1CallError;
mod error;
