//! The crate exposes the providers the rollup node reads the L1 and L2 chains from and submits
//! transactions through, along with their alloy implementations.

pub use l1::{AlloyL1Provider, L1Provider, L1ProviderError};
mod l1;

pub use l2::{AlloyL2Provider, HttpL2Dialer, L2Dialer, L2Provider, L2ProviderError};
mod l2;

pub use tx::{AlloyTxManager, TxCandidate, TxManager, TxManagerError, TxReceipt};
mod tx;

#[cfg(any(test, feature = "test-utils"))]
/// Mock providers and chain helpers for tests.
pub mod test_utils;

use alloy_rpc_types_eth::Header;
use rollup_node_primitives::BlockRef;

/// Returns the [`BlockRef`] of the RPC header.
fn block_ref(header: &Header) -> BlockRef {
    BlockRef::new(header.number, header.hash, header.parent_hash)
}
