use crate::random;
use alloy_primitives::B256;
use ::arbitrary::Arbitrary;
use rollup_node_primitives::BlockRef;

/// Test utils for arbitrary.
pub mod arbitrary;

pub use l1::MockL1Provider;
mod l1;

pub use l2::MockL2Provider;
mod l2;

pub use tx::MockTxManager;
mod tx;

/// Returns a chain of linked headers of size `len`, starting at the genesis.
pub fn chain(len: usize) -> Vec<BlockRef> {
    assert!(len >= 1, "chain should at least contain the genesis");

    let genesis = BlockRef::new(0, random!(B256), B256::ZERO);
    let mut chain = Vec::with_capacity(len);
    chain.push(genesis);
    chain.extend(chain_from(&genesis, len - 1));
    chain
}

/// Returns `len` headers extending the provided parent, excluding the parent.
pub fn chain_from(parent: &BlockRef, len: usize) -> Vec<BlockRef> {
    let mut headers: Vec<BlockRef> = Vec::with_capacity(len);
    for _ in 0..len {
        let parent = *headers.last().unwrap_or(parent);
        headers.push(BlockRef::new(parent.number + 1, random!(B256), parent.hash));
    }
    headers
}
