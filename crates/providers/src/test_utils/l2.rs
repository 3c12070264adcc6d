use crate::{random, L2Dialer, L2Provider, L2ProviderError};
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use alloy_primitives::{Bytes, B256};
use arbitrary::Arbitrary;
use parking_lot::Mutex;
use rollup_node_primitives::{BlockRef, BlockTag, L2Block};

#[derive(Debug, Default)]
struct MockL2Chain {
    blocks: BTreeMap<u64, L2Block>,
    tags: HashMap<BlockTag, u64>,
    failures: usize,
    dial_failures: usize,
}

/// A mock L2 chain implementing [`L2Provider`] and [`L2Dialer`]. Clones share the same chain.
#[derive(Debug, Clone, Default)]
pub struct MockL2Provider {
    chain: Arc<Mutex<MockL2Chain>>,
}

impl MockL2Provider {
    /// Returns a new [`MockL2Provider`] whose chain only contains the genesis block.
    pub fn new() -> Self {
        let provider = Self::default();
        provider.insert_block(L2Block {
            block_ref: BlockRef::new(0, random!(B256), B256::ZERO),
            timestamp: 0,
            transactions: vec![],
        });
        provider
    }

    /// Inserts the block, dropping all the blocks at or above its number.
    pub fn insert_block(&self, block: L2Block) {
        let mut chain = self.chain.lock();
        let _ = chain.blocks.split_off(&block.block_ref.number);
        chain.blocks.insert(block.block_ref.number, block);
    }

    /// Builds a block at the provided number on top of the block preceding it.
    pub fn build_block(&self, number: u64, timestamp: u64, transactions: Vec<Bytes>) -> BlockRef {
        let parent_hash = self
            .chain
            .lock()
            .blocks
            .get(&number.saturating_sub(1))
            .map(|b| b.block_ref.hash)
            .unwrap_or_default();
        let block_ref = BlockRef::new(number, random!(B256), parent_hash);
        self.insert_block(L2Block { block_ref, timestamp, transactions });
        block_ref
    }

    /// Returns the head of the chain.
    pub fn head(&self) -> BlockRef {
        self.chain.lock().blocks.values().next_back().map(|b| b.block_ref).unwrap_or_default()
    }

    /// Returns the block at the number.
    pub fn block(&self, number: u64) -> Option<L2Block> {
        self.chain.lock().blocks.get(&number).cloned()
    }

    /// Sets the block number returned for the tag.
    pub fn set_tag(&self, tag: BlockTag, number: u64) {
        self.chain.lock().tags.insert(tag, number);
    }

    /// Fails the next `count` calls to the provider.
    pub fn fail_next(&self, count: usize) {
        self.chain.lock().failures = count;
    }

    /// Fails the next `count` dials.
    pub fn fail_dial(&self, count: usize) {
        self.chain.lock().dial_failures = count;
    }
}

impl MockL2Chain {
    fn check_failure(&mut self) -> Result<(), L2ProviderError> {
        if self.failures > 0 {
            self.failures -= 1;
            return Err(L2ProviderError::Other("mock failure"))
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl L2Provider for MockL2Provider {
    async fn block_number(&self) -> Result<u64, L2ProviderError> {
        let mut chain = self.chain.lock();
        chain.check_failure()?;
        Ok(chain.blocks.keys().next_back().copied().unwrap_or_default())
    }

    async fn header_by_number(&self, number: u64) -> Result<Option<BlockRef>, L2ProviderError> {
        let mut chain = self.chain.lock();
        chain.check_failure()?;
        Ok(chain.blocks.get(&number).map(|b| b.block_ref))
    }

    async fn header_by_tag(&self, tag: BlockTag) -> Result<Option<BlockRef>, L2ProviderError> {
        let mut chain = self.chain.lock();
        chain.check_failure()?;
        let block = match (tag, chain.tags.get(&tag)) {
            (_, Some(number)) => chain.blocks.get(number),
            (BlockTag::Latest, None) => chain.blocks.values().next_back(),
            _ => None,
        };
        Ok(block.map(|b| b.block_ref))
    }

    async fn block_by_number(&self, number: u64) -> Result<Option<L2Block>, L2ProviderError> {
        let mut chain = self.chain.lock();
        chain.check_failure()?;
        Ok(chain.blocks.get(&number).cloned())
    }
}

#[async_trait::async_trait]
impl L2Dialer for MockL2Provider {
    type Provider = Self;

    async fn dial(&self) -> Result<Self::Provider, L2ProviderError> {
        let mut chain = self.chain.lock();
        if chain.dial_failures > 0 {
            chain.dial_failures -= 1;
            return Err(L2ProviderError::Other("mock dial failure"))
        }
        Ok(self.clone())
    }
}
