use crate::{L1Provider, L1ProviderError};
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use alloy_primitives::B256;
use parking_lot::Mutex;
use rollup_node_primitives::{BlockRef, BlockTag, L1Block};

#[derive(Debug, Default)]
struct MockL1Chain {
    canonical: BTreeMap<u64, L1Block>,
    blocks: HashMap<B256, L1Block>,
    tags: HashMap<BlockTag, u64>,
    failures: usize,
}

/// A scripted [`L1Provider`]. Blocks replaced by a reorg stay retrievable by hash.
#[derive(Debug, Clone, Default)]
pub struct MockL1Provider {
    chain: Arc<Mutex<MockL1Chain>>,
}

impl MockL1Provider {
    /// Returns a new [`MockL1Provider`] with the provided canonical blocks.
    pub fn new(blocks: impl IntoIterator<Item = L1Block>) -> Self {
        let provider = Self::default();
        provider.insert_blocks(blocks);
        provider
    }

    /// Inserts the blocks in the canonical chain. Inserting a block drops the canonical blocks
    /// at or above its number, which simulates a reorg.
    pub fn insert_blocks(&self, blocks: impl IntoIterator<Item = L1Block>) {
        let mut chain = self.chain.lock();
        for block in blocks {
            let number = block.block_ref.number;
            let _ = chain.canonical.split_off(&number);
            chain.blocks.insert(block.block_ref.hash, block.clone());
            chain.canonical.insert(number, block);
        }
    }

    /// Sets the block number returned for the tag.
    pub fn set_tag(&self, tag: BlockTag, number: u64) {
        self.chain.lock().tags.insert(tag, number);
    }

    /// Fails the next `count` calls.
    pub fn fail_next(&self, count: usize) {
        self.chain.lock().failures = count;
    }

    /// Returns the canonical header at the number.
    pub fn header(&self, number: u64) -> Option<BlockRef> {
        self.chain.lock().canonical.get(&number).map(|b| b.block_ref)
    }
}

impl MockL1Chain {
    fn check_failure(&mut self) -> Result<(), L1ProviderError> {
        if self.failures > 0 {
            self.failures -= 1;
            return Err(L1ProviderError::Other("mock failure"))
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl L1Provider for MockL1Provider {
    async fn header_by_number(&self, number: u64) -> Result<Option<BlockRef>, L1ProviderError> {
        let mut chain = self.chain.lock();
        chain.check_failure()?;
        Ok(chain.canonical.get(&number).map(|b| b.block_ref))
    }

    async fn header_by_tag(&self, tag: BlockTag) -> Result<Option<BlockRef>, L1ProviderError> {
        let mut chain = self.chain.lock();
        chain.check_failure()?;
        let number = match (tag, chain.tags.get(&tag)) {
            (_, Some(number)) => Some(*number),
            (BlockTag::Latest, None) => chain.canonical.keys().next_back().copied(),
            _ => None,
        };
        Ok(number.and_then(|n| chain.canonical.get(&n)).map(|b| b.block_ref))
    }

    async fn block_by_hash(&self, hash: B256) -> Result<Option<L1Block>, L1ProviderError> {
        let mut chain = self.chain.lock();
        chain.check_failure()?;
        Ok(chain.blocks.get(&hash).cloned())
    }

    async fn block_number(&self) -> Result<u64, L1ProviderError> {
        let mut chain = self.chain.lock();
        chain.check_failure()?;
        Ok(chain.canonical.keys().next_back().copied().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{chain, chain_from};

    fn blocks(headers: &[BlockRef]) -> Vec<L1Block> {
        headers.iter().map(|h| L1Block { block_ref: *h, transactions: vec![] }).collect()
    }

    #[tokio::test]
    async fn test_mock_l1_reorg() -> eyre::Result<()> {
        let headers = chain(5);
        let provider = MockL1Provider::new(blocks(&headers));
        assert_eq!(provider.block_number().await?, 4);

        let fork = chain_from(&headers[2], 1);
        provider.insert_blocks(blocks(&fork));

        assert_eq!(provider.block_number().await?, 3);
        assert_eq!(provider.header_by_number(3).await?, Some(fork[0]));
        assert_eq!(provider.header_by_number(4).await?, None);
        assert!(provider.block_by_hash(headers[4].hash).await?.is_some());

        Ok(())
    }

    #[tokio::test]
    async fn test_mock_l1_tags_and_failures() -> eyre::Result<()> {
        let headers = chain(4);
        let provider = MockL1Provider::new(blocks(&headers));

        assert_eq!(provider.header_by_tag(BlockTag::Latest).await?, Some(headers[3]));
        assert_eq!(provider.header_by_tag(BlockTag::Safe).await?, None);
        provider.set_tag(BlockTag::Safe, 2);
        assert_eq!(provider.header_by_tag(BlockTag::Safe).await?, Some(headers[2]));

        provider.fail_next(1);
        assert!(provider.header_by_number(1).await.is_err());
        assert_eq!(provider.header_by_number(1).await?, Some(headers[1]));

        Ok(())
    }
}
