//! Block context implementation.

use crate::DecodingError;
use alloy_primitives::U256;
use rollup_node_primitives::DerivationBlock;

/// The context of a block in a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockContext {
    /// The number of transactions in the block.
    pub num_txs: u64,
    /// The block number.
    pub number: u64,
    /// The block timestamp.
    pub timestamp: u64,
}

impl BlockContext {
    /// The count of words of an encoded context.
    pub const WORDS: usize = 3;

    /// Returns the words of the context, as laid out in the `contexts` array.
    pub fn to_words(&self) -> [U256; Self::WORDS] {
        [U256::from(self.num_txs), U256::from(self.number), U256::from(self.timestamp)]
    }

    /// Reads the context from its words.
    pub(crate) fn try_from_words(words: &[U256]) -> Result<Self, DecodingError> {
        let [num_txs, number, timestamp] = words else {
            return Err(DecodingError::MalformedContexts(words.len()))
        };
        Ok(Self { num_txs: to_u64(num_txs)?, number: to_u64(number)?, timestamp: to_u64(timestamp)? })
    }
}

impl From<&DerivationBlock> for BlockContext {
    fn from(value: &DerivationBlock) -> Self {
        Self {
            num_txs: value.transactions.len() as u64,
            number: value.number,
            timestamp: value.timestamp,
        }
    }
}

/// Converts the word to a [`u64`], failing on overflow.
pub(crate) fn to_u64(word: &U256) -> Result<u64, DecodingError> {
    u64::try_from(*word).map_err(|_| DecodingError::Overflow(*word))
}
