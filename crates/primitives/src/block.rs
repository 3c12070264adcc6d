use alloy_eips::{BlockNumHash, BlockNumberOrTag};
use alloy_primitives::B256;

/// Information about a block: its number and hash on a given chain.
///
/// The default value is used as a sentinel for an unknown block.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, derive_more::Display)]
#[display("#{number} ({hash})")]
pub struct BlockInfo {
    /// The block number.
    pub number: u64,
    /// The block hash.
    pub hash: B256,
}

impl BlockInfo {
    /// The empty block info, standing for an unknown block.
    pub const EMPTY: Self = Self { number: 0, hash: B256::ZERO };

    /// Returns a new instance of [`BlockInfo`].
    pub const fn new(number: u64, hash: B256) -> Self {
        Self { number, hash }
    }

    /// Returns `true` if this is the [`BlockInfo::EMPTY`] sentinel.
    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }
}

impl From<BlockNumHash> for BlockInfo {
    fn from(value: BlockNumHash) -> Self {
        Self { number: value.number, hash: value.hash }
    }
}

#[cfg(feature = "arbitrary")]
impl arbitrary::Arbitrary<'_> for BlockInfo {
    fn arbitrary(u: &mut arbitrary::Unstructured<'_>) -> arbitrary::Result<Self> {
        let number = u.int_in_range(0..=u32::MAX)?;
        let hash = B256::arbitrary(u)?;
        Ok(Self { number: number as u64, hash })
    }
}

/// A block reference, used to validate the linkage of a chain.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, derive_more::Display)]
#[display("#{number} ({hash}, parent {parent_hash})")]
pub struct BlockRef {
    /// The block number.
    pub number: u64,
    /// The block hash.
    pub hash: B256,
    /// The hash of the parent block.
    pub parent_hash: B256,
}

impl BlockRef {
    /// Returns a new instance of [`BlockRef`].
    pub const fn new(number: u64, hash: B256, parent_hash: B256) -> Self {
        Self { number, hash, parent_hash }
    }

    /// Returns the [`BlockInfo`] for the block reference.
    pub const fn info(&self) -> BlockInfo {
        BlockInfo { number: self.number, hash: self.hash }
    }

    /// Returns `true` if the block directly extends the provided parent.
    pub fn extends(&self, parent: &BlockInfo) -> bool {
        self.number == parent.number + 1 && self.parent_hash == parent.hash
    }
}

impl From<BlockRef> for BlockInfo {
    fn from(value: BlockRef) -> Self {
        value.info()
    }
}

/// A reference to an L2 block along with its provenance on the L1.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct L2BlockRef {
    /// The L2 block reference.
    pub block: BlockRef,
    /// The L1 block that was observed when the L2 block was derived.
    pub l1_origin: BlockInfo,
    /// The L2 block timestamp.
    pub timestamp: u64,
}

impl L2BlockRef {
    /// Returns a new instance of [`L2BlockRef`].
    pub const fn new(block: BlockRef, l1_origin: BlockInfo, timestamp: u64) -> Self {
        Self { block, l1_origin, timestamp }
    }

    /// Returns the [`BlockInfo`] of the L2 block.
    pub const fn info(&self) -> BlockInfo {
        self.block.info()
    }
}

/// The commitment levels of a chain.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum BlockTag {
    /// The latest block.
    #[display("latest")]
    Latest,
    /// The safe block.
    #[display("safe")]
    Safe,
    /// The finalized block.
    #[display("finalized")]
    Finalized,
}

impl BlockTag {
    /// All the tags, in increasing commitment order.
    pub const ALL: [Self; 3] = [Self::Latest, Self::Safe, Self::Finalized];
}

impl From<BlockTag> for BlockNumberOrTag {
    fn from(value: BlockTag) -> Self {
        match value {
            BlockTag::Latest => Self::Latest,
            BlockTag::Safe => Self::Safe,
            BlockTag::Finalized => Self::Finalized,
        }
    }
}
