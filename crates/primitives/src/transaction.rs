use crate::BlockRef;
use alloy_primitives::{Address, Bytes, B256};

/// The subset of an L1 transaction relevant to derivation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct L1Transaction {
    /// The transaction hash.
    pub hash: B256,
    /// The recipient of the transaction, [`None`] for contract creations.
    pub to: Option<Address>,
    /// The transaction input.
    pub input: Bytes,
}

impl L1Transaction {
    /// Returns the 4 bytes method selector of the input, if any.
    pub fn selector(&self) -> Option<[u8; 4]> {
        self.input.get(..4).and_then(|s| s.try_into().ok())
    }
}

/// An L1 block along with its transactions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct L1Block {
    /// The block reference.
    pub block_ref: BlockRef,
    /// The transactions of the block, in order.
    pub transactions: Vec<L1Transaction>,
}

/// An L2 block along with its EIP-2718 encoded transactions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct L2Block {
    /// The block reference.
    pub block_ref: BlockRef,
    /// The block timestamp.
    pub timestamp: u64,
    /// The encoded transactions of the block, in order.
    pub transactions: Vec<Bytes>,
}

/// An L2 block decoded from L1 data, to be built by the execution backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivationBlock {
    /// The L2 block number.
    pub number: u64,
    /// The L2 block timestamp.
    pub timestamp: u64,
    /// The encoded transactions of the block, in order.
    pub transactions: Vec<Bytes>,
}

impl DerivationBlock {
    /// Returns a new instance of [`DerivationBlock`].
    pub const fn new(number: u64, timestamp: u64, transactions: Vec<Bytes>) -> Self {
        Self { number, timestamp, transactions }
    }
}

impl From<&L2Block> for DerivationBlock {
    fn from(value: &L2Block) -> Self {
        Self {
            number: value.block_ref.number,
            timestamp: value.timestamp,
            transactions: value.transactions.clone(),
        }
    }
}
