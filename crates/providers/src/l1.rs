use crate::block_ref;

use alloy_consensus::Transaction;
use alloy_network::TransactionResponse;
use alloy_primitives::B256;
use alloy_provider::Provider;
use alloy_rpc_types_eth::Block;
use alloy_transport::{RpcError, TransportErrorKind};
use rollup_node_primitives::{BlockRef, BlockTag, L1Block, L1Transaction};

/// An error occurring at the [`L1Provider`].
#[derive(Debug, thiserror::Error)]
pub enum L1ProviderError {
    /// L1 RPC error.
    #[error(transparent)]
    Rpc(#[from] RpcError<TransportErrorKind>),
    /// Other error.
    #[error("{0}")]
    Other(&'static str),
}

/// An instance of the trait can be used to read the L1 chain.
#[async_trait::async_trait]
#[auto_impl::auto_impl(Arc, &)]
pub trait L1Provider: Sync + Send {
    /// Returns the header at the provided number, or [`None`] if the chain has not reached it yet.
    async fn header_by_number(&self, number: u64) -> Result<Option<BlockRef>, L1ProviderError>;

    /// Returns the header for the provided tag.
    async fn header_by_tag(&self, tag: BlockTag) -> Result<Option<BlockRef>, L1ProviderError>;

    /// Returns the block with its transactions for the provided hash.
    async fn block_by_hash(&self, hash: B256) -> Result<Option<L1Block>, L1ProviderError>;

    /// Returns the latest block number.
    async fn block_number(&self) -> Result<u64, L1ProviderError>;
}

/// The provider uses an alloy [`Provider`] internally to implement the [`L1Provider`] trait.
#[derive(Debug, Clone)]
pub struct AlloyL1Provider<P> {
    provider: P,
}

impl<P: Provider> AlloyL1Provider<P> {
    /// Returns a new instance of an [`AlloyL1Provider`].
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }
}

#[async_trait::async_trait]
impl<P: Provider> L1Provider for AlloyL1Provider<P> {
    async fn header_by_number(&self, number: u64) -> Result<Option<BlockRef>, L1ProviderError> {
        let block = self.provider.get_block_by_number(number.into()).await?;
        Ok(block.map(|b| block_ref(&b.header)))
    }

    async fn header_by_tag(&self, tag: BlockTag) -> Result<Option<BlockRef>, L1ProviderError> {
        let block = self.provider.get_block_by_number(tag.into()).await?;
        Ok(block.map(|b| block_ref(&b.header)))
    }

    async fn block_by_hash(&self, hash: B256) -> Result<Option<L1Block>, L1ProviderError> {
        tracing::trace!(target: "rollup::providers", ?hash, "fetching l1 block");
        let block = self.provider.get_block_by_hash(hash).full().await?;
        Ok(block.map(into_l1_block))
    }

    async fn block_number(&self) -> Result<u64, L1ProviderError> {
        Ok(self.provider.get_block_number().await?)
    }
}

fn into_l1_block(block: Block) -> L1Block {
    let block_ref = block_ref(&block.header);
    let transactions = block
        .transactions
        .into_transactions()
        .map(|tx| L1Transaction {
            hash: TransactionResponse::tx_hash(&tx),
            to: Transaction::to(&tx),
            input: Transaction::input(&tx).clone(),
        })
        .collect();
    L1Block { block_ref, transactions }
}
