use crate::block_ref;

use alloy_eips::eip2718::Encodable2718;
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_types_eth::Block;
use alloy_transport::{RpcError, TransportErrorKind};
use rollup_node_primitives::{BlockRef, BlockTag, L2Block};

/// An error occurring at the [`L2Provider`] or the [`L2Dialer`].
#[derive(Debug, thiserror::Error)]
pub enum L2ProviderError {
    /// L2 RPC error.
    #[error(transparent)]
    Rpc(#[from] RpcError<TransportErrorKind>),
    /// Other error.
    #[error("{0}")]
    Other(&'static str),
}

/// An instance of the trait can be used to read the L2 chain.
#[async_trait::async_trait]
#[auto_impl::auto_impl(Arc, &)]
pub trait L2Provider: Sync + Send {
    /// Returns the latest block number.
    async fn block_number(&self) -> Result<u64, L2ProviderError>;

    /// Returns the header at the provided number.
    async fn header_by_number(&self, number: u64) -> Result<Option<BlockRef>, L2ProviderError>;

    /// Returns the header for the provided tag.
    async fn header_by_tag(&self, tag: BlockTag) -> Result<Option<BlockRef>, L2ProviderError>;

    /// Returns the block with its encoded transactions at the provided number.
    async fn block_by_number(&self, number: u64) -> Result<Option<L2Block>, L2ProviderError>;
}

/// An instance of the trait opens a connection to the L2.
#[async_trait::async_trait]
#[auto_impl::auto_impl(Arc, &)]
pub trait L2Dialer: Sync + Send {
    /// The provider returned on a successful dial.
    type Provider: L2Provider + std::fmt::Debug;

    /// Dials the L2.
    async fn dial(&self) -> Result<Self::Provider, L2ProviderError>;
}

/// The provider uses an alloy [`Provider`] internally to implement the [`L2Provider`] trait.
#[derive(Debug, Clone)]
pub struct AlloyL2Provider<P> {
    provider: P,
}

impl<P: Provider> AlloyL2Provider<P> {
    /// Returns a new instance of an [`AlloyL2Provider`].
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }
}

#[async_trait::async_trait]
impl<P: Provider> L2Provider for AlloyL2Provider<P> {
    async fn block_number(&self) -> Result<u64, L2ProviderError> {
        Ok(self.provider.get_block_number().await?)
    }

    async fn header_by_number(&self, number: u64) -> Result<Option<BlockRef>, L2ProviderError> {
        let block = self.provider.get_block_by_number(number.into()).await?;
        Ok(block.map(|b| block_ref(&b.header)))
    }

    async fn header_by_tag(&self, tag: BlockTag) -> Result<Option<BlockRef>, L2ProviderError> {
        let block = self.provider.get_block_by_number(tag.into()).await?;
        Ok(block.map(|b| block_ref(&b.header)))
    }

    async fn block_by_number(&self, number: u64) -> Result<Option<L2Block>, L2ProviderError> {
        tracing::trace!(target: "rollup::providers", number, "fetching l2 block");
        let block = self.provider.get_block_by_number(number.into()).full().await?;
        Ok(block.map(into_l2_block))
    }
}

fn into_l2_block(block: Block) -> L2Block {
    let block_ref = block_ref(&block.header);
    let timestamp = block.header.timestamp;
    let transactions = block
        .transactions
        .into_transactions()
        .map(|tx| tx.inner.into_inner().encoded_2718().into())
        .collect();
    L2Block { block_ref, timestamp, transactions }
}

/// Dials the L2 RPC at the provided URL, checking the endpoint answers before returning.
#[derive(Debug, Clone)]
pub struct HttpL2Dialer {
    url: String,
}

impl HttpL2Dialer {
    /// Returns a new instance of a [`HttpL2Dialer`].
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait::async_trait]
impl L2Dialer for HttpL2Dialer {
    type Provider = AlloyL2Provider<RootProvider>;

    async fn dial(&self) -> Result<Self::Provider, L2ProviderError> {
        let provider = RootProvider::connect(&self.url).await?;
        let chain_id = provider.get_chain_id().await?;
        tracing::info!(target: "rollup::providers", url = %self.url, chain_id, "dialed l2");
        Ok(AlloyL2Provider::new(provider))
    }
}
