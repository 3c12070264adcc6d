use std::time::Duration;

use alloy_network::{ReceiptResponse, TransactionBuilder};
use alloy_primitives::{Address, Bytes, B256};
use alloy_provider::{PendingTransactionError, Provider};
use alloy_rpc_types_eth::TransactionRequest;
use alloy_transport::{RpcError, TransportErrorKind};

/// A contract call to submit to the L1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxCandidate {
    /// The contract address.
    pub to: Address,
    /// The call data.
    pub data: Bytes,
}

/// The receipt of a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxReceipt {
    /// The transaction hash.
    pub hash: B256,
    /// The block the transaction was included in.
    pub block_number: Option<u64>,
}

/// An error occurring at the [`TxManager`].
#[derive(Debug, thiserror::Error)]
pub enum TxManagerError {
    /// RPC error.
    #[error(transparent)]
    Rpc(#[from] RpcError<TransportErrorKind>),
    /// Waiting for the transaction failed or timed out.
    #[error(transparent)]
    Pending(#[from] PendingTransactionError),
    /// The transaction reverted.
    #[error("transaction {0} reverted")]
    Reverted(B256),
    /// Other error.
    #[error("{0}")]
    Other(&'static str),
}

/// An instance of the trait signs, sends and confirms transactions.
#[async_trait::async_trait]
#[auto_impl::auto_impl(Arc, &)]
pub trait TxManager: Sync + Send {
    /// Sends the candidate and waits for its receipt.
    async fn send(&self, candidate: TxCandidate) -> Result<TxReceipt, TxManagerError>;
}

/// A [`TxManager`] sending transactions through an alloy [`Provider`] holding a wallet.
#[derive(Debug, Clone)]
pub struct AlloyTxManager<P> {
    provider: P,
    confirmation_timeout: Duration,
}

impl<P: Provider> AlloyTxManager<P> {
    /// Returns a new instance of an [`AlloyTxManager`].
    pub const fn new(provider: P, confirmation_timeout: Duration) -> Self {
        Self { provider, confirmation_timeout }
    }
}

#[async_trait::async_trait]
impl<P: Provider> TxManager for AlloyTxManager<P> {
    async fn send(&self, candidate: TxCandidate) -> Result<TxReceipt, TxManagerError> {
        let request =
            TransactionRequest::default().with_to(candidate.to).with_input(candidate.data);
        let pending = self.provider.send_transaction(request).await?;
        let hash = *pending.tx_hash();
        tracing::debug!(target: "rollup::providers", ?hash, "sent transaction");

        let receipt = pending.with_timeout(Some(self.confirmation_timeout)).get_receipt().await?;
        if !receipt.status() {
            return Err(TxManagerError::Reverted(hash))
        }

        Ok(TxReceipt { hash, block_number: receipt.block_number() })
    }
}
