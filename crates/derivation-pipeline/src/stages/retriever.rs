use crate::{PipelineError, Processor};
use std::collections::VecDeque;

use rollup_l1::L1Contracts;
use rollup_node_primitives::{BlockInfo, L1Transaction};
use rollup_node_providers::L1Provider;

/// The transactions of an L1 block calling the followed contracts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredBlock {
    /// The L1 block.
    pub block: BlockInfo,
    /// The filtered transactions, in block order.
    pub transactions: Vec<L1Transaction>,
}

/// Fetches the L1 blocks and keeps the transactions calling a known method of the
/// [`L1Contracts`].
#[derive(Debug)]
pub struct L1TxRetriever<P> {
    provider: P,
    contracts: L1Contracts,
    queue: VecDeque<FilteredBlock>,
}

impl<P: L1Provider> L1TxRetriever<P> {
    /// Returns a new instance of the [`L1TxRetriever`].
    pub const fn new(provider: P, contracts: L1Contracts) -> Self {
        Self { provider, contracts, queue: VecDeque::new() }
    }
}

#[async_trait::async_trait]
impl<P: L1Provider> Processor for L1TxRetriever<P> {
    type Input = BlockInfo;
    type Output = FilteredBlock;

    async fn ingest(&mut self, input: &BlockInfo) -> Result<(), PipelineError> {
        let block = self
            .provider
            .block_by_hash(input.hash)
            .await?
            .ok_or(PipelineError::MissingL1Block(input.hash))?;

        let transactions: Vec<_> =
            block.transactions.into_iter().filter(|tx| self.contracts.filter(tx)).collect();
        if !transactions.is_empty() {
            tracing::debug!(target: "rollup::derivation", block = %input, count = transactions.len(), "filtered L1 transactions");
        }

        self.queue.push_back(FilteredBlock { block: *input, transactions });
        Ok(())
    }

    fn next(&mut self) -> Option<FilteredBlock> {
        self.queue.pop_front()
    }

    fn has_next(&self) -> bool {
        !self.queue.is_empty()
    }

    async fn recover(&mut self, _l1_block: BlockInfo) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, Address, Bytes, B256};
    use alloy_sol_types::SolCall;
    use rollup_l1::{confirmFirstUnresolvedAssertionCall, rejectFirstUnresolvedAssertionCall};
    use rollup_node_primitives::{BlockRef, L1Block};
    use rollup_node_providers::test_utils::MockL1Provider;

    const INBOX: Address = address!("0x1000000000000000000000000000000000000001");
    const ROLLUP: Address = address!("0x2000000000000000000000000000000000000002");

    fn tx(byte: u8, to: Address, input: Vec<u8>) -> L1Transaction {
        L1Transaction { hash: B256::repeat_byte(byte), to: Some(to), input: Bytes::from(input) }
    }

    #[tokio::test]
    async fn test_filters_block_transactions() -> eyre::Result<()> {
        let confirm = tx(1, ROLLUP, confirmFirstUnresolvedAssertionCall {}.abi_encode());
        let transfer = tx(2, Address::repeat_byte(9), vec![]);
        let wrong_contract = tx(3, INBOX, rejectFirstUnresolvedAssertionCall {}.abi_encode());
        let reject = tx(4, ROLLUP, rejectFirstUnresolvedAssertionCall {}.abi_encode());

        let block_ref = BlockRef::new(1, B256::repeat_byte(1), B256::ZERO);
        let l1 = MockL1Provider::new([L1Block {
            block_ref,
            transactions: vec![confirm.clone(), transfer, wrong_contract, reject.clone()],
        }]);
        let mut retriever = L1TxRetriever::new(l1, L1Contracts::new(INBOX, ROLLUP));

        retriever.ingest(&block_ref.info()).await?;
        assert!(retriever.has_next());
        assert_eq!(
            retriever.next(),
            Some(FilteredBlock { block: block_ref.info(), transactions: vec![confirm, reject] })
        );
        assert!(retriever.next().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_block_is_retryable() {
        let mut retriever =
            L1TxRetriever::new(MockL1Provider::default(), L1Contracts::new(INBOX, ROLLUP));
        let err = retriever.ingest(&BlockInfo::new(1, B256::repeat_byte(1))).await.unwrap_err();
        assert!(matches!(err, PipelineError::MissingL1Block(_)));
        assert!(!retriever.has_next());
    }
}
