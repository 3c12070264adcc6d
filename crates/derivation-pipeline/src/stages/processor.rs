use crate::{
    DerivationPipelineMetrics, FilteredBlock, PayloadBuilder, PipelineError, Processor,
    RollupState,
};
use std::collections::VecDeque;

use rollup_engine::ExecutionBackend;
use rollup_l1::{L1Call, L1Contracts};
use rollup_node_primitives::{BlockInfo, BlockRelation, L1Transaction};
use rollup_node_providers::L2Dialer;

/// The progress within a partially processed L1 block.
#[derive(Debug, Clone, Copy)]
struct BlockProgress {
    block: BlockInfo,
    num_txs_remaining: usize,
    relation: Option<BlockRelation>,
}

/// Applies the filtered L1 transactions: batches are handed to the [`PayloadBuilder`], rollup
/// calls update the [`RollupState`].
///
/// Outputs one item per L1 block, holding the relation of the last batch of the block if any.
#[derive(Debug)]
pub struct L1TxProcessor<B, D: L2Dialer> {
    contracts: L1Contracts,
    payload_builder: PayloadBuilder<B, D>,
    rollup_state: RollupState,
    progress: Option<BlockProgress>,
    queue: VecDeque<Option<BlockRelation>>,
    metrics: DerivationPipelineMetrics,
}

impl<B, D> L1TxProcessor<B, D>
where
    B: ExecutionBackend,
    D: L2Dialer,
{
    /// Returns a new instance of the [`L1TxProcessor`].
    pub fn new(
        contracts: L1Contracts,
        payload_builder: PayloadBuilder<B, D>,
        rollup_state: RollupState,
    ) -> Self {
        Self {
            contracts,
            payload_builder,
            rollup_state,
            progress: None,
            queue: VecDeque::new(),
            metrics: DerivationPipelineMetrics::default(),
        }
    }

    /// Returns the rollup state.
    pub const fn rollup_state(&self) -> &RollupState {
        &self.rollup_state
    }

    /// Returns the number of transactions of the current L1 block left to process.
    pub fn num_txs_remaining(&self) -> usize {
        self.progress.map_or(0, |p| p.num_txs_remaining)
    }

    async fn process(
        &mut self,
        l1_block: BlockInfo,
        tx: &L1Transaction,
    ) -> Result<Option<BlockRelation>, PipelineError> {
        let call = self.contracts.decode(tx)?;
        tracing::trace!(target: "rollup::derivation", hash = %tx.hash, da = call.is_data_availability(), "processing L1 transaction");

        match call {
            L1Call::AppendTxBatch(call) => {
                let last = self.payload_builder.build(l1_block, &call).await?;
                return Ok(Some(BlockRelation::from(&last)))
            }
            L1Call::CreateAssertion(call) => {
                self.rollup_state.create_assertion(l1_block, &call);
            }
            L1Call::ConfirmFirstUnresolvedAssertion(_) => {
                self.rollup_state.confirm_first_unresolved(l1_block)?;
            }
            L1Call::RejectFirstUnresolvedAssertion(_) => {
                self.rollup_state.reject_first_unresolved(l1_block)?;
            }
        }
        Ok(None)
    }
}

#[async_trait::async_trait]
impl<B, D> Processor for L1TxProcessor<B, D>
where
    B: ExecutionBackend,
    D: L2Dialer,
{
    type Input = FilteredBlock;
    type Output = Option<BlockRelation>;

    async fn ingest(&mut self, input: &FilteredBlock) -> Result<(), PipelineError> {
        let total = input.transactions.len();
        let (mut remaining, mut relation) = match self.progress.take() {
            Some(progress) if progress.block == input.block => {
                tracing::debug!(target: "rollup::derivation", block = %input.block, remaining = progress.num_txs_remaining, "resuming L1 block");
                (progress.num_txs_remaining.min(total), progress.relation)
            }
            _ => (total, None),
        };

        for tx in &input.transactions[total - remaining..] {
            match self.process(input.block, tx).await {
                Ok(Some(new)) => relation = Some(new),
                Ok(None) => {}
                Err(err) => {
                    self.progress = Some(BlockProgress {
                        block: input.block,
                        num_txs_remaining: remaining,
                        relation,
                    });
                    return Err(err)
                }
            }
            remaining -= 1;
        }

        self.metrics.processed_l1_blocks.increment(1);
        self.metrics.l1_block_number.set(input.block.number as f64);
        self.queue.push_back(relation);
        Ok(())
    }

    fn next(&mut self) -> Option<Option<BlockRelation>> {
        self.queue.pop_front()
    }

    fn has_next(&self) -> bool {
        !self.queue.is_empty()
    }

    async fn recover(&mut self, l1_block: BlockInfo) {
        self.queue.clear();
        self.progress = None;
        self.rollup_state.recover(l1_block);
    }
}
