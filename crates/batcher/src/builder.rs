use crate::BatchBuilderError;
use std::collections::VecDeque;

use alloy_primitives::Bytes;
use rollup_codec::BatchPayload;
use rollup_node_primitives::{BlockRef, DerivationBlock, L2Block};

/// A batch built from the pending blocks, along with its encoded calldata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltBatch {
    /// The batch payload.
    pub payload: BatchPayload,
    /// The `appendTxBatch` calldata of the payload.
    pub calldata: Bytes,
}

impl BuiltBatch {
    /// Returns the number of blocks in the batch.
    pub fn len(&self) -> usize {
        self.payload.blocks.len()
    }

    /// Returns `true` if the batch contains no block.
    pub fn is_empty(&self) -> bool {
        self.payload.blocks.is_empty()
    }
}

/// Accumulates the L2 blocks to post to the L1 and groups them into batches.
///
/// The builder checks every appended block extends the last appended one. A built batch is
/// returned by [`BatchBuilder::build`] until [`BatchBuilder::advance`] is called, after which the
/// blocks it contains are dropped.
#[derive(Debug)]
pub struct BatchBuilder {
    /// The soft limit on the size of the transactions of a batch.
    max_batch_size: usize,
    /// The last appended block.
    last_appended: Option<BlockRef>,
    /// The appended blocks not yet submitted.
    pending: VecDeque<DerivationBlock>,
    /// The batch built from the head of `pending`.
    built: Option<BuiltBatch>,
}

impl BatchBuilder {
    /// Returns a new [`BatchBuilder`].
    pub const fn new(max_batch_size: usize) -> Self {
        Self { max_batch_size, last_appended: None, pending: VecDeque::new(), built: None }
    }

    /// Returns the last appended block, or the anchor the builder was last reset to.
    pub const fn last_appended(&self) -> Option<BlockRef> {
        self.last_appended
    }

    /// Returns the number of pending blocks.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Appends the block to the pending blocks.
    pub fn append(&mut self, block: &L2Block) -> Result<(), BatchBuilderError> {
        let block_ref = block.block_ref;
        if let Some(last) = self.last_appended {
            if block_ref.number != last.number + 1 {
                return Err(BatchBuilderError::NonContiguousBlock {
                    expected: last.number + 1,
                    got: block_ref.number,
                })
            }
            if block_ref.parent_hash != last.hash {
                return Err(BatchBuilderError::L2ReorgDetected {
                    number: block_ref.number,
                    expected: last.hash,
                    got: block_ref.parent_hash,
                })
            }
        }

        self.pending.push_back(block.into());
        self.last_appended = Some(block_ref);
        Ok(())
    }

    /// Builds a batch from the pending blocks, or returns [`None`] if there are none.
    ///
    /// The batch always holds at least one block, then takes blocks while the total size of the
    /// transactions stays within the limit.
    pub fn build(&mut self) -> Result<Option<&BuiltBatch>, BatchBuilderError> {
        if self.built.is_none() && !self.pending.is_empty() {
            let mut size = 0;
            let mut blocks = Vec::new();
            for block in &self.pending {
                let block_size: usize = block.transactions.iter().map(|tx| tx.len()).sum();
                if !blocks.is_empty() && size + block_size > self.max_batch_size {
                    break
                }
                size += block_size;
                blocks.push(block.clone());
            }

            let payload = BatchPayload::new(blocks);
            let calldata = payload.to_calldata()?;
            self.built = Some(BuiltBatch { payload, calldata });
        }
        Ok(self.built.as_ref())
    }

    /// Drops the blocks of the last built batch.
    pub fn advance(&mut self) {
        if let Some(built) = self.built.take() {
            self.pending.drain(..built.len().min(self.pending.len()));
        }
    }

    /// Drops all the pending blocks and anchors the builder at the provided block.
    pub fn reset(&mut self, anchor: BlockRef) {
        self.pending.clear();
        self.built = None;
        self.last_appended = Some(anchor);
    }
}
