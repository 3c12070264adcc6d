use crate::{DerivationPipelineMetrics, PipelineError};

use rollup_codec::{BatchPayload, CodecError};
use rollup_engine::ExecutionBackend;
use rollup_l1::appendTxBatchCall;
use rollup_node_primitives::{BlockInfo, L2BlockRef};
use rollup_node_providers::{L2Dialer, L2Provider};

/// Builds the L2 blocks carried by the batches appended to the sequencer inbox.
#[derive(Debug)]
pub struct PayloadBuilder<B, D: L2Dialer> {
    backend: B,
    dialer: D,
    l2: Option<D::Provider>,
    metrics: DerivationPipelineMetrics,
}

impl<B, D> PayloadBuilder<B, D>
where
    B: ExecutionBackend,
    D: L2Dialer,
{
    /// Returns a new instance of the [`PayloadBuilder`]. The L2 client is dialed on first use.
    pub fn new(backend: B, dialer: D) -> Self {
        Self { backend, dialer, l2: None, metrics: DerivationPipelineMetrics::default() }
    }

    /// Builds the blocks of the batch above the current L2 head, in order, and returns the last
    /// block of the batch with the L1 block as its origin.
    pub async fn build(
        &mut self,
        l1_block: BlockInfo,
        call: &appendTxBatchCall,
    ) -> Result<L2BlockRef, PipelineError> {
        let payload = BatchPayload::decode(call).map_err(CodecError::from)?;
        let l2 = match &mut self.l2 {
            Some(l2) => l2,
            slot @ None => {
                let l2 = self.dialer.dial().await?;
                tracing::debug!(target: "rollup::derivation", "dialed L2 client");
                slot.insert(l2)
            }
        };

        let head = l2.block_number().await?;
        let mut last = None;
        for block in payload.blocks.iter().filter(|b| b.number > head) {
            let built = self.backend.build_payload(block).await?;
            tracing::debug!(target: "rollup::derivation", l2_block = %built, %l1_block, "built L2 block");
            self.metrics.derived_blocks.increment(1);
            last = Some(L2BlockRef::new(built, l1_block, block.timestamp));
        }

        let last = match last {
            Some(last) => last,
            None => {
                // all the blocks of the batch were already built.
                let number = payload.last_block_number().unwrap_or_default();
                tracing::debug!(target: "rollup::derivation", number, head, "skipping replayed batch");
                let block =
                    l2.block_by_number(number).await?.ok_or(PipelineError::MissingL2Block(number))?;
                L2BlockRef::new(block.block_ref, l1_block, block.timestamp)
            }
        };

        Ok(last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Bytes;
    use rollup_engine::test_utils::MockExecutionBackend;
    use rollup_node_primitives::DerivationBlock;
    use rollup_node_providers::test_utils::MockL2Provider;

    fn batch(numbers: std::ops::RangeInclusive<u64>) -> appendTxBatchCall {
        let blocks = numbers
            .map(|n| DerivationBlock::new(n, 1000 + n, vec![Bytes::from(vec![n as u8; 3])]))
            .collect();
        BatchPayload::new(blocks).encode().unwrap()
    }

    fn l1_block() -> BlockInfo {
        BlockInfo::new(100, Default::default())
    }

    #[tokio::test]
    async fn test_builds_only_blocks_above_head() -> eyre::Result<()> {
        let l2 = MockL2Provider::new();
        let backend = MockExecutionBackend::new(l2.clone());
        let mut builder = PayloadBuilder::new(backend.clone(), l2.clone());

        builder.build(l1_block(), &batch(1..=2)).await?;
        let last = builder.build(l1_block(), &batch(1..=4)).await?;

        let built: Vec<_> = backend.built().iter().map(|b| b.number).collect();
        assert_eq!(built, vec![1, 2, 3, 4]);
        assert_eq!(last, L2BlockRef::new(l2.head(), l1_block(), 1004));
        Ok(())
    }

    #[tokio::test]
    async fn test_replayed_batch_points_to_existing_block() -> eyre::Result<()> {
        let l2 = MockL2Provider::new();
        let backend = MockExecutionBackend::new(l2.clone());
        let mut builder = PayloadBuilder::new(backend.clone(), l2.clone());

        builder.build(l1_block(), &batch(1..=3)).await?;
        let last = builder.build(l1_block(), &batch(1..=2)).await?;

        assert_eq!(backend.built().len(), 3);
        assert_eq!(last.info(), l2.block(2).map(|b| b.block_ref.info()).unwrap_or_default());
        assert_eq!((last.l1_origin, last.timestamp), (l1_block(), 1002));
        Ok(())
    }

    #[tokio::test]
    async fn test_dial_failure_is_retryable() -> eyre::Result<()> {
        let l2 = MockL2Provider::new();
        l2.fail_dial(1);
        let backend = MockExecutionBackend::new(l2.clone());
        let mut builder = PayloadBuilder::new(backend.clone(), l2);

        let err = builder.build(l1_block(), &batch(1..=1)).await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Retryable);
        assert!(backend.built().is_empty());

        builder.build(l1_block(), &batch(1..=1)).await?;
        assert_eq!(backend.built().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_batch_is_fatal() {
        let l2 = MockL2Provider::new();
        let mut builder = PayloadBuilder::new(MockExecutionBackend::new(l2.clone()), l2);
        let mut call = batch(1..=2);
        call.txLengths.pop();

        let err = builder.build(l1_block(), &call).await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Fatal);
    }
}
