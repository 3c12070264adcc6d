use crate::{
    api::{self, ensure_valid},
    EngineError, EngineMetrics, ForkchoiceState, RollupPayloadAttributes,
};
use std::time::Instant;

use alloy_primitives::Address;
use alloy_provider::Provider;
use alloy_rpc_types_engine::ForkchoiceUpdated;
use parking_lot::Mutex;
use rollup_node_primitives::{BlockInfo, BlockRef, DerivationBlock};

/// The execution client the derived L2 blocks are built by.
#[async_trait::async_trait]
#[auto_impl::auto_impl(Arc, &)]
pub trait ExecutionBackend: Sync + Send {
    /// Applies the fork choice state.
    async fn forkchoice_updated(
        &self,
        fcs: ForkchoiceState,
    ) -> Result<ForkchoiceUpdated, EngineError>;

    /// Builds and imports the block on top of its parent, returning the new head.
    async fn build_payload(&self, block: &DerivationBlock) -> Result<BlockRef, EngineError>;
}

/// An [`ExecutionBackend`] implementation over the Engine API.
///
/// Blocks are built with `engine_forkchoiceUpdatedV1` carrying [`RollupPayloadAttributes`],
/// retrieved with `engine_getPayloadV1`, imported with `engine_newPayloadV1` and finally made
/// the head with a last fork choice update.
#[derive(Debug)]
pub struct RpcExecutionBackend<P> {
    provider: P,
    fee_recipient: Address,
    fcs: Mutex<ForkchoiceState>,
    metrics: EngineMetrics,
}

impl<P: Provider> RpcExecutionBackend<P> {
    /// Returns a new instance of the [`RpcExecutionBackend`].
    pub fn new(provider: P, fee_recipient: Address) -> Self {
        Self {
            provider,
            fee_recipient,
            fcs: Mutex::new(ForkchoiceState::default()),
            metrics: EngineMetrics::default(),
        }
    }
}

#[async_trait::async_trait]
impl<P: Provider> ExecutionBackend for RpcExecutionBackend<P> {
    async fn forkchoice_updated(
        &self,
        fcs: ForkchoiceState,
    ) -> Result<ForkchoiceUpdated, EngineError> {
        let updated = api::forkchoice_updated(&self.provider, fcs.get_alloy_fcs(), None).await?;
        if updated.payload_status.status.is_valid() {
            *self.fcs.lock() = fcs;
            self.metrics.forkchoice_updates.increment(1);
        }
        Ok(updated)
    }

    async fn build_payload(&self, block: &DerivationBlock) -> Result<BlockRef, EngineError> {
        let start = Instant::now();

        let parent_number = block.number.checked_sub(1).ok_or(EngineError::GenesisBuild)?;
        let parent = self
            .provider
            .get_block_by_number(parent_number.into())
            .await?
            .ok_or(EngineError::MissingParent(parent_number))?;

        let mut fcs = *self.fcs.lock();
        fcs.update_head_block_info(BlockInfo::new(parent_number, parent.header.hash));

        let attributes = RollupPayloadAttributes::new(
            block.timestamp,
            self.fee_recipient,
            block.transactions.clone(),
        );
        let updated =
            api::forkchoice_updated(&self.provider, fcs.get_alloy_fcs(), Some(attributes)).await?;
        ensure_valid(&updated.payload_status.status)?;
        let id = updated.payload_id.ok_or(EngineError::MissingPayloadId)?;

        let payload = api::get_payload(&self.provider, id).await?;
        if payload.block_number != block.number {
            return Err(EngineError::UnexpectedBlockNumber {
                expected: block.number,
                got: payload.block_number,
            })
        }
        let block_ref = BlockRef::new(payload.block_number, payload.block_hash, payload.parent_hash);

        let status = api::new_payload(&self.provider, payload).await?;
        ensure_valid(&status)?;

        fcs.update_head_block_info(block_ref.info());
        let updated = api::forkchoice_updated(&self.provider, fcs.get_alloy_fcs(), None).await?;
        ensure_valid(&updated.payload_status.status)?;
        *self.fcs.lock() = fcs;

        self.metrics.built_blocks.increment(1);
        self.metrics.build_payload_duration.record(start.elapsed().as_secs_f64());
        tracing::debug!(target: "rollup::engine", block = %block_ref, "built block");

        Ok(block_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;
    use alloy_provider::ProviderBuilder;
    use alloy_rpc_types_engine::PayloadStatusEnum;
    use alloy_transport::mock::Asserter;

    #[tokio::test]
    async fn test_forkchoice_updated_tracks_valid_state() -> eyre::Result<()> {
        let asserter = Asserter::new();
        let provider = ProviderBuilder::new().connect_mocked_client(asserter.clone());
        let backend = RpcExecutionBackend::new(provider, Address::ZERO);

        let fcs = ForkchoiceState::from_genesis(BlockInfo::new(0, B256::repeat_byte(1)));
        asserter.push_success(&ForkchoiceUpdated::from_status(PayloadStatusEnum::Valid));
        let updated = backend.forkchoice_updated(fcs).await?;
        assert!(updated.payload_status.status.is_valid());
        assert_eq!(*backend.fcs.lock(), fcs);

        // a syncing engine does not move the tracked state.
        let next = ForkchoiceState::from_genesis(BlockInfo::new(1, B256::repeat_byte(2)));
        asserter.push_success(&ForkchoiceUpdated::from_status(PayloadStatusEnum::Syncing));
        let updated = backend.forkchoice_updated(next).await?;
        assert!(updated.payload_status.status.is_syncing());
        assert_eq!(*backend.fcs.lock(), fcs);

        Ok(())
    }

    #[tokio::test]
    async fn test_build_genesis_fails() {
        let provider = ProviderBuilder::new().connect_mocked_client(Asserter::new());
        let backend = RpcExecutionBackend::new(provider, Address::ZERO);

        let genesis = DerivationBlock::new(0, 0, vec![]);
        assert!(matches!(backend.build_payload(&genesis).await, Err(EngineError::GenesisBuild)));
    }
}
