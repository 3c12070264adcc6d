use crate::{EngineError, ExecutionBackend, ForkchoiceState};
use std::sync::Arc;

use alloy_primitives::B256;
use alloy_rpc_types_engine::{ForkchoiceUpdated, PayloadStatus, PayloadStatusEnum};
use parking_lot::Mutex;
use rollup_node_primitives::{BlockRef, BlockTag, DerivationBlock};
use rollup_node_providers::test_utils::MockL2Provider;

#[derive(Debug, Default)]
struct MockExecutionState {
    built: Vec<DerivationBlock>,
    forkchoice_updates: Vec<ForkchoiceState>,
    build_failures: usize,
    forkchoice_failures: usize,
    latest_valid_hash: Option<B256>,
}

/// An [`ExecutionBackend`] building blocks on a [`MockL2Provider`] and recording the calls.
#[derive(Debug, Clone)]
pub struct MockExecutionBackend {
    l2: MockL2Provider,
    state: Arc<Mutex<MockExecutionState>>,
}

impl MockExecutionBackend {
    /// Returns a new [`MockExecutionBackend`] building on the provided chain.
    pub fn new(l2: MockL2Provider) -> Self {
        Self { l2, state: Default::default() }
    }

    /// Returns the blocks built so far.
    pub fn built(&self) -> Vec<DerivationBlock> {
        self.state.lock().built.clone()
    }

    /// Returns the fork choice states applied so far.
    pub fn forkchoice_updates(&self) -> Vec<ForkchoiceState> {
        self.state.lock().forkchoice_updates.clone()
    }

    /// Fails the next `count` block builds.
    pub fn fail_next_build(&self, count: usize) {
        self.state.lock().build_failures = count;
    }

    /// Fails the next `count` fork choice updates.
    pub fn fail_next_forkchoice(&self, count: usize) {
        self.state.lock().forkchoice_failures = count;
    }

    /// Returns the provided hash as the latest valid hash of the fork choice updates, instead of
    /// the head hash.
    pub fn set_latest_valid_hash(&self, hash: B256) {
        self.state.lock().latest_valid_hash = Some(hash);
    }
}

#[async_trait::async_trait]
impl ExecutionBackend for MockExecutionBackend {
    async fn forkchoice_updated(
        &self,
        fcs: ForkchoiceState,
    ) -> Result<ForkchoiceUpdated, EngineError> {
        let latest_valid_hash = {
            let mut state = self.state.lock();
            if state.forkchoice_failures > 0 {
                state.forkchoice_failures -= 1;
                return Err(EngineError::Syncing)
            }
            state.forkchoice_updates.push(fcs);
            state.latest_valid_hash.unwrap_or(fcs.head_block_info().hash)
        };

        self.l2.set_tag(BlockTag::Safe, fcs.safe_block_info().number);
        self.l2.set_tag(BlockTag::Finalized, fcs.finalized_block_info().number);

        Ok(ForkchoiceUpdated {
            payload_status: PayloadStatus {
                status: PayloadStatusEnum::Valid,
                latest_valid_hash: Some(latest_valid_hash),
            },
            payload_id: None,
        })
    }

    async fn build_payload(&self, block: &DerivationBlock) -> Result<BlockRef, EngineError> {
        {
            let mut state = self.state.lock();
            if state.build_failures > 0 {
                state.build_failures -= 1;
                return Err(EngineError::Other("mock build failure"))
            }
        }

        let head = self.l2.head();
        if block.number != head.number + 1 {
            return Err(EngineError::UnexpectedBlockNumber {
                expected: head.number + 1,
                got: block.number,
            })
        }

        self.state.lock().built.push(block.clone());
        Ok(self.l2.build_block(block.number, block.timestamp, block.transactions.clone()))
    }
}
