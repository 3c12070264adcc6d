use crate::{
    L1HeaderRetrievalStage, L1TxProcessor, L1TxRetriever, L2ForkchoiceUpdater, PayloadBuilder,
    ProcessingStage, RollupState,
};
use std::sync::Arc;

use rollup_engine::ExecutionBackend;
use rollup_l1::L1Contracts;
use rollup_node_primitives::BlockInfo;
use rollup_node_providers::{L1Provider, L2Dialer};
use rollup_node_watcher::L1State;

/// The derivation pipeline, from the L1 headers to the L2 fork choice.
pub type DerivationPipeline<L1, B, D> = L2ForkchoiceUpdater<
    ProcessingStage<
        ProcessingStage<L1HeaderRetrievalStage<L1>, L1TxRetriever<L1>>,
        L1TxProcessor<B, D>,
    >,
    B,
    D,
>;

/// The configuration of the [`DerivationPipeline`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineConfig {
    /// The L1 block the derivation starts after.
    pub start_l1_block: BlockInfo,
    /// The followed L1 contracts.
    pub contracts: L1Contracts,
}

/// Chains the stages of the [`DerivationPipeline`].
pub fn create_pipeline<L1, B, D>(
    config: PipelineConfig,
    l1: L1,
    backend: B,
    dialer: D,
    l1_state: Arc<L1State>,
) -> DerivationPipeline<L1, B, D>
where
    L1: L1Provider + Clone,
    B: ExecutionBackend + Clone,
    D: L2Dialer + Clone,
{
    let headers = L1HeaderRetrievalStage::new(l1.clone(), config.start_l1_block);
    let transactions =
        ProcessingStage::new(headers, L1TxRetriever::new(l1, config.contracts));
    let payload_builder = PayloadBuilder::new(backend.clone(), dialer.clone());
    let processor = L1TxProcessor::new(config.contracts, payload_builder, RollupState::default());
    let relations = ProcessingStage::new(transactions, processor);
    L2ForkchoiceUpdater::new(relations, backend, dialer, l1_state)
}
