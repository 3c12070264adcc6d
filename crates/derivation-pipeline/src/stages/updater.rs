use crate::{DerivationPipelineMetrics, PipelineError, Stage};
use std::sync::Arc;

use rollup_engine::{ensure_valid, ExecutionBackend, ForkchoiceState};
use rollup_node_primitives::{BlockInfo, BlockRelation, BlockRelations, BlockTag};
use rollup_node_providers::{L2Dialer, L2Provider};
use rollup_node_watcher::L1State;

/// The terminal stage of the pipeline: folds the L1 to L2 block relations and derives the L2
/// safe and finalized blocks from the L1 ones.
///
/// The fork choice is only sent to the execution backend when the L1 safe or finalized block
/// moved and the derived L2 fork choice differs from the last applied one.
#[derive(Debug)]
pub struct L2ForkchoiceUpdater<S, B, D> {
    prev: S,
    backend: B,
    dialer: D,
    l1_state: Arc<L1State>,
    relations: BlockRelations,
    /// The L1 safe and finalized blocks of the last derivation.
    l1_forkchoice: Option<(BlockInfo, BlockInfo)>,
    /// The last applied fork choice.
    applied: Option<ForkchoiceState>,
    /// The head derived so far.
    head: BlockInfo,
    /// A derived fork choice not applied yet.
    pending: Option<ForkchoiceState>,
    metrics: DerivationPipelineMetrics,
}

impl<S, B, D> L2ForkchoiceUpdater<S, B, D>
where
    S: Stage<Output = Option<BlockRelation>>,
    B: ExecutionBackend,
    D: L2Dialer,
{
    /// Returns a new instance of the [`L2ForkchoiceUpdater`].
    pub fn new(prev: S, backend: B, dialer: D, l1_state: Arc<L1State>) -> Self {
        Self {
            prev,
            backend,
            dialer,
            l1_state,
            relations: BlockRelations::new(),
            l1_forkchoice: None,
            applied: None,
            head: BlockInfo::EMPTY,
            pending: None,
            metrics: DerivationPipelineMetrics::default(),
        }
    }

    /// Returns the block relations of the unfinalized window.
    pub const fn relations(&self) -> &BlockRelations {
        &self.relations
    }

    /// Returns the last fork choice applied to the execution backend.
    pub const fn forkchoice_state(&self) -> Option<ForkchoiceState> {
        self.applied
    }

    /// Returns a reference to the upstream stage.
    pub const fn prev(&self) -> &S {
        &self.prev
    }

    /// Reads the current fork choice of the L2 client. The finalized block defaults to the genesis
    /// and the safe block to the finalized one.
    async fn init(&mut self) -> Result<ForkchoiceState, PipelineError> {
        let l2 = self.dialer.dial().await?;
        let head = l2.header_by_tag(BlockTag::Latest).await?.ok_or(PipelineError::MissingL2Block(0))?;
        let finalized = match l2.header_by_tag(BlockTag::Finalized).await? {
            Some(finalized) => finalized,
            None => l2.header_by_number(0).await?.ok_or(PipelineError::MissingL2Block(0))?,
        };
        let safe = l2.header_by_tag(BlockTag::Safe).await?.unwrap_or(finalized);

        let fcs = ForkchoiceState::new(head.info(), safe.info(), finalized.info());
        tracing::info!(target: "rollup::derivation", head = %head.info(), safe = %safe.info(), finalized = %finalized.info(), "initialized L2 fork choice");
        self.head = head.info();
        self.applied = Some(fcs);
        Ok(fcs)
    }

    /// Derives the L2 fork choice from the current L1 fork choice.
    fn derive(&mut self, applied: ForkchoiceState) -> Option<ForkchoiceState> {
        let l1_forkchoice = (self.l1_state.safe(), self.l1_state.finalized());
        if self.l1_forkchoice == Some(l1_forkchoice) {
            return None
        }
        self.l1_forkchoice = Some(l1_forkchoice);
        let (l1_safe, l1_finalized) = l1_forkchoice;

        let mut fcs = applied;
        fcs.update_head_block_info(self.head);
        // replayed batches relate to blocks below the applied marks, which never move back.
        let safe = self.relations.mark_safe(l1_safe.number);
        if !safe.is_empty() && safe.number > fcs.safe_block_info().number {
            fcs.update_safe_block_info(safe);
        }
        let finalized = self.relations.mark_final(l1_finalized.number);
        if !finalized.is_empty() && finalized.number > fcs.finalized_block_info().number {
            fcs.update_finalized_block_info(finalized);
        }
        if fcs.finalized_block_info().number > fcs.safe_block_info().number {
            fcs.update_safe_block_info(*fcs.finalized_block_info());
        }

        (fcs != applied).then_some(fcs)
    }

    async fn apply(&mut self, fcs: ForkchoiceState) -> Result<ForkchoiceState, PipelineError> {
        let updated = self.backend.forkchoice_updated(fcs).await?;
        ensure_valid(&updated.payload_status.status)?;

        let mut applied = fcs;
        if let Some(hash) = updated.payload_status.latest_valid_hash {
            if hash != fcs.head_block_info().hash {
                tracing::debug!(target: "rollup::derivation", %hash, head = %fcs.head_block_info(), "head hash updated by the execution backend");
                applied.update_head_block_info(BlockInfo::new(fcs.head_block_info().number, hash));
                self.head = *applied.head_block_info();
            }
        }

        tracing::debug!(target: "rollup::derivation", head = %applied.head_block_info(), safe = %applied.safe_block_info(), finalized = %applied.finalized_block_info(), "applied L2 fork choice");
        self.metrics.forkchoice_updates.increment(1);
        self.metrics.l2_safe_number.set(applied.safe_block_info().number as f64);
        self.metrics.l2_finalized_number.set(applied.finalized_block_info().number as f64);
        self.pending = None;
        self.applied = Some(applied);
        Ok(applied)
    }
}

#[async_trait::async_trait]
impl<S, B, D> Stage for L2ForkchoiceUpdater<S, B, D>
where
    S: Stage<Output = Option<BlockRelation>>,
    B: ExecutionBackend,
    D: L2Dialer,
{
    type Output = ForkchoiceState;

    async fn pull(&mut self) -> Result<ForkchoiceState, PipelineError> {
        let applied = match self.applied {
            Some(applied) => applied,
            None => self.init().await?,
        };
        if let Some(pending) = self.pending {
            return self.apply(pending).await
        }

        if let Some(relation) = self.prev.pull().await? {
            if let Err(err) = self.relations.append(relation) {
                tracing::warn!(target: "rollup::derivation", ?err, "dropping out of order block relation");
            } else if relation.l2_block.number >= self.head.number {
                self.head = relation.l2_block;
            }
        }

        match self.derive(applied) {
            Some(fcs) => {
                self.pending = Some(fcs);
                self.apply(fcs).await
            }
            None => Ok(applied),
        }
    }

    async fn recover(&mut self, l1_block: BlockInfo) {
        self.relations.mark_reorged_out(l1_block.number);
        self.l1_forkchoice = None;
        self.pending = None;
        self.prev.recover(l1_block).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;
    use rollup_engine::test_utils::MockExecutionBackend;
    use rollup_node_providers::test_utils::MockL2Provider;
    use std::collections::VecDeque;

    /// Returns scripted relations.
    #[derive(Debug, Default)]
    struct Relations(VecDeque<Option<BlockRelation>>);

    #[async_trait::async_trait]
    impl Stage for Relations {
        type Output = Option<BlockRelation>;

        async fn pull(&mut self) -> Result<Option<BlockRelation>, PipelineError> {
            self.0.pop_front().ok_or(PipelineError::NoNewL1Header(0))
        }

        async fn recover(&mut self, _l1_block: BlockInfo) {}
    }

    fn l1(number: u64) -> BlockInfo {
        BlockInfo::new(number, B256::with_last_byte(number as u8))
    }

    struct Setup {
        updater: L2ForkchoiceUpdater<Relations, MockExecutionBackend, MockL2Provider>,
        backend: MockExecutionBackend,
        l2: MockL2Provider,
        l1_state: Arc<L1State>,
    }

    /// Builds 3 L2 blocks, derived at L1 blocks 10, 20 and 30, with L1 blocks without batches in
    /// between.
    fn setup() -> Setup {
        let l2 = MockL2Provider::new();
        let backend = MockExecutionBackend::new(l2.clone());
        let relation = |n: u64| {
            let block = l2.build_block(n, n, vec![]);
            Some(BlockRelation::new(l1(n * 10), block.info()))
        };
        let script = vec![None, relation(1), relation(2), None, relation(3), None];
        let l1_state = Arc::new(L1State::new());
        let updater = L2ForkchoiceUpdater::new(
            Relations(script.into()),
            backend.clone(),
            l2.clone(),
            l1_state.clone(),
        );
        Setup { updater, backend, l2, l1_state }
    }

    fn l1_numbers(relations: &BlockRelations) -> Vec<u64> {
        relations.as_slice().iter().map(|r| r.l1_block.number).collect()
    }

    #[tokio::test]
    async fn test_init_defaults_to_genesis() -> eyre::Result<()> {
        let Setup { mut updater, backend, l2, .. } = setup();

        let fcs = updater.pull().await?;
        let genesis = l2.block(0).map(|b| b.block_ref.info()).unwrap_or_default();
        assert_eq!(*fcs.head_block_info(), l2.head().info());
        assert_eq!(*fcs.finalized_block_info(), genesis);
        assert_eq!(*fcs.safe_block_info(), genesis);
        assert!(backend.forkchoice_updates().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_updates_only_on_change() -> eyre::Result<()> {
        let Setup { mut updater, backend, l2, l1_state } = setup();
        updater.pull().await?;
        updater.pull().await?;
        assert!(backend.forkchoice_updates().is_empty());

        l1_state.update_safe(l1(25))?;
        let fcs = updater.pull().await?;
        assert_eq!(backend.forkchoice_updates().len(), 1);
        assert_eq!(*fcs.safe_block_info(), l2.block(2).map(|b| b.block_ref.info()).unwrap_or_default());

        // the L1 safe block moved but maps to the same L2 block.
        l1_state.update_safe(l1(26))?;
        assert_eq!(updater.pull().await?, fcs);
        assert_eq!(backend.forkchoice_updates().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_finalization_drops_relations() -> eyre::Result<()> {
        let Setup { mut updater, backend, l2, l1_state } = setup();
        for _ in 0..5 {
            updater.pull().await?;
        }
        assert_eq!(l1_numbers(updater.relations()), vec![10, 20, 30]);

        l1_state.update_safe(l1(30))?;
        l1_state.update_finalized(l1(20))?;
        let fcs = updater.pull().await?;

        assert_eq!(l1_numbers(updater.relations()), vec![30]);
        assert_eq!(*fcs.safe_block_info(), l2.block(3).map(|b| b.block_ref.info()).unwrap_or_default());
        assert_eq!(
            *fcs.finalized_block_info(),
            l2.block(2).map(|b| b.block_ref.info()).unwrap_or_default()
        );
        assert_eq!(backend.forkchoice_updates(), vec![fcs]);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_forkchoice_is_retried_without_pulling() -> eyre::Result<()> {
        let Setup { mut updater, backend, l1_state, .. } = setup();
        updater.pull().await?;

        l1_state.update_safe(l1(10))?;
        backend.fail_next_forkchoice(1);
        assert!(updater.pull().await.is_err());
        assert_eq!(updater.relations().len(), 1);
        assert!(backend.forkchoice_updates().is_empty());

        let fcs = updater.pull().await?;
        assert_eq!(updater.relations().len(), 1);
        assert_eq!(fcs.safe_block_info().number, 1);
        assert_eq!(backend.forkchoice_updates(), vec![fcs]);
        Ok(())
    }

    #[tokio::test]
    async fn test_replayed_relation_does_not_move_marks_back() -> eyre::Result<()> {
        let Setup { mut updater, backend, l2, l1_state } = setup();
        l2.set_tag(BlockTag::Safe, 3);
        l2.set_tag(BlockTag::Finalized, 3);
        let init = updater.pull().await?;
        assert_eq!(init.finalized_block_info().number, 3);

        // the relation of L1 block 10 points at the already finalized L2 block 1.
        l1_state.update_safe(l1(10))?;
        l1_state.update_finalized(l1(10))?;
        let fcs = updater.pull().await?;

        assert_eq!(fcs, init);
        assert_eq!(updater.forkchoice_state(), Some(init));
        assert!(updater.relations().is_empty());
        assert!(backend.forkchoice_updates().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_head_follows_latest_valid_hash() -> eyre::Result<()> {
        let Setup { mut updater, backend, l2, l1_state } = setup();
        updater.pull().await?;

        let hash = B256::repeat_byte(0xaa);
        backend.set_latest_valid_hash(hash);
        l1_state.update_safe(l1(10))?;
        let fcs = updater.pull().await?;

        let head = BlockInfo::new(l2.head().number, hash);
        assert_eq!(*fcs.head_block_info(), head);
        assert_eq!(updater.head, head);
        assert_eq!(updater.forkchoice_state().map(|fcs| *fcs.head_block_info()), Some(head));
        // the backend received the head known before the update.
        assert_eq!(backend.forkchoice_updates().len(), 1);
        assert_eq!(*backend.forkchoice_updates()[0].head_block_info(), l2.head().info());
        Ok(())
    }

    #[tokio::test]
    async fn test_recover_discards_relations_past_rollback() -> eyre::Result<()> {
        let Setup { mut updater, .. } = setup();
        for _ in 0..5 {
            updater.pull().await?;
        }
        updater.recover(l1(15)).await;
        assert_eq!(l1_numbers(updater.relations()), vec![10]);
        Ok(())
    }
}
