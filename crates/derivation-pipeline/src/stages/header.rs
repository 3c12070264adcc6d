use crate::{PipelineError, Stage};

use rollup_node_primitives::BlockInfo;
use rollup_node_providers::L1Provider;

/// The source stage of the pipeline: walks the L1 chain one header at a time, checking the
/// parent linkage of each header.
#[derive(Debug)]
pub struct L1HeaderRetrievalStage<P> {
    provider: P,
    current: BlockInfo,
}

impl<P: L1Provider> L1HeaderRetrievalStage<P> {
    /// Returns a new [`L1HeaderRetrievalStage`], which will return the child of `start` first.
    pub const fn new(provider: P, start: BlockInfo) -> Self {
        Self { provider, current: start }
    }

    /// Returns the last L1 block returned by the stage.
    pub const fn current(&self) -> BlockInfo {
        self.current
    }
}

#[async_trait::async_trait]
impl<P: L1Provider> Stage for L1HeaderRetrievalStage<P> {
    type Output = BlockInfo;

    async fn pull(&mut self) -> Result<BlockInfo, PipelineError> {
        let number = self.current.number + 1;
        let header = self
            .provider
            .header_by_number(number)
            .await?
            .ok_or(PipelineError::NoNewL1Header(number))?;

        if header.parent_hash != self.current.hash {
            return Err(PipelineError::L1Reorg {
                number,
                expected: self.current.hash,
                got: header.parent_hash,
            })
        }

        tracing::trace!(target: "rollup::derivation", %header, "retrieved L1 header");
        self.current = header.info();
        Ok(self.current)
    }

    async fn recover(&mut self, l1_block: BlockInfo) {
        tracing::debug!(target: "rollup::derivation", from = %self.current, to = %l1_block, "resetting L1 header retrieval");
        self.current = l1_block;
    }
}
