use crate::{BatchBuilder, BatchBuilderError, BatcherConfig, BatcherError, BatcherMetrics};

use rollup_node_primitives::{BlockRef, BlockTag, ErrorKind};
use rollup_node_providers::{L2Provider, TxCandidate, TxManager};
use tokio::time::MissedTickBehavior;

/// Periodically posts the blocks of the L2 chain to the sequencer inbox.
///
/// Every tick appends the blocks produced since the last tick to the [`BatchBuilder`], then
/// submits batches until none is left. On an L2 reorg, the disseminator restarts from the
/// finalized L2 block.
#[derive(Debug)]
pub struct BatchDisseminator<P, T> {
    config: BatcherConfig,
    l2: P,
    tx_manager: T,
    builder: BatchBuilder,
    /// Set after a reset, until the blocks up to the L2 head are appended again.
    recovering: bool,
    metrics: BatcherMetrics,
}

impl<P, T> BatchDisseminator<P, T>
where
    P: L2Provider,
    T: TxManager,
{
    /// Returns a new [`BatchDisseminator`].
    pub fn new(config: BatcherConfig, l2: P, tx_manager: T) -> Self {
        Self {
            builder: BatchBuilder::new(config.max_batch_size),
            config,
            l2,
            tx_manager,
            recovering: false,
            metrics: BatcherMetrics::default(),
        }
    }

    /// Returns a reference to the batch builder.
    pub const fn builder(&self) -> &BatchBuilder {
        &self.builder
    }

    /// Runs the disseminator, ticking every submission interval. Returns on the first fatal
    /// error.
    pub async fn run(mut self) -> Result<(), BatcherError> {
        let mut interval = tokio::time::interval(self.config.submission_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            if let Err(err) = self.tick().await {
                match err.kind() {
                    ErrorKind::Fatal => {
                        tracing::error!(target: "rollup::batcher", ?err, "batcher failed");
                        return Err(err)
                    }
                    ErrorKind::Retryable | ErrorKind::Recoverable => {
                        tracing::warn!(target: "rollup::batcher", ?err, "batcher tick failed");
                    }
                }
            }
        }
    }

    /// Appends the new L2 blocks to the builder and submits the pending batches.
    pub async fn tick(&mut self) -> Result<(), BatcherError> {
        self.append_to_builder().await?;
        self.sequence_batches().await
    }

    async fn append_to_builder(&mut self) -> Result<(), BatcherError> {
        let head = self.l2.block_number().await?;
        let safe = self.l2.header_by_tag(BlockTag::Safe).await?;

        let last_appended = match self.builder.last_appended() {
            Some(last) => last,
            None => {
                let anchor = match safe {
                    Some(safe) => safe,
                    None => self.genesis().await?,
                };
                tracing::info!(target: "rollup::batcher", %anchor, "starting batcher");
                self.builder.reset(anchor);
                anchor
            }
        };

        if let Some(safe) = safe {
            if safe.number > last_appended.number && !self.recovering {
                return Err(BatcherError::UnexpectedSystemState {
                    safe: safe.number,
                    last_appended: last_appended.number,
                })
            }
        }

        for number in last_appended.number + 1..=head {
            let block =
                self.l2.block_by_number(number).await?.ok_or(BatcherError::MissingL2Block(number))?;

            if let Err(err) = self.builder.append(&block) {
                if let BatchBuilderError::L2ReorgDetected { number, expected, got } = &err {
                    tracing::warn!(target: "rollup::batcher", number, %expected, %got, "L2 reorg detected");
                    self.metrics.l2_reorgs.increment(1);
                    self.reset_to_finalized().await?;
                }
                return Err(err.into())
            }

            tracing::trace!(target: "rollup::batcher", block = %block.block_ref, "appended block");
            self.metrics.appended_blocks.increment(1);
        }

        self.recovering = false;
        Ok(())
    }

    async fn sequence_batches(&mut self) -> Result<(), BatcherError> {
        let to = self.config.inbox_address;
        loop {
            let Some(batch) = self.builder.build()? else { return Ok(()) };
            let candidate = TxCandidate { to, data: batch.calldata.clone() };
            let first = batch.payload.blocks.first().map(|b| b.number);
            let last = batch.payload.last_block_number();
            let size = batch.calldata.len();

            let receipt = self.tx_manager.send(candidate).await?;
            tracing::info!(
                target: "rollup::batcher",
                hash = %receipt.hash,
                l1_block = ?receipt.block_number,
                ?first,
                ?last,
                size,
                "submitted batch"
            );
            self.metrics.submitted_batches.increment(1);
            self.metrics.batch_size.record(size as f64);

            self.builder.advance();
        }
    }

    async fn reset_to_finalized(&mut self) -> Result<(), BatcherError> {
        let anchor = match self.l2.header_by_tag(BlockTag::Finalized).await? {
            Some(finalized) => finalized,
            None => self.genesis().await?,
        };
        tracing::info!(target: "rollup::batcher", %anchor, "resetting batcher to finalized block");
        self.builder.reset(anchor);
        self.recovering = true;
        Ok(())
    }

    async fn genesis(&self) -> Result<BlockRef, BatcherError> {
        self.l2.header_by_number(0).await?.ok_or(BatcherError::MissingL2Block(0))
    }
}
