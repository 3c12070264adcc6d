//! The stage abstraction of the pipeline.
//!
//! Stages are pull based: pulling from a stage pulls at most one item from its upstream stage
//! when its own queue is empty.

use crate::PipelineError;
use rollup_node_primitives::BlockInfo;

/// A stage of the derivation pipeline.
#[async_trait::async_trait]
pub trait Stage: Send {
    /// The item returned by the stage.
    type Output: Send;

    /// Returns the next item of the stage.
    async fn pull(&mut self) -> Result<Self::Output, PipelineError>;

    /// Clears the state of the stage and its upstream stages, resuming after the provided L1
    /// block.
    async fn recover(&mut self, l1_block: BlockInfo);
}

/// The processing part of a [`ProcessingStage`].
#[async_trait::async_trait]
pub trait Processor: Send {
    /// The item consumed by the processor.
    type Input: Send + Sync;
    /// The item produced by the processor.
    type Output: Send;

    /// Ingests the input, queuing the outputs. A failed ingestion is retried with the same input,
    /// the processor is responsible for not reprocessing what it already committed.
    async fn ingest(&mut self, input: &Self::Input) -> Result<(), PipelineError>;

    /// Returns the next queued output.
    fn next(&mut self) -> Option<Self::Output>;

    /// Returns `true` if an output is queued.
    fn has_next(&self) -> bool;

    /// Clears the processor state.
    async fn recover(&mut self, l1_block: BlockInfo);
}

/// A [`Stage`] feeding the items of its upstream stage to a [`Processor`].
///
/// The item being ingested is kept until its ingestion succeeds, so a retried pull does not pull
/// the upstream stage again.
#[derive(Debug)]
pub struct ProcessingStage<S: Stage, P> {
    prev: S,
    processor: P,
    in_flight: Option<S::Output>,
}

impl<S, P> ProcessingStage<S, P>
where
    S: Stage,
    P: Processor<Input = S::Output>,
{
    /// Returns a new instance of the [`ProcessingStage`].
    pub const fn new(prev: S, processor: P) -> Self {
        Self { prev, processor, in_flight: None }
    }

    /// Returns a reference to the processor.
    pub const fn processor(&self) -> &P {
        &self.processor
    }

    /// Returns a reference to the upstream stage.
    pub const fn prev(&self) -> &S {
        &self.prev
    }
}

#[async_trait::async_trait]
impl<S, P> Stage for ProcessingStage<S, P>
where
    S: Stage,
    S::Output: Sync,
    P: Processor<Input = S::Output>,
{
    type Output = P::Output;

    async fn pull(&mut self) -> Result<Self::Output, PipelineError> {
        loop {
            if self.processor.has_next() {
                if let Some(output) = self.processor.next() {
                    return Ok(output)
                }
            }

            let input = match self.in_flight.take() {
                Some(input) => input,
                None => self.prev.pull().await?,
            };
            if let Err(err) = self.processor.ingest(&input).await {
                self.in_flight = Some(input);
                return Err(err)
            }
        }
    }

    async fn recover(&mut self, l1_block: BlockInfo) {
        self.in_flight = None;
        self.processor.recover(l1_block).await;
        self.prev.recover(l1_block).await;
    }
}
