use crate::{DerivationPipelineMetrics, ErrorKind, PipelineError, Stage};
use std::time::Duration;

use rollup_node_primitives::BlockTag;
use rollup_node_providers::L1Provider;

/// The retry policy of a derivation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// The maximum number of attempts of a step.
    pub num_attempts: usize,
    /// The delay after the first failed attempt.
    pub initial_delay: Duration,
    /// Whether the delay doubles after each failed attempt.
    pub exponential_backoff: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { num_attempts: 10, initial_delay: Duration::from_millis(100), exponential_backoff: true }
    }
}

impl RetryPolicy {
    /// Creates a new [`RetryPolicy`] with the specified parameters.
    pub const fn new(num_attempts: usize, initial_delay: Duration, exponential_backoff: bool) -> Self {
        Self { num_attempts, initial_delay, exponential_backoff }
    }

    /// Returns the delay after the failed attempt, starting at 0.
    pub fn delay(&self, attempt: usize) -> Duration {
        if self.exponential_backoff {
            self.initial_delay.saturating_mul(2u32.saturating_pow(attempt as u32))
        } else {
            self.initial_delay
        }
    }
}

/// The configuration of the [`Driver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    /// The retry policy of each step.
    pub retry: RetryPolicy,
    /// The wait between two steps when the pipeline is caught up with the L1.
    pub step_interval: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self { retry: RetryPolicy::default(), step_interval: Duration::from_secs(1) }
    }
}

/// The outcome of a successful [`Driver::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome<T> {
    /// The pipeline returned an item.
    Progress(T),
    /// The pipeline has no new L1 block to process.
    Idle,
}

/// Drives the terminal stage of the pipeline, retrying transient failures and recovering from
/// L1 reorgs.
#[derive(Debug)]
pub struct Driver<S, P> {
    pipeline: S,
    l1: P,
    config: DriverConfig,
    metrics: DerivationPipelineMetrics,
}

impl<S, P> Driver<S, P>
where
    S: Stage,
    P: L1Provider,
{
    /// Returns a new instance of the [`Driver`].
    pub fn new(pipeline: S, l1: P, config: DriverConfig) -> Self {
        Self { pipeline, l1, config, metrics: DerivationPipelineMetrics::default() }
    }

    /// Returns a reference to the pipeline.
    pub const fn pipeline(&self) -> &S {
        &self.pipeline
    }

    /// Consumes the driver and returns the pipeline.
    pub fn into_pipeline(self) -> S {
        self.pipeline
    }

    /// Steps the pipeline until it fails with a fatal error.
    pub async fn run(&mut self) -> Result<(), PipelineError> {
        loop {
            match self.step().await? {
                StepOutcome::Progress(_) => tokio::task::yield_now().await,
                StepOutcome::Idle => tokio::time::sleep(self.config.step_interval).await,
            }
        }
    }

    /// Pulls one item from the pipeline.
    ///
    /// Retryable errors are retried after the policy delay, an L1 reorg rolls the pipeline back
    /// to the L1 safe block before retrying. Fatal errors and exhausted attempts are returned.
    pub async fn step(&mut self) -> Result<StepOutcome<S::Output>, PipelineError> {
        let attempts = self.config.retry.num_attempts.max(1);
        let mut attempt = 0;
        loop {
            let err = match self.pipeline.pull().await {
                Ok(output) => return Ok(StepOutcome::Progress(output)),
                Err(err) if err.is_idle() => return Ok(StepOutcome::Idle),
                Err(err) => err,
            };

            match err.kind() {
                ErrorKind::Retryable => {
                    tracing::warn!(target: "rollup::derivation", ?err, attempt, "derivation step failed, retrying");
                    self.metrics.retries.increment(1);
                }
                ErrorKind::Recoverable => {
                    tracing::warn!(target: "rollup::derivation", ?err, "L1 reorg detected, recovering");
                    self.recover().await;
                }
                ErrorKind::Fatal => {
                    tracing::error!(target: "rollup::derivation", ?err, "fatal derivation error");
                    return Err(err)
                }
            }

            attempt += 1;
            if attempt >= attempts {
                return Err(PipelineError::AttemptsExhausted { attempts, source: Box::new(err) })
            }
            tokio::time::sleep(self.config.retry.delay(attempt - 1)).await;
        }
    }

    /// Rolls the pipeline back to the L1 safe block.
    async fn recover(&mut self) {
        let safe = match self.l1.header_by_tag(BlockTag::Safe).await {
            Ok(Some(safe)) => safe.info(),
            Ok(None) => {
                tracing::warn!(target: "rollup::derivation", err = ?PipelineError::MissingL1SafeBlock, "skipping recovery");
                return
            }
            Err(err) => {
                tracing::warn!(target: "rollup::derivation", ?err, "failed to fetch the L1 safe block, skipping recovery");
                return
            }
        };

        tracing::info!(target: "rollup::derivation", %safe, "recovering pipeline");
        self.pipeline.recover(safe).await;
        self.metrics.recoveries.increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;
    use rollup_engine::EngineError;
    use rollup_l1::L1CallError;
    use rollup_node_primitives::{BlockInfo, BlockRef, L1Block};
    use rollup_node_providers::test_utils::{chain, MockL1Provider};
    use std::collections::VecDeque;

    /// A stage returning scripted results.
    #[derive(Debug, Default)]
    struct Scripted {
        results: VecDeque<Result<u64, PipelineError>>,
        pulls: usize,
        recovered: Vec<BlockInfo>,
    }

    impl Scripted {
        fn new(results: impl IntoIterator<Item = Result<u64, PipelineError>>) -> Self {
            Self { results: results.into_iter().collect(), ..Default::default() }
        }
    }

    #[async_trait::async_trait]
    impl Stage for Scripted {
        type Output = u64;

        async fn pull(&mut self) -> Result<u64, PipelineError> {
            self.pulls += 1;
            self.results.pop_front().unwrap_or(Err(PipelineError::NoNewL1Header(0)))
        }

        async fn recover(&mut self, l1_block: BlockInfo) {
            self.recovered.push(l1_block);
        }
    }

    fn l1() -> (MockL1Provider, Vec<BlockRef>) {
        let headers = chain(4);
        let l1 = MockL1Provider::new(
            headers.iter().map(|h| L1Block { block_ref: *h, transactions: vec![] }),
        );
        (l1, headers)
    }

    fn config(num_attempts: usize) -> DriverConfig {
        DriverConfig {
            retry: RetryPolicy::new(num_attempts, Duration::from_millis(10), true),
            step_interval: Duration::from_millis(10),
        }
    }

    fn reorg() -> PipelineError {
        PipelineError::L1Reorg { number: 3, expected: B256::ZERO, got: B256::ZERO }
    }

    #[test]
    fn test_retry_delay() {
        let policy = RetryPolicy::new(5, Duration::from_millis(10), true);
        assert_eq!(policy.delay(0), Duration::from_millis(10));
        assert_eq!(policy.delay(3), Duration::from_millis(80));

        let policy = RetryPolicy::new(5, Duration::from_millis(10), false);
        assert_eq!(policy.delay(3), Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_step_retries_retryable_errors() -> eyre::Result<()> {
        let stage = Scripted::new([Err(EngineError::Syncing.into()), Err(EngineError::Syncing.into()), Ok(7)]);
        let mut driver = Driver::new(stage, l1().0, config(3));

        assert_eq!(driver.step().await?, StepOutcome::Progress(7));
        assert_eq!(driver.pipeline().pulls, 3);
        assert_eq!(driver.step().await?, StepOutcome::Idle);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_step_exhausts_attempts() {
        let stage = Scripted::new((0..3).map(|_| Err(EngineError::Syncing.into())));
        let mut driver = Driver::new(stage, l1().0, config(2));

        let err = driver.step().await.unwrap_err();
        assert!(matches!(err, PipelineError::AttemptsExhausted { attempts: 2, .. }));
        assert_eq!(err.kind(), ErrorKind::Fatal);
        assert_eq!(driver.pipeline().pulls, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_step_returns_fatal_errors() {
        let stage = Scripted::new([Err(L1CallError::MissingRecipient(B256::ZERO).into()), Ok(1)]);
        let mut driver = Driver::new(stage, l1().0, config(5));

        assert!(matches!(driver.step().await, Err(PipelineError::L1Call(_))));
        assert_eq!(driver.pipeline().pulls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_step_recovers_to_l1_safe_block() -> eyre::Result<()> {
        let (l1, headers) = l1();
        l1.set_tag(BlockTag::Safe, 2);
        let mut driver = Driver::new(Scripted::new([Err(reorg()), Ok(1)]), l1, config(3));

        assert_eq!(driver.step().await?, StepOutcome::Progress(1));
        assert_eq!(driver.pipeline().recovered, vec![headers[2].info()]);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_safe_block_skips_recovery() -> eyre::Result<()> {
        let mut driver = Driver::new(Scripted::new([Err(reorg()), Ok(1)]), l1().0, config(3));

        assert_eq!(driver.step().await?, StepOutcome::Progress(1));
        assert!(driver.pipeline().recovered.is_empty());
        Ok(())
    }
}
