use crate::{BroadcastMode, Broker, BrokerHandle, HeadPoller, SyncerError};
use std::{sync::Arc, time::Duration};

use rollup_node_primitives::{BlockRef, BlockTag};
use rollup_node_providers::L1Provider;
use tokio::{sync::oneshot, task::JoinSet};

/// The capacity of the publish channel of each broker.
const BROKER_CAPACITY: usize = 8;

/// The configuration of the [`EthSyncer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncerConfig {
    /// The polling interval of the latest header.
    pub slot_interval: Duration,
    /// The polling interval of the safe and finalized headers.
    pub epoch_interval: Duration,
    /// The timeout of each polling request.
    pub request_timeout: Duration,
}

impl Default for SyncerConfig {
    fn default() -> Self {
        Self {
            slot_interval: Duration::from_secs(12),
            epoch_interval: Duration::from_secs(384),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl SyncerConfig {
    const fn interval(&self, tag: BlockTag) -> Duration {
        match tag {
            BlockTag::Latest => self.slot_interval,
            BlockTag::Safe | BlockTag::Finalized => self.epoch_interval,
        }
    }
}

/// Consumes the L1 headers published by the [`EthSyncer`].
pub trait L1HeadHandler: Send + Sync + 'static {
    /// The error returned by the handler. An error stops the delivery of the tag.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Called on a new latest header.
    fn on_latest(&self, header: BlockRef) -> Result<(), Self::Error>;

    /// Called on a new safe header.
    fn on_safe(&self, header: BlockRef) -> Result<(), Self::Error>;

    /// Called on a new finalized header.
    fn on_finalized(&self, header: BlockRef) -> Result<(), Self::Error>;
}

impl<H: L1HeadHandler> L1HeadHandler for Arc<H> {
    type Error = H::Error;

    fn on_latest(&self, header: BlockRef) -> Result<(), Self::Error> {
        (**self).on_latest(header)
    }

    fn on_safe(&self, header: BlockRef) -> Result<(), Self::Error> {
        (**self).on_safe(header)
    }

    fn on_finalized(&self, header: BlockRef) -> Result<(), Self::Error> {
        (**self).on_finalized(header)
    }
}

/// Keeps a [`L1HeadHandler`] up to date with the latest, safe and finalized L1 headers.
///
/// Each tag runs its own polling subscription feeding a [`Broker`], the handler is called from
/// the broker's callback subscription. A failed subscription is not restarted: the failure is
/// returned by [`EthSyncer::next_error`].
#[derive(Debug)]
pub struct EthSyncer {
    config: SyncerConfig,
    handles: Vec<BrokerHandle<BlockRef>>,
    tasks: JoinSet<Result<(), SyncerError>>,
}

impl EthSyncer {
    /// Returns a new [`EthSyncer`].
    pub fn new(config: SyncerConfig) -> Self {
        Self { config, handles: Vec::new(), tasks: JoinSet::new() }
    }

    /// Starts polling the provider for each tag.
    pub fn start<P, H>(&mut self, provider: P, handler: H)
    where
        P: L1Provider + Clone + 'static,
        H: L1HeadHandler + Clone,
    {
        for tag in BlockTag::ALL {
            let (broker, handle) = Broker::new(BROKER_CAPACITY, BroadcastMode::Blocking);
            let (interrupt_tx, interrupt_rx) = oneshot::channel();

            let handler = handler.clone();
            let callback = handle.subscribe_with_callback(move |header| match tag {
                BlockTag::Latest => handler.on_latest(header),
                BlockTag::Safe => handler.on_safe(header),
                BlockTag::Finalized => handler.on_finalized(header),
            });
            self.tasks.spawn(async move {
                callback.await?.map_err(|err| SyncerError::Handler { tag, source: Box::new(err) })
            });

            self.tasks.spawn(async move {
                broker.run(interrupt_rx).await.map_err(|source| SyncerError::Broker { tag, source })
            });

            let poller = HeadPoller::new(
                provider.clone(),
                tag,
                self.config.interval(tag),
                self.config.request_timeout,
            );
            let publisher = handle.publisher();
            self.tasks.spawn(async move {
                poller.run(publisher, interrupt_tx).await;
                Ok(())
            });

            tracing::info!(target: "rollup::watcher", %tag, interval = ?self.config.interval(tag), "started L1 header subscription");
            self.handles.push(handle);
        }
    }

    /// Returns the first failure of the syncer tasks, or [`None`] once all the tasks completed.
    pub async fn next_error(&mut self) -> Option<SyncerError> {
        while let Some(res) = self.tasks.join_next().await {
            match res {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => return Some(err),
                Err(err) => return Some(err.into()),
            }
        }
        None
    }

    /// Stops all the brokers and waits for the tasks to exit.
    pub async fn stop(&mut self) {
        for handle in self.handles.drain(..) {
            handle.stop();
        }
        while let Some(res) = self.tasks.join_next().await {
            match res {
                Ok(Ok(())) => {}
                Ok(Err(err)) => tracing::debug!(target: "rollup::watcher", ?err, "syncer task failed"),
                Err(err) => tracing::debug!(target: "rollup::watcher", ?err, "syncer task aborted"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{L1State, L1StateError};
    use rollup_node_primitives::{BlockInfo, L1Block};
    use rollup_node_providers::test_utils::{chain, chain_from, MockL1Provider};

    fn config() -> SyncerConfig {
        SyncerConfig {
            slot_interval: Duration::from_millis(5),
            epoch_interval: Duration::from_millis(10),
            request_timeout: Duration::from_secs(1),
        }
    }

    fn blocks(headers: &[BlockRef]) -> Vec<L1Block> {
        headers.iter().map(|h| L1Block { block_ref: *h, transactions: vec![] }).collect()
    }

    async fn wait_for(state: &L1State, tag: BlockTag, block: BlockInfo) -> eyre::Result<()> {
        tokio::time::timeout(Duration::from_secs(5), async {
            while state.get(tag) != block {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_syncer_updates_state() -> eyre::Result<()> {
        let headers = chain(6);
        let l1 = MockL1Provider::new(blocks(&headers));
        l1.set_tag(BlockTag::Safe, 3);
        l1.set_tag(BlockTag::Finalized, 1);

        let state = Arc::new(L1State::new());
        let mut syncer = EthSyncer::new(config());
        syncer.start(l1.clone(), state.clone());

        wait_for(&state, BlockTag::Latest, headers[5].info()).await?;
        wait_for(&state, BlockTag::Safe, headers[3].info()).await?;
        wait_for(&state, BlockTag::Finalized, headers[1].info()).await?;

        l1.set_tag(BlockTag::Safe, 4);
        wait_for(&state, BlockTag::Safe, headers[4].info()).await?;

        syncer.stop().await;
        assert!(syncer.next_error().await.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_syncer_reports_polling_failure() -> eyre::Result<()> {
        let l1 = MockL1Provider::new(blocks(&chain(2)));
        l1.fail_next(1);

        let mut syncer = EthSyncer::new(config());
        syncer.start(l1, Arc::new(L1State::new()));

        let err = tokio::time::timeout(Duration::from_secs(5), syncer.next_error()).await?;
        assert!(matches!(err, Some(SyncerError::Broker { .. })));

        syncer.stop().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_syncer_reports_conflicting_finalized_block() -> eyre::Result<()> {
        let headers = chain(4);
        let l1 = MockL1Provider::new(blocks(&headers));
        l1.set_tag(BlockTag::Finalized, 2);

        let state = Arc::new(L1State::new());
        let mut syncer = EthSyncer::new(config());
        syncer.start(l1.clone(), state.clone());
        wait_for(&state, BlockTag::Finalized, headers[2].info()).await?;

        // replace the finalized block.
        l1.insert_blocks(blocks(&chain_from(&headers[1], 1)));

        let err = tokio::time::timeout(Duration::from_secs(5), syncer.next_error()).await?;
        match err {
            Some(SyncerError::Handler { tag, source }) => {
                assert_eq!(tag, BlockTag::Finalized);
                assert!(source.downcast_ref::<L1StateError>().is_some());
            }
            other => eyre::bail!("expected handler error, got {other:?}"),
        }

        syncer.stop().await;
        Ok(())
    }
}
