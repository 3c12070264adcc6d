use crate::SubscriptionError;
use std::time::Duration;

use alloy_primitives::B256;
use rollup_node_primitives::{BlockRef, BlockTag};
use rollup_node_providers::L1Provider;
use tokio::{
    sync::{mpsc, oneshot},
    time::MissedTickBehavior,
};

/// Polls the L1 header for a tag and publishes it each time its hash changes.
#[derive(Debug, Clone)]
pub struct HeadPoller<P> {
    provider: P,
    tag: BlockTag,
    interval: Duration,
    request_timeout: Duration,
}

impl<P: L1Provider> HeadPoller<P> {
    /// Returns a new instance of [`HeadPoller`].
    pub const fn new(provider: P, tag: BlockTag, interval: Duration, request_timeout: Duration) -> Self {
        Self { provider, tag, interval, request_timeout }
    }

    /// Polls until the publisher is closed or a request fails. The first failure is reported on
    /// the `interrupt` channel.
    pub async fn run(
        self,
        publisher: mpsc::Sender<BlockRef>,
        interrupt: oneshot::Sender<SubscriptionError>,
    ) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_hash: Option<B256> = None;

        loop {
            tokio::select! {
                _ = publisher.closed() => {
                    tracing::debug!(target: "rollup::watcher", tag = %self.tag, "publisher closed, stopping polling");
                    return
                }
                _ = ticker.tick() => {}
            }

            let header = match tokio::time::timeout(
                self.request_timeout,
                self.provider.header_by_tag(self.tag),
            )
            .await
            {
                Ok(Ok(header)) => header,
                Ok(Err(source)) => {
                    let _ = interrupt.send(SubscriptionError::Provider { tag: self.tag, source });
                    return
                }
                Err(_) => {
                    let _ = interrupt.send(SubscriptionError::Timeout {
                        tag: self.tag,
                        timeout: self.request_timeout,
                    });
                    return
                }
            };

            let Some(header) = header else {
                tracing::trace!(target: "rollup::watcher", tag = %self.tag, "no header for tag");
                continue
            };
            if last_hash == Some(header.hash) {
                continue
            }
            last_hash = Some(header.hash);

            tracing::trace!(target: "rollup::watcher", tag = %self.tag, %header, "new header");
            if publisher.send(header).await.is_err() {
                return
            }
        }
    }
}
