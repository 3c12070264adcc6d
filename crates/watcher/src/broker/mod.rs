//! A single producer, multiple consumers broker.

mod command;
use command::BrokerCommand;

mod handle;
pub use handle::{BrokerHandle, Subscription};

use crate::{BrokerError, SubscriptionError};
use tokio::sync::{
    mpsc::{self, error::TrySendError},
    oneshot, watch,
};

/// The capacity of each subscription channel.
pub const SUBSCRIPTION_CHANNEL_SIZE: usize = 8;

/// The identifier of a [`Subscription`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// The delivery policy of the [`Broker`] towards a subscriber with a full channel.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum BroadcastMode {
    /// Waits for the subscriber to make room before accepting the next message.
    #[default]
    Blocking,
    /// Drops the message for the subscriber.
    Dropping,
}

/// The broker delivers every published message to each of its subscribers, in publish order.
#[derive(Debug)]
pub struct Broker<T> {
    mode: BroadcastMode,
    publish_rx: mpsc::Receiver<T>,
    from_handle_rx: mpsc::UnboundedReceiver<BrokerCommand<T>>,
    stop_rx: watch::Receiver<bool>,
    subscribers: Vec<(SubscriptionId, mpsc::Sender<T>)>,
}

impl<T: Clone + Send + 'static> Broker<T> {
    /// Creates a new [`Broker`] and its [`BrokerHandle`]. `capacity` bounds the publish channel.
    pub fn new(capacity: usize, mode: BroadcastMode) -> (Self, BrokerHandle<T>) {
        let (publish_tx, publish_rx) = mpsc::channel(capacity);
        let (to_broker_tx, from_handle_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = watch::channel(false);
        let broker =
            Self { mode, publish_rx, from_handle_rx, stop_rx, subscribers: Vec::new() };
        (broker, BrokerHandle::new(publish_tx, to_broker_tx, stop_tx))
    }

    /// Runs the broker until it is stopped, all the handles are dropped or the `interrupt`
    /// channel reports an error of the subscription feeding it.
    pub async fn run(
        mut self,
        mut interrupt: oneshot::Receiver<SubscriptionError>,
    ) -> Result<(), BrokerError> {
        let mut interrupt_open = true;
        loop {
            tokio::select! {
                biased;

                _ = stopped(&mut self.stop_rx) => {
                    tracing::debug!(target: "rollup::watcher", "broker stopped");
                    return Ok(())
                }
                res = &mut interrupt, if interrupt_open => {
                    match res {
                        Ok(err) => return Err(err.into()),
                        Err(_) => interrupt_open = false,
                    }
                }
                Some(command) = self.from_handle_rx.recv() => self.handle_command(command),
                Some(message) = self.publish_rx.recv() => {
                    if self.broadcast(message).await {
                        return Ok(())
                    }
                }
                else => return Ok(()),
            }
        }
    }

    fn handle_command(&mut self, command: BrokerCommand<T>) {
        match command {
            BrokerCommand::Subscribe { id, tx } => self.subscribers.push((id, tx)),
            BrokerCommand::Unsubscribe(id) => self.subscribers.retain(|(sub, _)| *sub != id),
        }
    }

    /// Delivers the message to all the subscribers, removing the closed ones. Returns `true`
    /// if the broker was stopped while waiting on a subscriber.
    async fn broadcast(&mut self, message: T) -> bool {
        match self.mode {
            BroadcastMode::Blocking => {
                let mut closed = Vec::new();
                for (id, tx) in &self.subscribers {
                    tokio::select! {
                        biased;
                        _ = stopped(&mut self.stop_rx) => return true,
                        res = tx.send(message.clone()) => {
                            if res.is_err() {
                                closed.push(*id);
                            }
                        }
                    }
                }
                self.subscribers.retain(|(id, _)| !closed.contains(id));
            }
            BroadcastMode::Dropping => {
                self.subscribers.retain(|(id, tx)| match tx.try_send(message.clone()) {
                    Ok(()) => true,
                    Err(TrySendError::Full(_)) => {
                        tracing::warn!(target: "rollup::watcher", ?id, "subscriber is full, dropping message");
                        true
                    }
                    Err(TrySendError::Closed(_)) => false,
                });
            }
        }
        false
    }
}

/// Resolves once the broker is stopped or all the handles are dropped.
async fn stopped(stop_rx: &mut watch::Receiver<bool>) {
    let _ = stop_rx.wait_for(|stopped| *stopped).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollup_node_primitives::BlockTag;
    use rollup_node_providers::L1ProviderError;
    use std::time::Duration;

    const MESSAGES: u64 = 32;

    fn spawn_broker<T: Clone + Send + std::fmt::Debug + 'static>(
        mode: BroadcastMode,
    ) -> (
        BrokerHandle<T>,
        oneshot::Sender<SubscriptionError>,
        tokio::task::JoinHandle<Result<(), BrokerError>>,
    ) {
        let (broker, handle) = Broker::new(4, mode);
        let (interrupt_tx, interrupt_rx) = oneshot::channel();
        let task = tokio::spawn(broker.run(interrupt_rx));
        (handle, interrupt_tx, task)
    }

    #[tokio::test]
    async fn test_broker_fan_out_in_order() -> eyre::Result<()> {
        let (handle, _interrupt, _task) = spawn_broker::<u64>(BroadcastMode::Blocking);
        let mut first = handle.subscribe();
        let mut second = handle.subscribe();

        let publisher = handle.publisher();
        tokio::spawn(async move {
            for i in 0..MESSAGES {
                publisher.send(i).await.unwrap();
            }
        });

        for i in 0..MESSAGES {
            assert_eq!(first.recv().await, Some(i));
            assert_eq!(second.recv().await, Some(i));
        }

        // the unsubscribed channel is closed and receives nothing more.
        handle.unsubscribe(first.id());
        handle.publisher().send(MESSAGES).await?;
        assert_eq!(second.recv().await, Some(MESSAGES));
        assert_eq!(first.recv().await, None);

        Ok(())
    }

    #[tokio::test]
    async fn test_dropping_broadcast_skips_full_subscriber() -> eyre::Result<()> {
        let (handle, _interrupt, _task) = spawn_broker::<u64>(BroadcastMode::Dropping);
        let mut slow = handle.subscribe();
        let mut fast = handle.subscribe();

        let publisher = handle.publisher();
        for i in 0..MESSAGES {
            publisher.send(i).await?;
            assert_eq!(fast.recv().await, Some(i));
        }

        let mut received = Vec::new();
        while let Some(i) = slow.try_recv() {
            received.push(i);
        }
        assert_eq!(received, (0..SUBSCRIPTION_CHANNEL_SIZE as u64).collect::<Vec<_>>());

        Ok(())
    }

    #[tokio::test]
    async fn test_callback_error_unsubscribes() -> eyre::Result<()> {
        let (handle, _interrupt, _task) = spawn_broker::<u64>(BroadcastMode::Blocking);
        let mut witness = handle.subscribe();
        let callback = handle.subscribe_with_callback(|i| if i == 2 { Err(i) } else { Ok(()) });

        let publisher = handle.publisher();
        for i in 0..5 {
            publisher.send(i).await?;
            assert_eq!(witness.recv().await, Some(i));
        }

        assert_eq!(callback.await?, Err(2));
        Ok(())
    }

    #[tokio::test]
    async fn test_stop_and_interrupt() -> eyre::Result<()> {
        let (handle, _interrupt, task) = spawn_broker::<u64>(BroadcastMode::Blocking);
        let mut subscription = handle.subscribe();
        handle.stop();
        assert!(task.await?.is_ok());
        assert_eq!(subscription.recv().await, None);

        let (_handle, interrupt, task) = spawn_broker::<u64>(BroadcastMode::Blocking);
        interrupt
            .send(SubscriptionError::Provider {
                tag: BlockTag::Latest,
                source: L1ProviderError::Other("down"),
            })
            .unwrap();
        let res = tokio::time::timeout(Duration::from_secs(1), task).await??;
        assert!(matches!(res, Err(BrokerError::Subscription(_))));

        Ok(())
    }

    #[tokio::test]
    async fn test_stop_unblocks_slow_subscriber() -> eyre::Result<()> {
        let (handle, _interrupt, task) = spawn_broker::<u64>(BroadcastMode::Blocking);
        let _never_read = handle.subscribe();

        let publisher = handle.publisher();
        tokio::spawn(async move {
            for i in 0..MESSAGES {
                if publisher.send(i).await.is_err() {
                    break
                }
            }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        handle.stop();
        assert!(tokio::time::timeout(Duration::from_secs(1), task).await??.is_ok());

        Ok(())
    }
}
