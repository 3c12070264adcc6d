use super::{command::BrokerCommand, SubscriptionId, SUBSCRIPTION_CHANNEL_SIZE};
use std::{
    fmt::Debug,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};

/// Handle to interact with a [`Broker`](super::Broker).
#[derive(Debug)]
pub struct BrokerHandle<T> {
    publisher: mpsc::Sender<T>,
    to_broker_tx: mpsc::UnboundedSender<BrokerCommand<T>>,
    stop_tx: Arc<watch::Sender<bool>>,
    next_id: Arc<AtomicU64>,
}

impl<T> Clone for BrokerHandle<T> {
    fn clone(&self) -> Self {
        Self {
            publisher: self.publisher.clone(),
            to_broker_tx: self.to_broker_tx.clone(),
            stop_tx: self.stop_tx.clone(),
            next_id: self.next_id.clone(),
        }
    }
}

impl<T: Send + 'static> BrokerHandle<T> {
    pub(super) fn new(
        publisher: mpsc::Sender<T>,
        to_broker_tx: mpsc::UnboundedSender<BrokerCommand<T>>,
        stop_tx: watch::Sender<bool>,
    ) -> Self {
        Self {
            publisher,
            to_broker_tx,
            stop_tx: Arc::new(stop_tx),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Returns the producer-facing end of the broker.
    pub fn publisher(&self) -> mpsc::Sender<T> {
        self.publisher.clone()
    }

    /// Subscribes to the broker. Messages published before the broker registers the
    /// subscription are not delivered.
    pub fn subscribe(&self) -> Subscription<T> {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_CHANNEL_SIZE);
        self.send_command(BrokerCommand::Subscribe { id, tx });
        Subscription { id, rx }
    }

    /// Removes the subscription. No message is delivered to it once the broker processed the
    /// command.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.send_command(BrokerCommand::Unsubscribe(id));
    }

    /// Subscribes to the broker and calls `callback` on each message in a dedicated task. The
    /// task unsubscribes and returns the error on the first failed call.
    pub fn subscribe_with_callback<F, E>(&self, mut callback: F) -> JoinHandle<Result<(), E>>
    where
        F: FnMut(T) -> Result<(), E> + Send + 'static,
        E: Debug + Send + 'static,
    {
        let mut subscription = self.subscribe();
        let handle = self.clone();
        tokio::spawn(async move {
            while let Some(message) = subscription.recv().await {
                if let Err(err) = callback(message) {
                    tracing::warn!(target: "rollup::watcher", ?err, id = ?subscription.id(), "callback failed, unsubscribing");
                    handle.unsubscribe(subscription.id());
                    return Err(err)
                }
            }
            Ok(())
        })
    }

    /// Stops the broker. Queued messages are not drained.
    pub fn stop(&self) {
        self.stop_tx.send_replace(true);
    }

    fn send_command(&self, command: BrokerCommand<T>) {
        if self.to_broker_tx.send(command).is_err() {
            tracing::debug!(target: "rollup::watcher", "broker is stopped, dropping command");
        }
    }
}

/// A subscription to a [`Broker`](super::Broker).
#[derive(Debug)]
pub struct Subscription<T> {
    id: SubscriptionId,
    rx: mpsc::Receiver<T>,
}

impl<T> Subscription<T> {
    /// Returns the id of the subscription.
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Receives the next message, or [`None`] once the broker dropped the subscription.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Receives the next message if one is available.
    pub fn try_recv(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}
