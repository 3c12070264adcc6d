use super::SubscriptionId;
use tokio::sync::mpsc;

/// Commands that can be sent to the [`Broker`](super::Broker).
#[derive(Debug)]
pub(crate) enum BrokerCommand<T> {
    /// Registers a subscriber.
    Subscribe {
        /// The id of the subscription.
        id: SubscriptionId,
        /// The sender half of the subscription channel.
        tx: mpsc::Sender<T>,
    },
    /// Removes a subscriber.
    Unsubscribe(SubscriptionId),
}
