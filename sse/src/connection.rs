use crate::error::{Error, SseErrorKind, SubscriberErrorKind};
use crate::message::Message;
use dashmap::DashMap;
use log::*;
use std::fmt;
use tokio::sync::mpsc::{self, error::TrySendError, Receiver, Sender};

/// Unique identifier for a subscriber (server-generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriberId(String);

impl SubscriberId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-publish outcome, summed over every subscriber in the snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Subscribers whose queue accepted the message.
    pub delivered: usize,
    /// Subscribers whose queue was full; the message was dropped for them.
    pub dropped: usize,
    /// Subscribers whose stream had already gone away.
    pub disconnected: usize,
}

impl Delivery {
    /// Number of subscribers that were registered when the publish started.
    pub fn targeted(&self) -> usize {
        self.delivered + self.dropped + self.disconnected
    }
}

/// Concurrent registry of subscriber queues keyed by `SubscriberId`.
///
/// The registry owns the sending half of each bounded queue; the matching
/// `Subscription` owns the receiving half.
pub struct SubscriberRegistry {
    subscribers: DashMap<SubscriberId, Sender<Message>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self {
            subscribers: DashMap::new(),
        }
    }

    /// Register a new subscriber with a queue of `capacity` messages - O(1)
    pub fn register(&self, capacity: usize) -> (SubscriberId, Receiver<Message>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let subscriber_id = SubscriberId::new();

        self.subscribers.insert(subscriber_id.clone(), sender);

        (subscriber_id, receiver)
    }

    /// Unregister a subscriber - O(1). Returns `false` if it was already gone.
    pub fn unregister(&self, subscriber_id: &SubscriberId) -> bool {
        self.subscribers.remove(subscriber_id).is_some()
    }

    /// Drops every registered sender, ending all open subscription streams.
    /// Returns how many subscribers were removed.
    pub fn clear(&self) -> usize {
        let removed = self.subscribers.len();
        self.subscribers.clear();
        removed
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, subscriber_id: &SubscriberId) -> bool {
        self.subscribers.contains_key(subscriber_id)
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Copies out the sending half of every registered queue.
    ///
    /// Shard locks are held only while copying, so enqueueing afterwards never
    /// blocks `register`/`unregister`.
    fn snapshot(&self) -> Vec<(SubscriberId, Sender<Message>)> {
        self.subscribers
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Non-blocking enqueue onto one subscriber's queue - O(1)
    fn enqueue(sender: &Sender<Message>, message: &Message) -> Result<(), Error> {
        sender.try_send(message.clone()).map_err(|e| match e {
            TrySendError::Full(_) => Error::subscriber(SubscriberErrorKind::OverflowDropped),
            TrySendError::Closed(_) => Error::subscriber(SubscriberErrorKind::ConnectionLost),
        })
    }

    /// Broadcast a message to every subscriber registered right now - O(n)
    ///
    /// Failures are isolated per subscriber and only show up in the returned
    /// `Delivery` counts.
    pub fn broadcast(&self, message: &Message) -> Delivery {
        let mut delivery = Delivery::default();

        for (subscriber_id, sender) in self.snapshot() {
            match Self::enqueue(&sender, message) {
                Ok(()) => delivery.delivered += 1,
                Err(e) => match e.error_kind {
                    SseErrorKind::Subscriber(SubscriberErrorKind::OverflowDropped) => {
                        warn!("Dropping message for subscriber {subscriber_id}: {e}");
                        delivery.dropped += 1;
                    }
                    _ => {
                        debug!("Skipping subscriber {subscriber_id}: {e}");
                        delivery.disconnected += 1;
                    }
                },
            }
        }

        delivery
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}
