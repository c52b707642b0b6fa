use crate::connection::{Delivery, SubscriberRegistry};
use crate::message::Message;
use crate::subscription::Subscription;
use log::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Queue length used when no capacity is configured.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Fan-out point between publishers and subscribers.
///
/// Every message handed to `publish` is enqueued once on each subscriber
/// registered at that moment. Subscribers that join later never see it.
pub struct Hub {
    registry: Arc<SubscriberRegistry>,
    queue_capacity: usize,
    // Set by `close_all`; later subscriptions end immediately.
    closed: AtomicBool,
}

impl Hub {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            registry: Arc::new(SubscriberRegistry::new()),
            queue_capacity: queue_capacity.max(1),
            closed: AtomicBool::new(false),
        }
    }

    /// Register a new subscriber and hand back its stream.
    ///
    /// Once `close_all` has run the returned stream is already ended.
    pub fn subscribe(&self) -> Subscription {
        let (subscriber_id, receiver) = self.registry.register(self.queue_capacity);

        // Checked after registering: a concurrent `close_all` either cleared
        // this entry already or set the flag before we read it.
        if self.closed.load(Ordering::SeqCst) {
            self.registry.unregister(&subscriber_id);
            debug!("Hub is closed, ending new SSE subscriber {subscriber_id}");
        } else {
            info!(
                "Registered new SSE subscriber {subscriber_id} ({} active)",
                self.registry.len()
            );
        }

        Subscription::new(subscriber_id, receiver, Arc::clone(&self.registry))
    }

    /// Enqueue `message` for every currently registered subscriber.
    ///
    /// Never waits on a subscriber. A full queue drops the message for that
    /// subscriber only (drop-new); see the returned `Delivery` for counts.
    pub fn publish(&self, message: Message) -> Delivery {
        let delivery = self.registry.broadcast(&message);
        debug!(
            "Published {} byte message: delivered={}, dropped={}, disconnected={}",
            message.len(),
            delivery.delivered,
            delivery.dropped,
            delivery.disconnected
        );
        delivery
    }

    /// Disconnects every subscriber. Their streams end once any queued
    /// messages have been drained. Used on server shutdown; the hub stays
    /// closed, so later subscribers get a stream that ends right away.
    pub fn close_all(&self) -> usize {
        self.closed.store(true, Ordering::SeqCst);
        let closed = self.registry.clear();
        info!("Closed {closed} SSE subscriber(s)");
        closed
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.len()
    }

    #[cfg(test)]
    fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}
