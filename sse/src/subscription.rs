use crate::connection::{SubscriberId, SubscriberRegistry};
use crate::message::Message;
use futures::Stream;
use log::*;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc::Receiver;

/// The receiving end of one subscriber's queue.
///
/// Yields every message enqueued for this subscriber, in order, until it is
/// cancelled. Dropping a `Subscription` cancels it, so the subscriber leaves
/// the registry on every exit path of whatever is consuming the stream.
pub struct Subscription {
    id: SubscriberId,
    receiver: Receiver<Message>,
    registry: Arc<SubscriberRegistry>,
    cancelled: bool,
}

impl Subscription {
    pub(crate) fn new(
        id: SubscriberId,
        receiver: Receiver<Message>,
        registry: Arc<SubscriberRegistry>,
    ) -> Self {
        Self {
            id,
            receiver,
            registry,
            cancelled: false,
        }
    }

    pub fn id(&self) -> &SubscriberId {
        &self.id
    }

    #[cfg(test)]
    fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Removes this subscriber from the registry and closes its queue.
    ///
    /// Safe to call more than once; only the first call has any effect.
    /// Messages still sitting in the queue are discarded.
    pub fn cancel(&mut self) {
        if self.cancelled {
            return;
        }
        self.cancelled = true;

        if self.registry.unregister(&self.id) {
            info!("Unregistered SSE subscriber {}", self.id);
        }
        self.receiver.close();
    }

    /// Waits for the next message. Returns `None` once cancelled.
    #[cfg(test)]
    async fn recv(&mut self) -> Option<Message> {
        if self.cancelled {
            return None;
        }
        self.receiver.recv().await
    }
}

impl Stream for Subscription {
    type Item = Message;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.cancelled {
            return Poll::Ready(None);
        }
        this.receiver.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}
