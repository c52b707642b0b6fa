//! Server-Sent Events (SSE) broadcast hub.
//!
//! This crate keeps the set of connected SSE subscribers and fans every
//! published message out to all of them.
//!
//! # Architecture
//!
//! - **One bounded queue per subscriber**: each connection gets its own
//!   tokio `mpsc` channel. The registry keeps the sender, the connection's
//!   `Subscription` keeps the receiver.
//! - **Sharded registry**: subscribers live in a `DashMap`, so registration,
//!   removal and publish snapshots can run from any task or thread.
//! - **Non-blocking publish**: a publish copies the current set of senders
//!   and `try_send`s to each. A full queue drops the message for that
//!   subscriber only; nobody waits on a slow reader.
//! - **Ephemeral messages**: nothing is stored. A subscriber that connects
//!   after a publish never sees that message.
//! - **Drop-guard cleanup**: dropping a `Subscription` removes it from the
//!   registry, whether the client disconnected, errored or the server is
//!   shutting down.
//!
//! # Message Flow
//!
//! 1. Client opens `GET /sse`; the handler calls `Hub::subscribe`
//! 2. Client (or anyone) sends `POST /messages` with a raw text body
//! 3. Body is validated with `Message::from_body` and passed to `Hub::publish`
//! 4. Each subscriber's stream yields the message as `data: <payload>\n\n`
//! 5. Client disconnects, the response stream is dropped, the subscription
//!    leaves the registry
//!
//! # Example
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use sse::{Hub, Message};
//!
//! let hub = Hub::default();
//! let mut subscription = hub.subscribe();
//!
//! hub.publish(Message::from("hello"));
//!
//! let message = subscription.next().await.unwrap();
//! assert_eq!(message.payload(), "hello");
//! ```
//!
//! # Modules
//!
//! - `connection`: `SubscriberRegistry`, `SubscriberId` and `Delivery` counts
//! - `error`: error tree for invalid messages and per-subscriber failures
//! - `hub`: `Hub`, the publish/subscribe entry point
//! - `message`: `Message` payload and its SSE event encoding
//! - `subscription`: `Subscription`, the per-connection stream with drop cleanup

pub mod connection;
pub mod error;
pub mod hub;
pub mod message;
pub mod subscription;

pub use connection::{Delivery, SubscriberId};
pub use hub::Hub;
pub use message::Message;
pub use subscription::Subscription;
