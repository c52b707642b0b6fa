//! SSE HTTP handler for the web layer.
//!
//! This module contains only the Axum handler for the `/sse` endpoint.
//! The broadcast hub itself (registry, subscriptions, messages) lives in the
//! `sse` crate so it can be exercised without HTTP.

pub mod handler;
