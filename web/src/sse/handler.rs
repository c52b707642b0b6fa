use crate::AppState;
use async_stream::stream;
use axum::extract::State;
use axum::http::header;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use futures::StreamExt;
use log::*;
use std::convert::Infallible;
use std::time::Duration;

/// GET open a long-lived Server-Sent Events stream
#[utoipa::path(
    get,
    path = "/sse",
    responses(
        (status = 200, description = "Event stream; each broadcast arrives as `data: <payload>`", content_type = "text/event-stream", body = String),
    )
)]
pub(crate) async fn sse_handler(State(app_state): State<AppState>) -> impl IntoResponse {
    // Registered now, so anything published after this handler returns is
    // already queued for the client even before the body is first polled.
    let mut subscription = app_state.hub.subscribe();
    debug!("Establishing SSE connection for subscriber {}", subscription.id());

    // Dropping this stream (client went away) drops the subscription, which
    // removes it from the hub.
    let stream = stream! {
        while let Some(message) = subscription.next().await {
            yield Ok::<Event, Infallible>(message.to_event());
        }
    };

    let keep_alive =
        KeepAlive::new().interval(Duration::from_secs(app_state.config.sse_keep_alive_secs));

    (
        [
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        Sse::new(stream).keep_alive(keep_alive),
    )
}
