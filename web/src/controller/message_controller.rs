use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use log::*;

use crate::{AppState, Error};
use ::sse::Message;

/// POST broadcast a message to every connected SSE client
///
/// Responds once the message has been queued for all current subscribers,
/// not once they have read it.
#[utoipa::path(
    post,
    path = "/messages",
    request_body(content = String, description = "Raw message payload", content_type = "text/plain"),
    responses(
        (status = 200, description = "Message queued for every connected subscriber"),
        (status = 413, description = "Payload Too Large"),
        (status = 422, description = "Empty or non UTF-8 payload"),
    )
)]
pub async fn publish(
    State(app_state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, Error> {
    let message = Message::from_body(&body, app_state.config.max_message_bytes)?;

    let delivery = app_state.hub.publish(message);
    debug!(
        "POST /messages queued for {} of {} subscriber(s)",
        delivery.delivered,
        delivery.targeted()
    );

    Ok(StatusCode::OK)
}
