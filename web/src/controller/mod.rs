use serde::Serialize;
use utoipa::ToSchema;

pub(crate) mod demo_controller;
pub(crate) mod health_check_controller;
pub(crate) mod message_controller;
pub(crate) mod websocket_controller;

/// Body of the small JSON acknowledgements returned by the demo endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct MessageResponse {
    message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
