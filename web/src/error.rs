use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::*;

use ::sse::error::{Error as SseError, MessageErrorKind, SseErrorKind};

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error(SseError);

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.0)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{}", self.0)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self.0.error_kind {
            SseErrorKind::Message(message_error_kind) => {
                warn!("Rejecting publish request: {}", self.0);
                match message_error_kind {
                    MessageErrorKind::Empty | MessageErrorKind::InvalidUtf8 => {
                        (StatusCode::UNPROCESSABLE_ENTITY, "UNPROCESSABLE ENTITY").into_response()
                    }
                    MessageErrorKind::TooLarge { .. } => {
                        (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD TOO LARGE").into_response()
                    }
                }
            }
            // Per-subscriber failures are absorbed by the hub; reaching here is a bug.
            SseErrorKind::Subscriber(_) => {
                error!("Subscriber error escaped the hub: {}", self.0);
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR").into_response()
            }
        }
    }
}

impl<E> From<E> for Error
where
    E: Into<SseError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
