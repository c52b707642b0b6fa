//! Error types for the `sse` layer.
use std::error::Error as StdError;
use std::fmt;

/// Top-level error type for the broadcast hub.
///
/// Follows the same shape as the other layers: a `source` holding the
/// underlying cause (if any) and an `error_kind` tree describing what went
/// wrong. The `web` layer translates `error_kind` into HTTP status codes.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: SseErrorKind,
}

/// Major categories of errors that can occur in the `sse` layer.
#[derive(Debug, PartialEq)]
pub enum SseErrorKind {
    /// A failure scoped to a single subscriber. These never escape `publish`.
    Subscriber(SubscriberErrorKind),
    /// A publish body that cannot be turned into a `Message`.
    Message(MessageErrorKind),
}

#[derive(Debug, PartialEq)]
pub enum SubscriberErrorKind {
    /// The receiving half of the subscriber's queue is gone.
    ConnectionLost,
    /// The subscriber's queue was full and the message was dropped for it.
    OverflowDropped,
}

#[derive(Debug, PartialEq)]
pub enum MessageErrorKind {
    Empty,
    TooLarge { limit: usize, actual: usize },
    InvalidUtf8,
}

impl Error {
    pub fn new(error_kind: SseErrorKind) -> Self {
        Self {
            source: None,
            error_kind,
        }
    }

    pub(crate) fn subscriber(kind: SubscriberErrorKind) -> Self {
        Self::new(SseErrorKind::Subscriber(kind))
    }

    pub(crate) fn message(kind: MessageErrorKind) -> Self {
        Self::new(SseErrorKind::Message(kind))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            SseErrorKind::Subscriber(SubscriberErrorKind::ConnectionLost) => {
                write!(f, "subscriber connection lost")
            }
            SseErrorKind::Subscriber(SubscriberErrorKind::OverflowDropped) => {
                write!(f, "subscriber queue full, message dropped")
            }
            SseErrorKind::Message(MessageErrorKind::Empty) => write!(f, "message body is empty"),
            SseErrorKind::Message(MessageErrorKind::TooLarge { limit, actual }) => write!(
                f,
                "message body of {actual} bytes exceeds the limit of {limit} bytes"
            ),
            SseErrorKind::Message(MessageErrorKind::InvalidUtf8) => {
                write!(f, "message body is not valid UTF-8")
            }
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(err: std::str::Utf8Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: SseErrorKind::Message(MessageErrorKind::InvalidUtf8),
        }
    }
}
