use crate::error::{Error, MessageErrorKind};
use axum::response::sse::Event;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// An immutable broadcast payload.
///
/// Cloning is a reference count bump, so one published message can sit in
/// every subscriber's queue without copying the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message(Arc<str>);

impl Message {
    /// Validates a raw publish body and turns it into a `Message`.
    ///
    /// Rejects empty bodies, bodies longer than `max_bytes` and bodies that
    /// are not UTF-8.
    pub fn from_body(body: &[u8], max_bytes: usize) -> Result<Self, Error> {
        if body.is_empty() {
            return Err(Error::message(MessageErrorKind::Empty));
        }

        if body.len() > max_bytes {
            return Err(Error::message(MessageErrorKind::TooLarge {
                limit: max_bytes,
                actual: body.len(),
            }));
        }

        let payload = std::str::from_utf8(body)?;
        Ok(Self::from(payload))
    }

    pub fn payload(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Builds the SSE event for this message.
    ///
    /// On the wire this is `data: <payload>\n\n`; a multi-line payload is
    /// sent as one `data:` field per line, which clients join back with `\n`.
    pub fn to_event(&self) -> Event {
        Event::default().data(normalize_line_endings(self.payload()))
    }
}

// SSE fields cannot carry a bare `\r`, so CRLF and CR both become LF.
fn normalize_line_endings(payload: &str) -> Cow<'_, str> {
    if payload.contains('\r') {
        Cow::Owned(payload.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(payload)
    }
}

impl From<&str> for Message {
    fn from(payload: &str) -> Self {
        Self(Arc::from(payload))
    }
}

impl From<String> for Message {
    fn from(payload: String) -> Self {
        Self(Arc::from(payload))
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}
