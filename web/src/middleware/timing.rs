use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use log::*;
use std::time::Instant;

/// Response header carrying the handler's wall-clock time in seconds.
pub(crate) static X_PROCESS_TIME: HeaderName = HeaderName::from_static("x-process-time");

/// Times the inner service and stamps the elapsed seconds on the response.
///
/// For streaming responses (SSE) this covers producing the headers only,
/// not the lifetime of the stream.
pub async fn record_process_time(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let mut response = next.run(request).await;
    let elapsed = started.elapsed().as_secs_f64();

    match HeaderValue::from_str(&elapsed.to_string()) {
        Ok(value) => {
            response.headers_mut().insert(X_PROCESS_TIME.clone(), value);
        }
        Err(e) => warn!("Could not encode process time {elapsed}: {e}"),
    }

    response
}
