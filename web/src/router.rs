use crate::{
    controller::{
        demo_controller, health_check_controller, message_controller, websocket_controller,
        MessageResponse,
    },
    middleware::timing,
    sse::handler,
    AppState,
};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn,
    routing::{get, post},
    Json, Router,
};
use log::*;
use service::config::Config;
use std::path::Path;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::{ServeDir, ServeFile},
};
use utoipa::OpenApi;

/// Name of the demo page served at `/`, looked up inside `static_dir`.
const HOMEPAGE: &str = "sse.html";

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "SSE Broadcast API"
        ),
        paths(
            handler::sse_handler,
            message_controller::publish,
            health_check_controller::health_check,
            demo_controller::hello,
            demo_controller::info,
            demo_controller::schedule_task,
        ),
        components(
            schemas(
                MessageResponse,
                demo_controller::ClientInfo,
            )
        ),
        tags(
            (name = "sse_broadcast_rs", description = "Server-Sent Events broadcast demo API")
        )
    )]
struct ApiDoc;

pub fn define_routes(app_state: AppState) -> Router {
    let cors = cors_layer(&app_state.config);
    let static_dir = app_state.config.static_dir.clone();

    Router::new()
        .merge(sse_routes(app_state.clone()))
        .merge(message_routes(app_state.clone()))
        .merge(demo_routes(app_state))
        .merge(health_routes())
        .merge(api_doc_routes())
        .merge(static_routes(&static_dir))
        .layer(from_fn(timing::record_process_time))
        .layer(cors)
}

fn sse_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/sse", get(handler::sse_handler))
        .with_state(app_state)
}

fn message_routes(app_state: AppState) -> Router {
    let body_limit = app_state.config.max_message_bytes;

    Router::new()
        .route("/messages", post(message_controller::publish))
        // Oversized bodies are refused while reading, before they are buffered.
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(app_state)
}

fn demo_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/hello", get(demo_controller::hello))
        .route("/info", get(demo_controller::info))
        .route("/task", get(demo_controller::schedule_task))
        .route("/ws", get(websocket_controller::echo))
        .with_state(app_state)
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn api_doc_routes() -> Router {
    Router::new().route(
        "/api-docs/openapi.json",
        get(|| async { Json(ApiDoc::openapi()) }),
    )
}

// Serves the demo page at `/` and anything else in `static_dir` as a fallback
pub fn static_routes(static_dir: &Path) -> Router {
    Router::new()
        .route_service("/", ServeFile::new(static_dir.join(HOMEPAGE)))
        .fallback_service(ServeDir::new(static_dir))
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {origin:?}: {e}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_config, test_state};
    use axum::body::{to_bytes, Body, Bytes};
    use axum::http::{Request, Response, StatusCode};
    use futures::{Stream, StreamExt};
    use std::time::Duration;
    use tokio::time::timeout;
    use tower::ServiceExt;

    async fn open_stream(app: &Router) -> Response<Body> {
        let request = Request::builder().uri("/sse").body(Body::empty()).unwrap();
        app.clone().oneshot(request).await.unwrap()
    }

    async fn post_message(app: &Router, body: impl Into<Body>) -> StatusCode {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/messages")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(body.into())
            .unwrap();
        app.clone().oneshot(request).await.unwrap().status()
    }

    async fn next_frame<S>(frames: &mut S) -> String
    where
        S: Stream<Item = Result<Bytes, axum::Error>> + Unpin,
    {
        let frame = timeout(Duration::from_secs(1), frames.next())
            .await
            .expect("timed out waiting for an SSE frame")
            .expect("SSE stream ended")
            .expect("SSE stream errored");
        String::from_utf8(frame.to_vec()).unwrap()
    }

    async fn assert_no_frame<S>(frames: &mut S)
    where
        S: Stream<Item = Result<Bytes, axum::Error>> + Unpin,
    {
        assert!(
            timeout(Duration::from_millis(50), frames.next())
                .await
                .is_err(),
            "expected no pending SSE frame"
        );
    }

    #[tokio::test]
    async fn sse_stream_sets_event_stream_headers() {
        let app = define_routes(test_state());

        let response = open_stream(&app).await;

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "text/event-stream");
        assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
        assert_eq!(headers[header::CONNECTION], "keep-alive");
        assert!(headers.contains_key(&timing::X_PROCESS_TIME));
    }

    #[tokio::test]
    async fn published_message_reaches_subscriber_as_data_frame() {
        let app_state = test_state();
        let app = define_routes(app_state.clone());

        let mut frames = open_stream(&app).await.into_body().into_data_stream();
        assert_eq!(app_state.hub.subscriber_count(), 1);

        let publish = Request::builder()
            .method(Method::POST)
            .uri("/messages")
            .body(Body::from("hello"))
            .unwrap();
        let response = app.clone().oneshot(publish).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());

        assert_eq!(next_frame(&mut frames).await, "data: hello\n\n");
    }

    #[tokio::test]
    async fn disconnected_subscriber_is_removed_and_others_keep_receiving() {
        let app_state = test_state();
        let app = define_routes(app_state.clone());

        let mut s1 = open_stream(&app).await.into_body().into_data_stream();
        let mut s2 = open_stream(&app).await.into_body().into_data_stream();
        assert_eq!(app_state.hub.subscriber_count(), 2);

        assert_eq!(post_message(&app, "x").await, StatusCode::OK);
        assert_eq!(next_frame(&mut s1).await, "data: x\n\n");
        assert_eq!(next_frame(&mut s2).await, "data: x\n\n");

        drop(s1);
        assert_eq!(app_state.hub.subscriber_count(), 1);

        assert_eq!(post_message(&app, "y").await, StatusCode::OK);
        assert_eq!(next_frame(&mut s2).await, "data: y\n\n");
    }

    #[tokio::test]
    async fn messages_published_before_subscribing_are_not_replayed() {
        let app = define_routes(test_state());

        assert_eq!(post_message(&app, "before").await, StatusCode::OK);

        let mut frames = open_stream(&app).await.into_body().into_data_stream();
        assert_no_frame(&mut frames).await;

        assert_eq!(post_message(&app, "after").await, StatusCode::OK);
        assert_eq!(next_frame(&mut frames).await, "data: after\n\n");
    }

    #[tokio::test]
    async fn stalled_subscriber_does_not_fail_publish() {
        let mut config = test_config();
        config.subscriber_queue_capacity = 1;
        let app = define_routes(AppState::new(config));

        let _stalled = open_stream(&app).await.into_body().into_data_stream();
        let mut reader = open_stream(&app).await.into_body().into_data_stream();

        for payload in ["one", "two", "three"] {
            assert_eq!(post_message(&app, payload).await, StatusCode::OK);
            assert_eq!(next_frame(&mut reader).await, format!("data: {payload}\n\n"));
        }
    }

    #[tokio::test]
    async fn sse_stream_opened_after_shutdown_ends_immediately() {
        let app_state = test_state();
        let app = define_routes(app_state.clone());
        app_state.hub.close_all();

        let mut frames = open_stream(&app).await.into_body().into_data_stream();

        assert_eq!(app_state.hub.subscriber_count(), 0);
        let end = timeout(Duration::from_secs(1), frames.next())
            .await
            .expect("stream stayed open after shutdown");
        assert!(end.is_none());
    }

    #[tokio::test]
    async fn multi_line_message_is_split_into_data_lines() {
        let app = define_routes(test_state());
        let mut frames = open_stream(&app).await.into_body().into_data_stream();

        assert_eq!(post_message(&app, "a\nb").await, StatusCode::OK);

        assert_eq!(next_frame(&mut frames).await, "data: a\ndata: b\n\n");
    }

    #[tokio::test]
    async fn empty_message_is_rejected() {
        let app = define_routes(test_state());
        assert_eq!(
            post_message(&app, Body::empty()).await,
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[tokio::test]
    async fn non_utf8_message_is_rejected() {
        let app = define_routes(test_state());
        assert_eq!(
            post_message(&app, vec![0xffu8, 0xfe]).await,
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[tokio::test]
    async fn oversized_message_is_rejected() {
        let mut config = test_config();
        config.max_message_bytes = 8;
        let app = define_routes(AppState::new(config));

        assert_eq!(post_message(&app, "12345678").await, StatusCode::OK);
        assert_eq!(
            post_message(&app, "123456789").await,
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[tokio::test]
    async fn messages_route_only_accepts_post() {
        let app = define_routes(test_state());
        let request = Request::builder()
            .uri("/messages")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let app = define_routes(test_state());
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"healthy");
    }

    #[tokio::test]
    async fn root_serves_demo_page() {
        let app = define_routes(test_state());
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/html"));
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains("EventSource"));
    }

    #[tokio::test]
    async fn openapi_document_lists_broadcast_paths() {
        let app = define_routes(test_state());
        let request = Request::builder()
            .uri("/api-docs/openapi.json")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let doc: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(doc["paths"]["/sse"].is_object());
        assert!(doc["paths"]["/messages"]["post"].is_object());
    }

    #[tokio::test]
    async fn cors_allows_configured_origin() {
        let app = define_routes(test_state());
        let request = Request::builder()
            .uri("/health")
            .header(header::ORIGIN, "http://localhost:4000")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:4000"
        );
    }
}
