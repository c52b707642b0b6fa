use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use log::*;
use serde::Serialize;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use utoipa::ToSchema;

use crate::controller::MessageResponse;
use crate::AppState;

const TASK_LOG_LINE: &str = "Task processed";

/// What the server can see about the calling client.
#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct ClientInfo {
    /// Peer IP address, when the server runs with connection info attached.
    client_host: Option<String>,
    headers: BTreeMap<String, String>,
}

/// GET a static greeting
#[utoipa::path(
    get,
    path = "/hello",
    responses(
        (status = 200, description = "Greeting", body = MessageResponse),
    )
)]
pub async fn hello() -> impl IntoResponse {
    Json(MessageResponse::new("Hello World"))
}

/// GET the caller's address and request headers
#[utoipa::path(
    get,
    path = "/info",
    responses(
        (status = 200, description = "Client address and request headers", body = ClientInfo),
    )
)]
pub async fn info(
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let client_host = connect_info.map(|ConnectInfo(addr)| addr.ip().to_string());

    // Repeated header names keep the last value.
    let headers = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();

    Json(ClientInfo {
        client_host,
        headers,
    })
}

/// GET schedule a background task that runs after the response is sent
#[utoipa::path(
    get,
    path = "/task",
    responses(
        (status = 200, description = "Background task scheduled", body = MessageResponse),
    )
)]
pub async fn schedule_task(State(app_state): State<AppState>) -> impl IntoResponse {
    let path = app_state.config.task_log_path.clone();
    let delay = Duration::from_millis(app_state.config.task_delay_ms);

    tokio::spawn(write_log(path, delay, TASK_LOG_LINE));

    (StatusCode::OK, Json(MessageResponse::new("Task scheduled")))
}

async fn write_log(path: PathBuf, delay: Duration, line: &'static str) {
    tokio::time::sleep(delay).await;

    match append_line(&path, line).await {
        Ok(()) => debug!("Background task wrote to {}", path.display()),
        Err(e) => error!("Background task failed to write {}: {e}", path.display()),
    }
}

async fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(format!("{line}\n").as_bytes()).await?;
    file.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::define_routes;
    use crate::test_support::{test_config, test_state};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    async fn get_json(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn hello_returns_greeting() {
        let app = define_routes(test_state());
        let request = Request::builder().uri("/hello").body(Body::empty()).unwrap();

        let (status, body) = get_json(app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "message": "Hello World" }));
    }

    #[tokio::test]
    async fn info_echoes_request_headers() {
        let app = define_routes(test_state());
        let request = Request::builder()
            .uri("/info")
            .header("x-demo", "42")
            .body(Body::empty())
            .unwrap();

        let (status, body) = get_json(app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["headers"]["x-demo"], "42");
        // oneshot requests carry no peer address
        assert!(body["client_host"].is_null());
    }

    #[tokio::test]
    async fn task_responds_immediately_and_writes_log_later() {
        let path = std::env::temp_dir().join(format!("task-{}.log", uuid::Uuid::new_v4()));
        let mut config = test_config();
        config.task_log_path = path.clone();
        config.task_delay_ms = 20;
        let app = define_routes(AppState::new(config));

        let request = Request::builder().uri("/task").body(Body::empty()).unwrap();
        let (status, body) = get_json(app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Task scheduled");

        let mut contents = String::new();
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            if let Ok(read) = tokio::fs::read_to_string(&path).await {
                contents = read;
                if !contents.is_empty() {
                    break;
                }
            }
        }
        assert_eq!(contents, "Task processed\n");

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn append_line_appends_rather_than_truncates() {
        let path = std::env::temp_dir().join(format!("append-{}.log", uuid::Uuid::new_v4()));

        append_line(&path, "one").await.unwrap();
        append_line(&path, "two").await.unwrap();

        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "one\ntwo\n");
        let _ = tokio::fs::remove_file(&path).await;
    }
}
