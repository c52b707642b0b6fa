//! HTTP transport for the broadcast hub: routes, handlers and middleware.

use ::sse::Hub;
use log::*;
use service::config::Config;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

mod controller;
mod error;
mod middleware;
pub mod router;
mod sse;

pub use error::{Error, Result};

// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub hub: Arc<Hub>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let hub = Arc::new(Hub::new(config.subscriber_queue_capacity));
        Self { config, hub }
    }
}

/// Binds the configured interface and serves until Ctrl-C.
///
/// On shutdown every SSE subscriber is disconnected so that open event
/// streams finish and the graceful shutdown can complete.
pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let addr = app_state.config.socket_addr();
    let hub = Arc::clone(&app_state.hub);

    let listener = TcpListener::bind(&addr).await?;
    info!("Server starting... listening for connections on http://{addr}");

    let app = router::define_routes(app_state);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(hub))
    .await
}

async fn shutdown_signal(hub: Arc<Hub>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for the shutdown signal: {e}");
        std::future::pending::<()>().await;
    }

    info!("Shutdown signal received, disconnecting SSE subscribers");
    hub.close_all();
}
