use log::{error, info};
use service::{config::Config, logging::Logger};

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config as &Config);

    info!(
        "Starting SSE broadcast server in {} mode (queue capacity {}, max message {} bytes)",
        config.runtime_env(),
        config.subscriber_queue_capacity,
        config.max_message_bytes
    );

    let app_state = web::AppState::new(config);

    if let Err(e) = web::init_server(app_state).await {
        error!("Server stopped with an error: {e}");
        std::process::exit(1);
    }

    info!("Server shut down cleanly");
}
