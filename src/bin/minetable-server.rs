/// MineTable WebSocket Server
///
/// Standalone server that gives each browser connection its own
/// preprocessing session over WebSocket.

use minetable::server::run_server;
use minetable::SessionConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Get host and port from environment or use defaults
    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("PORT must be a number: {}", e),
            )
        })?;

    // Start the server
    run_server(&host, port, SessionConfig::from_env()).await
}
