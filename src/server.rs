/// HTTP server with WebSocket support for interactive preprocessing sessions
use actix_web::{middleware, web, App, Error, HttpRequest, HttpResponse, HttpServer};
use actix_web_actors::ws;

use crate::config::SessionConfig;
use crate::websocket::{AppState, SessionWebSocket};

/// Largest websocket frame accepted.
const MAX_FRAME_BYTES: usize = 64 * 1024 * 1024;

/// WebSocket endpoint handler: one preprocessing session per connection
async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    // Uploaded CSV files arrive inside a single text frame
    ws::WsResponseBuilder::new(SessionWebSocket::new(state), &req, stream)
        .frame_size(MAX_FRAME_BYTES)
        .start()
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "message": "MineTable preprocessing server is running",
        "history_capacity": state.config.history_capacity,
    }))
}

/// Start the HTTP server with WebSocket support
pub async fn run_server(host: &str, port: u16, config: SessionConfig) -> std::io::Result<()> {
    let state = web::Data::new(AppState::new(config));

    log::info!("MineTable preprocessing server");
    log::info!("websocket: ws://{}:{}/ws", host, port);
    log::info!("health check: http://{}:{}/health", host, port);
    log::info!("session config: {:?}", state.config);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            // Enable logger
            .wrap(middleware::Logger::default())
            // CORS for development
            .wrap(
                actix_cors::Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            // WebSocket endpoint
            .route("/ws", web::get().to(ws_index))
            // Health check
            .route("/health", web::get().to(health_check))
    })
    .bind((host, port))?
    .run()
    .await
}
