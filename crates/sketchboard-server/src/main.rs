//! Sketchboard HTTP server
//!
//! Stores canvases as JSON documents and exposes them over a small REST API:
//!
//! ```text
//! POST   /api/v1/canvas/init                       create a canvas
//! GET    /api/v1/canvas/all                        list canvases, newest first
//! GET    /api/v1/canvas/{id}                       load a canvas
//! POST   /api/v1/canvas/add/{shape,text,image-url} append an element
//! POST   /api/v1/canvas/add/image-upload           append an uploaded image (multipart)
//! POST   /api/v1/canvas/erase                      erase along a stroke
//! PATCH  /api/v1/canvas/image                      move or resize an image
//! DELETE /api/v1/canvas/{id}/elements/{element}    remove one element
//! GET    /api/v1/canvas/export/{id}                single-page PDF
//! GET    /assets/{name}                            uploaded image bytes
//! ```

mod config;
mod error;
mod fetch;
mod routes;
mod state;

use config::{ServerConfig, StorageKind};
use state::AppState;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sketchboard_server=info,tower_http=info".into()),
        )
        .init();

    let config = ServerConfig::from_env();
    let state = match AppState::from_config(&config) {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize storage: {}", e);
            std::process::exit(1);
        }
    };
    let app = routes::router(state);

    let addr = config.addr();
    match config.storage {
        StorageKind::File => info!("Storing canvases under {}", config.data_dir.display()),
        StorageKind::Memory => info!("Using in-memory storage; canvases are lost on exit"),
    }

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    info!("Sketchboard server listening on http://{}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
