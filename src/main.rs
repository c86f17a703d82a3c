// Filmgraph server - films, users, likes and friendships over HTTP

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use filmgraph::{api::create_api_router, app_state::AppState, config::Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    let address = config.server_address();

    // Initialize application state (picks the storage backend)
    let app_state = AppState::new(config).await?;

    // Build main application router
    let app = Router::new()
        .merge(create_api_router(app_state))
        .layer(CorsLayer::permissive());

    tracing::info!("filmgraph server starting on http://{}", address);

    let listener = TcpListener::bind(&address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
