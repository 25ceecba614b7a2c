use caseroom::bootstrap;
use caseroom::config::Config;
use caseroom::infrastructure::http::router::build_router;
use caseroom::infrastructure::observability;
use caseroom::shared::events::room_bus;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing and metrics
    let _observability = observability::init(&config)?;
    tracing::info!("Configuration loaded");

    // Build application state around the process-wide bus
    let state = bootstrap::build_app_state(&config, room_bus());

    // Build router
    let app = build_router(state);

    // Start server
    let addr = config.server_address();
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
