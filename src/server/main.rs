use std::error::Error;

use tokio::net::TcpListener;
use tracing::{info, warn};

use keygate::config::init_config;
use keygate::server::logging::init_tracing;
use keygate::server::{build_router, AppState, Database};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = init_config()?;
    init_tracing(&config.logging)?;

    let db = Database::new().await?;
    info!(
        backend = db.db_type(),
        migrations = config.database.run_migrations,
        "store ready"
    );

    let app = build_router(AppState::with_license_config(db, &config.license));

    let listener = TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    info!("Keygate server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C; shutting down");
        return;
    }
    info!("Shutdown signal received, stopping server...");
}
