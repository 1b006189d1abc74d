//! Dispatch backend HTTP server.

use despacho_server::{bootstrap, build_router, config::Config, metrics};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing before anything can log.
    let config = Config::from_env();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.server.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(environment = %config.environment, "starting dispatch backend");

    // Refuse to boot with insecure production configuration.
    let validation = config.validate();
    for warning in &validation.warnings {
        warn!("{warning}");
    }
    if !validation.is_ok() {
        for err in &validation.errors {
            error!("{err}");
        }
        return Err("configuration validation failed".into());
    }

    // Metrics exporter on its own port.
    let metrics_addr = format!(
        "{}:{}",
        config.server.metrics_host, config.server.metrics_port
    )
    .parse()?;
    if let Err(err) = metrics::install_exporter(metrics_addr) {
        // Metrics are not worth refusing to serve tickets over.
        warn!("{err}");
    }

    // Database, migrations, stores, bootstrap admin.
    info!(url = %config.database.url, "connecting to database");
    let state = bootstrap::build_state(&config).await?;
    info!("database ready, migrations applied");

    let router = build_router(state, config.cors.allowed_origins.clone());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received");
}
