use anyhow::Context;

use taskgate_api::GatewayConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    taskgate_observability::init();

    let config = GatewayConfig::from_env().context("invalid gateway configuration")?;
    if !config.environment.is_production() {
        tracing::warn!("APP_ENV is not production; session cookies are sent without Secure");
    }

    let app = taskgate_api::build_app(&config).context("failed to build gateway")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        backend = %config.api_base_url,
        "listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server failed")?;

    tracing::info!("gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
