// Main entry point for API server

use anyhow::{Context, Result};
use server_core::{
    server::{build_app, AppState},
    Config,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,market_research=debug,server_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Market Research Assistant");

    // Load configuration; a missing API key stops here
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        provider = %config.provider,
        model = %config.model,
        wikipedia = %config.wikipedia_lang,
        "Configuration loaded"
    );

    // Build application
    let state = AppState::from_config(&config);
    let app = build_app(state, &config.allowed_origins);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Report form: http://localhost:{}/", config.port);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
