//! pic2word Server
//!
//! Accepts an uploaded image, has it transcribed to LaTeX by Gemini and
//! returns the pandoc-converted Word document.

use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pic2word_server::config::Config;
use pic2word_server::convert::{DocumentConverter, PandocConverter};
use pic2word_server::routes;
use pic2word_server::state::AppState;
use pic2word_server::temp::TempStore;
use pic2word_server::transcribe::GeminiTranscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before anything reads the environment
    let dotenv = dotenvy::dotenv();
    let config = Config::from_env();

    let production = config.as_ref().map(Config::is_production).unwrap_or(false);
    let default_filter = if production {
        "pic2word_server=info,tower_http=info"
    } else {
        "pic2word_server=debug,tower_http=debug"
    };

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = dotenv {
        tracing::info!("No .env file loaded ({}), using process environment", e);
    }

    let config = config.context("Failed to load configuration")?;
    config
        .ensure_temp_dir()
        .context("Temp directory is not usable")?;

    tracing::info!("Starting pic2word server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        port = config.server.port,
        env = %config.server.env,
        temp_dir = %config.temp_dir.display(),
        "Configuration loaded"
    );

    // The converter is a hard requirement
    let converter = PandocConverter::new(&config.converter, TempStore::new(config.temp_dir.clone()));
    if !converter.is_available().await {
        anyhow::bail!(
            "'{}' is not installed or not runnable; install pandoc before starting the server",
            converter.program()
        );
    }
    match converter.version().await {
        Ok(version) => tracing::info!("Using {}", version),
        Err(e) => tracing::warn!("Could not read converter version: {}", e),
    }

    let transcriber = GeminiTranscriber::new(&config.gemini)
        .context("Failed to create Gemini client")?;

    let app_state = AppState::new(config.clone(), Arc::new(transcriber), Arc::new(converter));
    let app = routes::app(app_state);

    // Start server with graceful shutdown
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("pic2word server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
