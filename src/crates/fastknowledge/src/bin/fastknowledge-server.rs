//! fastknowledge server binary
//!
//! Serves the chat API. Configuration comes from `$FASTKNOWLEDGE_CONFIG`
//! (default `config/fastknowledge.yaml`); `HOST` and `PORT` override the
//! bind address and `RUST_LOG` the log filter.

use anyhow::Context;
use fastknowledge::app::build_router;
use fastknowledge::config::AppConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing/logging
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(rust_log))
        .init();

    tracing::info!("Loading server configuration...");
    let config = AppConfig::load().context("failed to load configuration")?;

    tracing::info!(
        prompts = %config.prompts_path.display(),
        search = %config.search.server_url,
        default_model = %config.chat.default_model,
        "Configuration loaded"
    );

    let app = build_router(&config).context("failed to build application")?;

    let addr = config.server.socket_addr()?;
    tracing::info!("Starting fastknowledge server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("fastknowledge server shut down gracefully");
    Ok(())
}

/// Signal for graceful shutdown (Ctrl-C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for CTRL-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received CTRL-C signal, shutting down");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, shutting down");
        }
    }
}
