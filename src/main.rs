//! Response Cache - content API server with a two-tier response cache

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use tokio::{signal, task::JoinHandle};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use response_cache::cache::redact_url;
use response_cache::{create_router, spawn_cleanup_task, spawn_reconnect_task, AppState, Config};

const SHUTDOWN_QUIT_TIMEOUT: Duration = Duration::from_secs(2);

/// Main entry point for the content API server.
///
/// # Startup Sequence
/// 1. Load `.env` and initialize the tracing subscriber
/// 2. Load configuration from environment variables
/// 3. Build the cache client and make the first connection attempt
/// 4. Start the reconnect and local cleanup tasks
/// 5. Serve until SIGINT/SIGTERM, then close the remote connection
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "response_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting response cache server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: redis={}, local_max_size={}, default_ttl={}s, port={}",
        redact_url(&config.redis_url),
        config.local_max_size,
        config.default_ttl,
        config.server_port
    );

    let state = AppState::from_config(&config).context("failed to build cache client")?;

    // A failed first connect is not fatal; the reconnect task takes over.
    if !state.client.monitor().connect().await {
        warn!("Remote cache unreachable at startup, serving from local tier");
    }

    let tasks = vec![
        spawn_reconnect_task(
            state.client.monitor().clone(),
            config.reconnect_interval,
            config.max_reconnect_backoff,
        ),
        spawn_cleanup_task(state.client.local().clone(), config.cleanup_interval),
    ];
    info!("Background tasks started");

    let client = state.client.clone();
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(tasks))
        .await
        .context("server error")?;

    client.shutdown(SHUTDOWN_QUIT_TIMEOUT).await;
    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then stops the
/// background tasks.
async fn shutdown_signal(tasks: Vec<JoinHandle<()>>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    for task in tasks {
        task.abort();
    }
    warn!("Background tasks aborted");
}
