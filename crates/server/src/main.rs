use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rationalizer_core::{
    load_config, validate_config, ArtifactSink, FsArtifactSink, HttpBackend, MappingBackend,
    WorkflowOrchestrator, WorkflowUpdate, WorkflowUpdateCallback,
};
use rationalizer_server::api::{create_router, WsBroadcaster};
use rationalizer_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Capacity of the WebSocket fan-out channel
const WS_CHANNEL_CAPACITY: usize = 256;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Rationalizer console v{}", VERSION);

    // Determine config path
    let config_path = std::env::var("RATIONALIZER_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;
    info!("Mapping server: {}", config.backend.url);
    info!(
        "Reports will be saved to {:?}",
        config.downloads.output_dir
    );

    let backend: Arc<dyn MappingBackend> = Arc::new(
        HttpBackend::new(&config.backend).context("Failed to create mapping server client")?,
    );
    let sink: Arc<dyn ArtifactSink> = Arc::new(FsArtifactSink::new(config.downloads.clone()));

    // WebSocket broadcaster receives every workflow update
    let ws_broadcaster = WsBroadcaster::new(WS_CHANNEL_CAPACITY);
    let broadcaster_for_callback = ws_broadcaster.clone();
    let update_callback: WorkflowUpdateCallback = Arc::new(move |update: WorkflowUpdate| {
        broadcaster_for_callback.workflow_update(update);
    });

    let orchestrator = Arc::new(
        WorkflowOrchestrator::new(config.workflow.clone(), backend, sink)
            .with_update_callback(update_callback),
    );

    let state = Arc::new(AppState::new(
        config.clone(),
        Arc::clone(&orchestrator),
        ws_broadcaster,
    ));

    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    orchestrator.stop().await;
    info!("Workflow tasks stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
