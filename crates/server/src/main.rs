use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hlsforge_core::{
    create_storage, load_config, validate_config, Config, Encoder, FfmpegEncoder, LogFormat,
    ObjectStorage, TranscodeOrchestrator, TriggerAdapter,
};
use hlsforge_server::{api::create_router, state::AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable naming the configuration file.
const CONFIG_ENV: &str = "HLSFORGE_CONFIG";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        // Logging may not be initialized yet.
        eprintln!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Determine config path
    let config_path = std::env::var(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    init_logging(&config);
    info!(version = VERSION, "Loaded configuration from {:?}", config_path);

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        config_hash = &config_hash[..16],
        storage = ?config.storage.backend,
        ladder = ?config.ladder.preset,
        "Configuration validated"
    );

    let plan = Arc::new(
        config
            .rendition_plan()
            .context("Failed to build rendition plan")?,
    );
    let tiers: Vec<&str> = plan.tiers().iter().map(|t| t.name.as_str()).collect();
    info!(?tiers, "Rendition plan ready");

    // Storage client
    let storage = create_storage(&config.storage).await;
    if let Err(e) = storage.validate().await {
        warn!(backend = storage.name(), "Storage validation failed: {}", e);
    }
    info!(backend = storage.name(), "Storage client initialized");

    // Encoder
    let encoder = Arc::new(FfmpegEncoder::new(config.encoder.clone()));
    match encoder.validate().await {
        Ok(()) => info!(ffmpeg = ?config.encoder.ffmpeg_path, "FFmpeg available"),
        Err(e) => warn!("FFmpeg validation failed, runs will fail until it is installed: {}", e),
    }

    let orchestrator = Arc::new(TranscodeOrchestrator::new(
        encoder,
        storage,
        Arc::clone(&plan),
        config.transcode.clone(),
    ));
    let adapter = Arc::new(TriggerAdapter::new(orchestrator));

    let state = Arc::new(AppState::new(config.clone(), plan, adapter));
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

    info!("Server shut down");
    Ok(())
}

/// Installs the global subscriber. `RUST_LOG` wins over the default filter.
fn init_logging(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    match config.logging.format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
    info!("Shutdown signal received");
}
