//! jfai-processor - Jellyfin audio analysis worker
//!
//! Polls the Jellyfin library, extracts audio features, asks the Qwen-Audio
//! endpoint for a description, and writes the results to Neo4j and the
//! relational store. Serves `/health` and read-only media routes alongside
//! the loop.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use jfai_common::config::{ProcessorConfig, CONFIG_PATH_ENV};
use jfai_common::logging::{init_logging, DEFAULT_FILTER};
use jfai_processor::db::{lazy_database_pool, SqlRelationalStore};
use jfai_processor::graph::Neo4jHttpStore;
use jfai_processor::services::{
    JellyfinClient, QwenAudioClient, RedisDedupCache, SpectralFeatureExtractor,
};
use jfai_processor::workflow::{MediaProcessor, ProcessorDeps, ProcessorSettings};
use jfai_processor::{build_router, AppState, BUILD_PROFILE, BUILD_TIMESTAMP, GIT_HASH};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "jfai-processor")]
#[command(about = "Jellyfin audio analysis worker", long_about = None)]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = CONFIG_PATH_ENV)]
    config: Option<PathBuf>,

    /// Seconds between the end of one scan and the start of the next
    #[arg(long)]
    interval: Option<u64>,

    /// Run a single scan and exit
    #[arg(long)]
    once: bool,

    /// Health endpoint bind address
    #[arg(long)]
    health_addr: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(DEFAULT_FILTER).context("Failed to initialize logging")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        git_hash = GIT_HASH,
        built = BUILD_TIMESTAMP,
        profile = BUILD_PROFILE,
        "Starting jfai-processor"
    );

    let mut config =
        ProcessorConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(interval) = args.interval {
        config.schedule.interval_secs = interval;
    }
    if let Some(addr) = args.health_addr {
        config.health.addr = addr;
    }
    config.validate().context("Invalid configuration")?;

    info!(
        jellyfin = %config.jellyfin.url,
        analyzer = %config.analyzer.url,
        graph = %config.graph.uri,
        cache = %config.cache.url,
        interval_secs = config.schedule.interval_secs,
        "Configuration resolved"
    );

    // Stores connect on first use, so an unreachable backend degrades items
    // instead of stopping startup
    let pool = lazy_database_pool(&config.database.url).context("Invalid database URL")?;
    let relational = SqlRelationalStore::new(pool);
    let cache = RedisDedupCache::new(&config.cache.url).context("Invalid cache URL")?;
    let graph = Neo4jHttpStore::new(&config.graph).context("Failed to create graph client")?;
    let library = JellyfinClient::new(&config.jellyfin).context("Failed to create Jellyfin client")?;
    let analyzer =
        QwenAudioClient::new(&config.analyzer).context("Failed to create analyzer client")?;

    let deps = ProcessorDeps {
        library: Arc::new(library),
        extractor: Arc::new(SpectralFeatureExtractor::default()),
        analyzer: Arc::new(analyzer),
        cache: Arc::new(cache),
        graph: Arc::new(graph),
        relational: Arc::new(relational.clone()),
    };
    let processor = Arc::new(MediaProcessor::new(
        deps,
        ProcessorSettings::from_config(&config),
    ));

    let cancel = CancellationToken::new();

    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_cancel.cancel();
    });

    if args.once {
        let report = processor
            .run_once(&cancel)
            .await
            .context("Processing cycle failed")?;
        info!(processed = report.processed, "Single scan finished");
        return Ok(());
    }

    let state = AppState::new(Some(relational), processor.status());
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.health.addr)
        .await
        .with_context(|| format!("Failed to bind health endpoint {}", config.health.addr))?;
    info!("Health check: http://{}/health", config.health.addr);

    let server_cancel = cancel.clone();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { server_cancel.cancelled().await })
            .await
    });

    processor.run(cancel.clone()).await;

    cancel.cancel();
    match server.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "Health server error"),
        Err(e) => error!(error = %e, "Health server task failed"),
    }

    info!("Shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
