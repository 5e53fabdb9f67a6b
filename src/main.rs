use clap::Parser;
use photo_gallery::analytics::cache::AnalyticsCache;
use photo_gallery::analytics::AnalyticsState;
use photo_gallery::config::AppConfig;
use photo_gallery::images::ImageState;
use photo_gallery::storage::blob::BlobStore;
use photo_gallery::storage::executor::QueryExecutor;
use photo_gallery::{server, storage};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::signal;

#[derive(Parser)]
#[command(name = "photo-gallery", about = "Image upload service with cached analytics")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let started_at = Instant::now();

    // Init tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "photo_gallery=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(Some(&cli.config))?;

    if let Err(msg) = config.validate() {
        eprintln!("Configuration error: {msg}");
        return Err(msg.into());
    }

    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        db = %config.database.path.display(),
        images = %config.storage.images_dir.display(),
        "starting photo-gallery"
    );

    // Setup SQLite pool
    let pool = storage::sqlite::create_pool(&config.database)?;
    storage::sqlite::init_pool(&pool).await?;
    tracing::info!("database initialized");

    let executor = QueryExecutor::new(pool);

    // One cache per process, shared by the upload path and the analytics routes
    let cache = Arc::new(AnalyticsCache::new(config.analytics.max_entries));

    let image_state = Arc::new(ImageState {
        executor: executor.clone(),
        blobs: BlobStore::new(config.storage.images_dir.clone()),
        cache: cache.clone(),
    });
    let analytics_state = Arc::new(AnalyticsState::new(
        executor,
        cache,
        &config.analytics,
        started_at,
    ));
    tracing::info!(
        ttl_secs = config.analytics.cache_ttl_secs,
        max_entries = config.analytics.max_entries,
        "analytics cache enabled"
    );

    let app = server::router(
        image_state,
        analytics_state,
        config.storage.max_upload_bytes,
    );

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C"),
        _ = terminate => tracing::info!("received SIGTERM"),
    }

    tracing::info!("shutting down...");
}
