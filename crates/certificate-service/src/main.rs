//! Certificate Service
//!
//! Issues, stores and validates training certificates over HTTP.

use anyhow::{Context, Result};
use certificate_renderer::{CertificateAssets, CertificateRenderer};
use certificate_service::{
    create_router, AppState, CertificateService, Config, MemoryStore, RedisStore, Storage,
    StoreBackend,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "certificate_service=debug,certificate_renderer=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Certificate Service");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    info!("Configuration loaded - listening on {}", config.address());

    // Initialize storage
    let storage = match config.store_backend {
        StoreBackend::Redis => {
            info!("Redis URL: {}", config.redis_url);
            let store = RedisStore::new(&config.redis_url)
                .await
                .context("Failed to initialize storage")?;
            Storage::new(Arc::new(store))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory storage; records are lost on restart");
            Storage::new(Arc::new(MemoryStore::new()))
        }
    };

    // Load rendering assets once
    let assets = CertificateAssets::load(&config.asset_paths())
        .context("Failed to load certificate assets")?;
    if !assets.is_complete() {
        error!("Certificate assets are incomplete; rendering will fail until they are provided");
    }
    info!("Font: {:?}", assets.font().source());

    let layout = config.load_layout()?;
    let renderer =
        CertificateRenderer::new(assets, layout).context("Invalid certificate layout")?;

    let dates = config.issue_dates()?;
    let service = CertificateService::new(Arc::new(renderer), storage, dates);

    match &config.public_base_url {
        Some(url) => info!("Validation links use base URL {}", url),
        None => warn!(
            "PUBLIC_BASE_URL is unset; new certificates take their validation link from the request Host header"
        ),
    }

    // Create application state
    let state = AppState::new(
        service,
        config.public_base_url.clone(),
        config.max_upload_bytes,
    );

    // Create router
    let app = create_router(state);

    // Bind and serve
    let addr = config.address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Certificate Service running on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
