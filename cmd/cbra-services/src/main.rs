//! # cbra-services
//!
//! The entry point that assembles the application based on compile-time features.

use std::sync::Arc;

use anyhow::Context;
use api_adapters::{router, ApiConfig, AppState};
use auth_adapters::{Argon2Hasher, JwtTokenService};
use configs::{LogSettings, Settings};
use domains::FileStorage;
use secrecy::ExposeSecret;
use services::{Ports, ReviewerPolicy};
use storage_adapters::UploadPolicy;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

// Feature-gated imports
#[cfg(feature = "db-postgres")]
use storage_adapters::PgStore;
#[cfg(not(feature = "db-postgres"))]
use storage_adapters::InMemoryStore;

#[cfg(feature = "media-local")]
use storage_adapters::LocalFileStorage;
#[cfg(not(feature = "media-local"))]
use storage_adapters::InMemoryFileStorage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load configuration")?;
    init_tracing(&settings.log);

    // 1. Persistence and case file storage
    let ports = build_ports(&settings).await?;

    // 2. Credentials and bearer tokens
    let secret = settings.auth.jwt_secret.as_ref().context("auth.jwt_secret is required")?;
    let tokens = Arc::new(JwtTokenService::new(
        secret.expose_secret().as_bytes(),
        settings.auth.token_ttl_secs,
    ));

    // 3. Services and HTTP surface
    let policy = ReviewerPolicy::new(settings.policy.reviewer_policy.parse()?);
    let state = AppState::new(ports, policy, Arc::new(Argon2Hasher::new()), tokens);
    let app = router(
        state,
        &ApiConfig {
            cors_origins: settings.server.cors_origins.clone(),
            max_upload_bytes: settings.storage.max_upload_bytes,
        },
    );

    let listener = tokio::net::TcpListener::bind(settings.server.bind_addr())
        .await
        .with_context(|| format!("failed to bind {}", settings.server.bind_addr()))?;
    tracing::info!(addr = %listener.local_addr()?, reviewer_policy = ?policy.mode(), "cbra-services listening");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    tracing::info!("shut down cleanly");
    Ok(())
}

fn init_tracing(log: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let registry = tracing_subscriber::registry().with(filter);
    if log.json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

async fn build_ports(settings: &Settings) -> anyhow::Result<Ports> {
    let upload = UploadPolicy::with_max_bytes(settings.storage.max_upload_bytes);

    #[cfg(feature = "media-local")]
    let files: Arc<dyn FileStorage> = Arc::new(LocalFileStorage::new(settings.storage.root.clone(), upload));
    #[cfg(not(feature = "media-local"))]
    let files: Arc<dyn FileStorage> = Arc::new(InMemoryFileStorage::new(upload));

    #[cfg(feature = "db-postgres")]
    let ports = {
        let url = settings.database.url.as_ref().context("database.url is required")?;
        let store = PgStore::connect(url.expose_secret(), settings.database.max_connections)
            .await
            .context("failed to connect to the database")?;
        store.migrate().await?;
        Ports::from_store(Arc::new(store), files)
    };

    #[cfg(not(feature = "db-postgres"))]
    let ports = {
        tracing::warn!("built without db-postgres; records are kept in memory only");
        Ports::from_store(InMemoryStore::shared(), files)
    };

    Ok(ports)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to listen for SIGTERM");
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
    tracing::info!("shutdown signal received");
}
